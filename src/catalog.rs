// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Lapanen - Shop Catalog & Records
 * In-memory items, reviews and purchases
 *
 * Thin collaborator glue around the verification core. Items are
 * seeded once and immutable; reviews and purchases are per-identity
 * mutable records behind narrow methods.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub image: String,
    pub price: u32,
}

#[derive(Debug, Clone)]
pub struct Review {
    pub student: String,
    pub item: i64,
    pub review: String,
}

#[derive(Debug, Clone)]
pub struct Purchase {
    pub student: String,
    pub item: i64,
    pub quantity: u32,
}

pub struct CatalogStore {
    items: Vec<Item>,
    reviews: RwLock<Vec<Review>>,
    purchases: RwLock<Vec<Purchase>>,
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogStore {
    pub fn new() -> Self {
        Self {
            items: seed_items(),
            reviews: RwLock::new(Vec::new()),
            purchases: RwLock::new(Vec::new()),
        }
    }

    pub fn all_items(&self) -> &[Item] {
        &self.items
    }

    pub fn item(&self, id: i64) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    /// The featured item shown above the search results.
    pub fn featured(&self) -> &Item {
        &self.items[3]
    }

    /// Case-insensitive name substring search.
    pub fn search(&self, query: &str) -> Vec<&Item> {
        let needle = query.to_lowercase();
        self.items
            .iter()
            .filter(|i| i.name.to_lowercase().contains(&needle))
            .collect()
    }

    pub async fn add_review(&self, student: &str, item: i64, review: String) {
        self.reviews.write().await.push(Review {
            student: student.to_string(),
            item,
            review,
        });
    }

    /// A student only ever sees their own reviews.
    pub async fn reviews_for(&self, student: &str, item: i64) -> Vec<Review> {
        self.reviews
            .read()
            .await
            .iter()
            .filter(|r| r.student == student && r.item == item)
            .cloned()
            .collect()
    }

    pub async fn clear_reviews(&self, student: &str) {
        self.reviews.write().await.retain(|r| r.student != student);
    }

    pub async fn add_purchase(&self, student: &str, item: i64, quantity: u32) {
        self.purchases.write().await.push(Purchase {
            student: student.to_string(),
            item,
            quantity,
        });
    }
}

fn seed_items() -> Vec<Item> {
    let rows: [(i64, &str, &str, &str, u32); 6] = [
        (1, "Blue Mitten", "For the coolest of cats", "blue_mitten.jpg", 10),
        (2, "Red Mitten", "Stylish, and affordable!", "red_mitten.jpg", 3),
        (3, "Kitten Blanket", "Staying warm in style!", "blanket.jpg", 4),
        (4, "Tiny Hat", "Everyone loves small hats", "hat.png", 6),
        (5, "Little Jacket", "It even comes with little pockets!", "jacket.jpg", 15),
        (6, "Warm Scarf", "For those chilly winter evenings", "scarf.jpg", 8),
    ];
    rows.into_iter()
        .map(|(id, name, description, image, price)| Item {
            id,
            name: name.to_string(),
            description: description.to_string(),
            image: image.to_string(),
            price,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_matches_substring_case_insensitive() {
        let store = CatalogStore::new();
        let hits = store.search("mitten");
        assert_eq!(hits.len(), 2);
        assert!(store.search("MITTEN").len() == 2);
        assert!(store.search("zamboni").is_empty());
    }

    #[tokio::test]
    async fn test_reviews_scoped_to_student_and_item() {
        let store = CatalogStore::new();
        store.add_review("a", 1, "nice".to_string()).await;
        store.add_review("a", 2, "ok".to_string()).await;
        store.add_review("b", 1, "meh".to_string()).await;

        let own = store.reviews_for("a", 1).await;
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].review, "nice");
    }

    #[tokio::test]
    async fn test_clear_reviews_only_hits_one_student() {
        let store = CatalogStore::new();
        store.add_review("a", 1, "x".to_string()).await;
        store.add_review("b", 1, "y".to_string()).await;
        store.clear_reviews("a").await;
        assert!(store.reviews_for("a", 1).await.is_empty());
        assert_eq!(store.reviews_for("b", 1).await.len(), 1);
    }
}
