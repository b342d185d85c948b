// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Lapanen - Page Rendering
 * Server-side HTML for the shop pages
 *
 * The search echo and the review bodies are the training sinks: they
 * are inserted as given, after the level's sanitization transform and
 * nothing else. Everything else (item names, attribute values) is
 * escaped normally.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::catalog::{Item, Review};
use crate::sanitizer::Level;
use crate::verify_client::PURCHASE_SUCCESS_STRING;

/// Standard HTML escaping for trusted-context interpolation.
pub fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{} - Lapanen</title></head>\n<body>\n<h1><a href=\"/\">Lapanen</a></h1>\n{}\n</body>\n</html>\n",
        escape(title),
        body
    )
}

fn item_card(item: &Item) -> String {
    format!(
        "<li><a href=\"/item/{id}\">{name}</a> - {desc} - {price} eur\
         <form action=\"/purchase\" method=\"post\">\
         <input type=\"hidden\" name=\"item\" value=\"{id}\">\
         <input type=\"number\" name=\"quantity\" value=\"1\" min=\"1\">\
         <button>Buy</button></form></li>",
        id = item.id,
        name = escape(&item.name),
        desc = escape(&item.description),
        price = item.price,
    )
}

fn level_switcher(level: Level) -> String {
    let options: String = Level::ALL
        .iter()
        .map(|l| {
            let selected = if *l == level { " selected" } else { "" };
            format!("<option value=\"{l}\"{selected}>Level {l}</option>")
        })
        .collect();
    format!(
        "<form action=\"/level\" method=\"post\">\
         <select name=\"xss-level\">{options}</select>\
         <button>Switch level</button></form>"
    )
}

/// Search / landing page. `rendered_query` has already been through
/// the level's transform and is inserted raw - that is the reflected
/// sink.
pub fn index(
    query: &str,
    rendered_query: &str,
    results: &[&Item],
    featured: &Item,
    level: Level,
    flag: Option<&str>,
) -> String {
    let mut body = String::new();

    body.push_str(&format!(
        "<form action=\"/\" method=\"get\">\
         <input name=\"query\" value=\"{}\" placeholder=\"Search mittens...\">\
         <button>Search</button></form>",
        escape(query)
    ));

    if !query.is_empty() {
        body.push_str(&format!("<p>You searched for: {rendered_query}</p>"));
    }

    body.push_str(&format!(
        "<section><h2>Featured</h2>{}</section>",
        item_card(featured)
    ));

    body.push_str("<ul>");
    for item in results {
        body.push_str(&item_card(item));
    }
    body.push_str("</ul>");

    body.push_str(&level_switcher(level));
    body.push_str(&format!("<p>Current level: {level}</p>"));
    if let Some(flag) = flag {
        body.push_str(&format!("<p class=\"flag\">{}</p>", escape(flag)));
    }

    layout("Tiny mittens for tiny cats", &body)
}

/// Item detail page. Review bodies are rendered through the level's
/// transform and inserted raw - that is the stored sink.
pub fn item(item: &Item, rendered_reviews: &[String]) -> String {
    let mut body = format!(
        "<h2>{name}</h2><p>{desc}</p><p>{price} eur</p>\
         <img src=\"/static/{image}\" alt=\"{name}\">",
        name = escape(&item.name),
        desc = escape(&item.description),
        price = item.price,
        image = escape(&item.image),
    );

    body.push_str("<h3>Your reviews</h3><ul>");
    for review in rendered_reviews {
        body.push_str(&format!("<li>{review}</li>"));
    }
    body.push_str("</ul>");

    body.push_str(&format!(
        "<form action=\"/review\" method=\"post\">\
         <input type=\"hidden\" name=\"item\" value=\"{}\">\
         <textarea name=\"review\" placeholder=\"Tell us about it\"></textarea>\
         <button>Review</button></form>\
         <form action=\"/clear\" method=\"post\"><button>Clear my reviews</button></form>",
        item.id
    ));

    layout(&item.name, &body)
}

/// Purchase confirmation. Carries the fixed success marker the
/// verification probe scans for.
pub fn purchase(item: &Item, quantity: u32) -> String {
    let body = format!(
        "<h2>{PURCHASE_SUCCESS_STRING}</h2>\
         <p>{quantity} x {name} on the way to your kitten.</p>\
         <p><a href=\"/\">Back to the shop</a></p>",
        name = escape(&item.name),
    );
    layout("Thank you", &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogStore;
    use crate::sanitizer::transform;

    #[test]
    fn test_index_reflects_rendered_query_raw() {
        let store = CatalogStore::new();
        let raw = "<script>alert(1)</script>";
        let page = index(
            raw,
            &transform(raw, Level::Zero),
            &[],
            store.featured(),
            Level::Zero,
            None,
        );
        // Level 0 reflection is unescaped by design
        assert!(page.contains("You searched for: <script>alert(1)</script>"));
        // The form attribute is escaped regardless of level
        assert!(page.contains("value=\"&lt;script&gt;alert(1)&lt;/script&gt;\""));
    }

    #[test]
    fn test_index_shows_flag_when_issued() {
        let store = CatalogStore::new();
        let page = index("", "", &[], store.featured(), Level::One, Some("flag-1-looknoscript"));
        assert!(page.contains("flag-1-looknoscript"));
    }

    #[test]
    fn test_purchase_page_carries_success_marker() {
        let store = CatalogStore::new();
        let page = purchase(store.featured(), 2);
        assert!(page.contains(PURCHASE_SUCCESS_STRING));
    }

    #[test]
    fn test_item_page_inserts_rendered_reviews_raw() {
        let store = CatalogStore::new();
        let item_ref = store.item(1).unwrap();
        let rendered = vec![transform("<b>great</b>", Level::Three)];
        let page = item(item_ref, &rendered);
        assert!(page.contains("<li><b>great</b></li>"));
    }
}
