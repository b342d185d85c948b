// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Lapanen - Training Shop HTTP Surface
 * The intentionally vulnerable mitten store
 *
 * Every route renders and records independently of verification:
 * probe failures are absorbed by the verification client, so a search
 * or review always completes for the student even when the verifier
 * is down or exhausted.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use axum::{
    extract::{Extension, Form, Path, Query, RawQuery, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;
use url::Url;
use uuid::Uuid;

use crate::catalog::CatalogStore;
use crate::flags::FlagIssuer;
use crate::pages;
use crate::sanitizer::{transform, Level};
use crate::session::{Identity, SessionStore};
use crate::verify_client::{VerificationClient, HEADER_WITH_ID, HEADER_WITH_LEVEL};

const IDENTITY_COOKIE: &str = "lapanen-id";

pub struct ShopState {
    pub catalog: CatalogStore,
    pub sessions: Arc<SessionStore>,
    pub flags: FlagIssuer,
    pub verify: VerificationClient,
}

pub fn create_shop_router(state: Arc<ShopState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/item/:item_id", get(item_handler))
        .route("/review", post(review_handler))
        .route("/purchase", post(purchase_handler))
        .route("/level", post(level_handler))
        .route("/clear", post(clear_handler))
        .layer(middleware::from_fn(identity_layer))
        .with_state(state)
}

/// Assigns the acting identity before every request: the trusted
/// `x-with-id` header wins (and marks the request as self-test
/// traffic), then the identity cookie, then a fresh id set on the
/// response for first contact.
async fn identity_layer(mut request: Request, next: Next) -> Response {
    let (identity, is_new) = match request
        .headers()
        .get(HEADER_WITH_ID)
        .and_then(|v| v.to_str().ok())
    {
        Some(id) => (Identity::harness(id), false),
        None => match cookie_value(request.headers(), IDENTITY_COOKIE) {
            Some(id) => (Identity::user(id), false),
            None => (Identity::user(Uuid::new_v4().to_string()), true),
        },
    };

    request.extensions_mut().insert(identity.clone());
    let mut response = next.run(request).await;

    if is_new {
        let cookie = format!("{}={}; Path=/; HttpOnly", IDENTITY_COOKIE, identity.id);
        if let Ok(value) = cookie.parse() {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

/// Where to send the user after a form action: back to the referring
/// page if there is one, else the landing page. Only the path and
/// query of the referrer are kept, so the redirect never leaves the
/// shop's own host.
fn back_target(headers: &HeaderMap) -> String {
    headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .and_then(|raw| Url::parse(raw).ok())
        .map(|url| match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        })
        .unwrap_or_else(|| "/".to_string())
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').map(str::trim).find_map(|pair| {
        pair.strip_prefix(name)
            .and_then(|rest| rest.strip_prefix('='))
            .map(str::to_string)
    })
}

/// Level for this request: the trusted `x-with-level` header overrides
/// the stored level without mutating it.
async fn resolve_level(headers: &HeaderMap, sessions: &SessionStore, identity: &str) -> Level {
    if let Some(raw) = headers.get(HEADER_WITH_LEVEL).and_then(|v| v.to_str().ok()) {
        match raw.parse::<u8>().map_err(|e| e.to_string()).and_then(|n| {
            Level::parse(n).map_err(|e| e.to_string())
        }) {
            Ok(level) => return level,
            Err(e) => warn!("[Shop] Ignoring bad {} header: {}", HEADER_WITH_LEVEL, e),
        }
    }
    sessions.level(identity).await
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    query: String,
}

async fn index_handler(
    State(state): State<Arc<ShopState>>,
    Extension(identity): Extension<Identity>,
    headers: HeaderMap,
    RawQuery(raw_query): RawQuery,
    Query(params): Query<SearchParams>,
) -> Html<String> {
    let level = resolve_level(&headers, &state.sessions, &identity.id).await;
    let rendered_query = transform(&params.query, level);

    let results = if params.query.is_empty() {
        state.catalog.all_items().iter().collect()
    } else {
        // Reflected levels are probed right after rendering: the
        // exploit, if any, lives in this very response.
        if level.is_reflected() {
            let path = format!("/?{}", raw_query.unwrap_or_default());
            state.verify.test_exploit(&identity, level, &path).await;
        }
        state.catalog.search(&params.query)
    };

    let flag = state.flags.get(&identity.id, level).await;

    Html(pages::index(
        &params.query,
        &rendered_query,
        &results,
        state.catalog.featured(),
        level,
        flag.as_deref(),
    ))
}

async fn item_handler(
    State(state): State<Arc<ShopState>>,
    Extension(identity): Extension<Identity>,
    headers: HeaderMap,
    Path(item_id): Path<i64>,
) -> Result<Html<String>, StatusCode> {
    let item = state.catalog.item(item_id).ok_or(StatusCode::NOT_FOUND)?;
    let level = resolve_level(&headers, &state.sessions, &identity.id).await;

    let rendered_reviews: Vec<String> = state
        .catalog
        .reviews_for(&identity.id, item_id)
        .await
        .iter()
        .map(|r| transform(&r.review, level))
        .collect();

    Ok(Html(pages::item(item, &rendered_reviews)))
}

#[derive(Debug, Deserialize)]
struct ReviewForm {
    item: i64,
    review: String,
}

async fn review_handler(
    State(state): State<Arc<ShopState>>,
    Extension(identity): Extension<Identity>,
    headers: HeaderMap,
    Form(form): Form<ReviewForm>,
) -> Redirect {
    state
        .catalog
        .add_review(&identity.id, form.item, form.review)
        .await;

    // Stored levels are probed after the write: the exploit only
    // manifests when the item page renders the stored review.
    let level = resolve_level(&headers, &state.sessions, &identity.id).await;
    if !level.is_reflected() {
        let path = format!("/item/{}", form.item);
        state.verify.test_exploit(&identity, level, &path).await;
    }

    Redirect::to(&format!("/item/{}", form.item))
}

#[derive(Debug, Deserialize)]
struct PurchaseForm {
    item: i64,
    quantity: u32,
}

async fn purchase_handler(
    State(state): State<Arc<ShopState>>,
    Extension(identity): Extension<Identity>,
    Form(form): Form<PurchaseForm>,
) -> Result<Html<String>, StatusCode> {
    let item = state.catalog.item(form.item).ok_or(StatusCode::NOT_FOUND)?;
    state
        .catalog
        .add_purchase(&identity.id, form.item, form.quantity)
        .await;

    Ok(Html(pages::purchase(item, form.quantity)))
}

#[derive(Debug, Deserialize)]
struct LevelForm {
    #[serde(rename = "xss-level")]
    level: u8,
}

async fn level_handler(
    State(state): State<Arc<ShopState>>,
    Extension(identity): Extension<Identity>,
    headers: HeaderMap,
    Form(form): Form<LevelForm>,
) -> Result<Redirect, StatusCode> {
    let level = Level::parse(form.level).map_err(|_| StatusCode::BAD_REQUEST)?;
    state.sessions.set_level(&identity.id, level).await;

    // The final lesson starts from a clean slate: old stored payloads
    // would make level 4 trivially "solvable".
    if level == Level::Four {
        state.catalog.clear_reviews(&identity.id).await;
    }

    Ok(Redirect::to(&back_target(&headers)))
}

async fn clear_handler(
    State(state): State<Arc<ShopState>>,
    Extension(identity): Extension<Identity>,
    headers: HeaderMap,
) -> Redirect {
    state.catalog.clear_reviews(&identity.id).await;
    Redirect::to(&back_target(&headers))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_map(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (k, v) in pairs {
            headers.insert(
                axum::http::HeaderName::from_bytes(k.as_bytes()).unwrap(),
                v.parse().unwrap(),
            );
        }
        headers
    }

    #[test]
    fn test_cookie_value_parses_among_others() {
        let headers = header_map(&[("cookie", "theme=dark; lapanen-id=abc-123; other=1")]);
        assert_eq!(
            cookie_value(&headers, IDENTITY_COOKIE).as_deref(),
            Some("abc-123")
        );
        assert!(cookie_value(&headers, "missing").is_none());
    }

    #[tokio::test]
    async fn test_resolve_level_header_overrides_without_mutating() {
        let sessions = SessionStore::new();
        sessions.set_level("a", Level::One).await;

        let headers = header_map(&[(HEADER_WITH_LEVEL, "3")]);
        assert_eq!(resolve_level(&headers, &sessions, "a").await, Level::Three);
        // The stored level is untouched by the override
        assert_eq!(sessions.level("a").await, Level::One);
    }

    #[test]
    fn test_back_target_keeps_referrer_path_and_query() {
        let headers = header_map(&[("referer", "http://app/item/2?from=search")]);
        assert_eq!(back_target(&headers), "/item/2?from=search");

        // Even a foreign referrer only ever yields a local path
        let headers = header_map(&[("referer", "http://evil.example/item/2")]);
        assert_eq!(back_target(&headers), "/item/2");
    }

    #[test]
    fn test_back_target_defaults_to_landing_page() {
        assert_eq!(back_target(&HeaderMap::new()), "/");

        let headers = header_map(&[("referer", "not a url")]);
        assert_eq!(back_target(&headers), "/");
    }

    #[tokio::test]
    async fn test_resolve_level_ignores_garbage_header() {
        let sessions = SessionStore::new();
        sessions.set_level("a", Level::Two).await;

        let headers = header_map(&[(HEADER_WITH_LEVEL, "11")]);
        assert_eq!(resolve_level(&headers, &sessions, "a").await, Level::Two);

        let headers = header_map(&[(HEADER_WITH_LEVEL, "banana")]);
        assert_eq!(resolve_level(&headers, &sessions, "a").await, Level::Two);
    }
}
