// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Shop Flow Tests
 * Full shop flows with a mocked verification service
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lapanen::catalog::CatalogStore;
use lapanen::flags::{flag_for, FlagIssuer};
use lapanen::sanitizer::Level;
use lapanen::session::SessionStore;
use lapanen::shop::{create_shop_router, ShopState};
use lapanen::verify_client::VerificationClient;

const SHOP_BASE: &str = "http://shop.test";
const PAYLOAD: &str = "<script>alert(1)</script>";

/// Shop wired against `verifier_url`, served on an ephemeral port.
/// Returns the local base URL and the shared state for assertions.
async fn serve_shop(verifier_url: &str) -> (String, Arc<ShopState>) {
    let sessions = Arc::new(SessionStore::new());
    let flags = FlagIssuer::new(sessions.clone());
    let verify = VerificationClient::new(
        verifier_url.to_string(),
        SHOP_BASE.to_string(),
        flags.clone(),
    );
    let state = Arc::new(ShopState {
        catalog: CatalogStore::new(),
        sessions,
        flags,
        verify,
    });

    let router = create_shop_router(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{addr}"), state)
}

/// Verifier mock whose rendered source contains the purchase marker.
async fn mock_passing_verifier() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/visit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "source": "<html><p>Purchase successful!</p></html>"
        })))
        .mount(&server)
        .await;
    server
}

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

#[tokio::test]
async fn test_reflected_search_probes_and_issues_flag() {
    let verifier = mock_passing_verifier().await;
    let (base, state) = serve_shop(&verifier.uri()).await;

    let response = client()
        .get(format!("{base}/"))
        .query(&[("query", PAYLOAD)])
        .header("cookie", "lapanen-id=student-a")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // Level 0 reflects the payload untouched
    let body = response.text().await.unwrap();
    assert!(body.contains(PAYLOAD));

    // The probe hit the verifier with the public URL and both trusted
    // headers in the request body
    let requests = verifier.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let probe: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let probe_url = probe["url"].as_str().unwrap();
    assert!(probe_url.starts_with("http://shop.test/?query="), "{probe_url}");
    assert_eq!(probe["headers"]["x-with-id"].as_str().unwrap(), "student-a");
    assert_eq!(probe["headers"]["x-with-level"].as_str().unwrap(), "0");

    // Marker came back, so the deterministic flag was recorded
    assert_eq!(
        state.sessions.flag("student-a", Level::Zero).await,
        Some(flag_for("student-a", Level::Zero))
    );

    // The flag shows up on the next page load
    let body = client()
        .get(format!("{base}/"))
        .header("cookie", "lapanen-id=student-a")
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains(&flag_for("student-a", Level::Zero)));
}

#[tokio::test]
async fn test_sanitized_search_earns_no_flag() {
    let verifier = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/visit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "source": "<html>You searched for: alert(1)</script></html>"
        })))
        .mount(&verifier)
        .await;
    let (base, state) = serve_shop(&verifier.uri()).await;

    let http = client();
    http.post(format!("{base}/level"))
        .header("cookie", "lapanen-id=student-a")
        .form(&[("xss-level", "1")])
        .send()
        .await
        .unwrap();

    let body = http
        .get(format!("{base}/"))
        .query(&[("query", PAYLOAD)])
        .header("cookie", "lapanen-id=student-a")
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    // Level 1 strips the opening tag before reflecting
    assert!(!body.contains("<script>"));
    assert!(body.contains("alert(1)</script>"));

    // Reflected level, so a probe went out, but no marker came back
    assert_eq!(verifier.received_requests().await.unwrap().len(), 1);
    assert!(state.sessions.flag("student-a", Level::One).await.is_none());
}

#[tokio::test]
async fn test_stored_review_probes_item_page() {
    let verifier = mock_passing_verifier().await;
    let (base, state) = serve_shop(&verifier.uri()).await;

    let http = client();
    http.post(format!("{base}/level"))
        .header("cookie", "lapanen-id=student-a")
        .form(&[("xss-level", "3")])
        .send()
        .await
        .unwrap();

    let response = http
        .post(format!("{base}/review"))
        .header("cookie", "lapanen-id=student-a")
        .form(&[("item", "1"), ("review", PAYLOAD)])
        .send()
        .await
        .unwrap();

    // The redirect lands on the item page, which renders the stored
    // review untouched at level 3
    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains(PAYLOAD));

    // Stored flow probes the item page, not the review POST
    let requests = verifier.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let probe: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(probe["url"].as_str().unwrap(), "http://shop.test/item/1");
    assert_eq!(probe["headers"]["x-with-level"].as_str().unwrap(), "3");

    assert_eq!(
        state.sessions.flag("student-a", Level::Three).await,
        Some(flag_for("student-a", Level::Three))
    );
}

#[tokio::test]
async fn test_harness_traffic_never_probes() {
    let verifier = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/visit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "source": "<html>Purchase successful!</html>"
        })))
        .expect(0)
        .mount(&verifier)
        .await;
    let (base, state) = serve_shop(&verifier.uri()).await;

    // Same search that would normally trigger a probe, but marked as
    // self-test traffic by the trusted identity header
    let response = client()
        .get(format!("{base}/"))
        .query(&[("query", PAYLOAD)])
        .header("x-with-id", "student-a")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert!(state.sessions.flag("student-a", Level::Zero).await.is_none());
    verifier.verify().await;
}

#[tokio::test]
async fn test_verifier_error_is_absorbed() {
    let verifier = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/visit"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": "Driver pool exhausted after 4 attempts"
        })))
        .mount(&verifier)
        .await;
    let (base, state) = serve_shop(&verifier.uri()).await;

    let response = client()
        .get(format!("{base}/"))
        .query(&[("query", PAYLOAD)])
        .header("cookie", "lapanen-id=student-a")
        .send()
        .await
        .unwrap();

    // The search still renders; only the flag is missing
    assert_eq!(response.status(), 200);
    assert!(response.text().await.unwrap().contains(PAYLOAD));
    assert!(state.sessions.flag("student-a", Level::Zero).await.is_none());
}

#[tokio::test]
async fn test_unreachable_verifier_is_absorbed() {
    // Nothing listens here
    let (base, state) = serve_shop("http://127.0.0.1:9").await;

    let response = client()
        .get(format!("{base}/"))
        .query(&[("query", PAYLOAD)])
        .header("cookie", "lapanen-id=student-a")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert!(state.sessions.flag("student-a", Level::Zero).await.is_none());
}

#[tokio::test]
async fn test_first_contact_sets_identity_cookie() {
    let verifier = mock_passing_verifier().await;
    let (base, _state) = serve_shop(&verifier.uri()).await;

    let response = client().get(format!("{base}/")).send().await.unwrap();
    let cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(cookie.starts_with("lapanen-id="));
    assert!(cookie.contains("HttpOnly"));

    // A returning identity gets no new cookie
    let response = client()
        .get(format!("{base}/"))
        .header("cookie", "lapanen-id=student-a")
        .send()
        .await
        .unwrap();
    assert!(response.headers().get("set-cookie").is_none());
}

#[tokio::test]
async fn test_level_switch_to_four_wipes_reviews() {
    let verifier = mock_passing_verifier().await;
    let (base, _state) = serve_shop(&verifier.uri()).await;

    let http = client();
    http.post(format!("{base}/level"))
        .header("cookie", "lapanen-id=student-a")
        .form(&[("xss-level", "3")])
        .send()
        .await
        .unwrap();
    http.post(format!("{base}/review"))
        .header("cookie", "lapanen-id=student-a")
        .form(&[("item", "1"), ("review", "lovely mittens")])
        .send()
        .await
        .unwrap();

    let body = http
        .get(format!("{base}/item/1"))
        .header("cookie", "lapanen-id=student-a")
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("lovely mittens"));

    http.post(format!("{base}/level"))
        .header("cookie", "lapanen-id=student-a")
        .form(&[("xss-level", "4")])
        .send()
        .await
        .unwrap();

    let body = http
        .get(format!("{base}/item/1"))
        .header("cookie", "lapanen-id=student-a")
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(!body.contains("lovely mittens"));
}

#[tokio::test]
async fn test_bad_level_value_is_rejected() {
    let verifier = mock_passing_verifier().await;
    let (base, _state) = serve_shop(&verifier.uri()).await;

    let response = client()
        .post(format!("{base}/level"))
        .header("cookie", "lapanen-id=student-a")
        .form(&[("xss-level", "9")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_purchase_renders_confirmation() {
    let verifier = mock_passing_verifier().await;
    let (base, _state) = serve_shop(&verifier.uri()).await;

    let response = client()
        .post(format!("{base}/purchase"))
        .header("cookie", "lapanen-id=student-a")
        .form(&[("item", "2"), ("quantity", "3")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(response.text().await.unwrap().contains("Purchase successful!"));

    // Unknown items cannot be purchased
    let response = client()
        .post(format!("{base}/purchase"))
        .header("cookie", "lapanen-id=student-a")
        .form(&[("item", "999"), ("quantity", "1")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_form_actions_redirect_back_to_referring_page() {
    let verifier = mock_passing_verifier().await;
    let (base, _state) = serve_shop(&verifier.uri()).await;

    let http = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    // Clearing reviews from an item page lands back on that item page
    let response = http
        .post(format!("{base}/clear"))
        .header("cookie", "lapanen-id=student-a")
        .header("referer", format!("{base}/item/2"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 303);
    assert_eq!(response.headers().get("location").unwrap(), "/item/2");

    // Same for a level switch
    let response = http
        .post(format!("{base}/level"))
        .header("cookie", "lapanen-id=student-a")
        .header("referer", format!("{base}/item/5"))
        .form(&[("xss-level", "2")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 303);
    assert_eq!(response.headers().get("location").unwrap(), "/item/5");

    // Without a referrer, both fall back to the landing page
    let response = http
        .post(format!("{base}/clear"))
        .header("cookie", "lapanen-id=student-a")
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers().get("location").unwrap(), "/");
}

#[tokio::test]
async fn test_clear_wipes_own_reviews_only() {
    let verifier = mock_passing_verifier().await;
    let (base, state) = serve_shop(&verifier.uri()).await;

    let http = client();
    for id in ["student-a", "student-b"] {
        http.post(format!("{base}/review"))
            .header("cookie", format!("lapanen-id={id}"))
            .form(&[("item", "1"), ("review", "warm and soft")])
            .send()
            .await
            .unwrap();
    }

    http.post(format!("{base}/clear"))
        .header("cookie", "lapanen-id=student-a")
        .send()
        .await
        .unwrap();

    assert!(state.catalog.reviews_for("student-a", 1).await.is_empty());
    assert_eq!(state.catalog.reviews_for("student-b", 1).await.len(), 1);
}
