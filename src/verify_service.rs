// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Lapanen - Verification Service HTTP Surface
 * POST /visit: load a URL in a pooled browser, return the document
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

use crate::errors::VisitError;
use crate::visitor::PageVisitor;

#[derive(Debug, Deserialize)]
pub struct VisitRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct VisitResponse {
    pub source: String,
}

/// Build the verifier router over any `PageVisitor`.
pub fn create_visit_router(visitor: Arc<dyn PageVisitor>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/visit", post(visit_handler))
        .with_state(visitor)
}

async fn index_handler() -> &'static str {
    "ok"
}

async fn visit_handler(
    State(visitor): State<Arc<dyn PageVisitor>>,
    Json(request): Json<VisitRequest>,
) -> Result<impl IntoResponse, VisitApiError> {
    if request.url.is_empty() {
        error!("[Verifier] Did not get URL");
        return Err(VisitApiError::NoUrl);
    }

    info!(
        "[Verifier] Requesting URL: {} with headers: {:?}",
        request.url, request.headers
    );

    let source = visitor
        .visit(&request.url, &request.headers)
        .await
        .map_err(|e| {
            error!("[Verifier] Error on URL {}: {}", request.url, e);
            VisitApiError::Visit(e)
        })?;

    Ok(Json(VisitResponse { source }))
}

#[derive(Debug)]
enum VisitApiError {
    NoUrl,
    Visit(VisitError),
}

impl IntoResponse for VisitApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            VisitApiError::NoUrl => (StatusCode::BAD_REQUEST, "No URL".to_string()),
            // PoolExhausted, Timeout, InvalidUrl and unclassified
            // browser failures all surface as server errors; the shop
            // treats any of them as "exploit unproven".
            VisitApiError::Visit(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
