// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Lapanen - Verification Client
 * Decides when to probe, submits the probe, interprets the outcome
 *
 * Runs on the shop side. Every failure on this path - transport,
 * verifier error, missing marker - collapses to "exploit unproven":
 * logged, never surfaced to the student, never allowed to interrupt
 * the request that triggered it. The only user-visible effect of a
 * failed verification is that no flag appears.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use serde_json::json;
use tracing::{error, info, warn};

use crate::errors::{LapanenError, LapanenResult};
use crate::flags::FlagIssuer;
use crate::sanitizer::Level;
use crate::session::Identity;

/// Fixed marker proving the exploit triggered the purchase action:
/// it only appears on the purchase confirmation page, which is
/// reachable from the probed page through script alone.
pub const PURCHASE_SUCCESS_STRING: &str = "Purchase successful!";

/// Trusted header carrying the acting identity. Its presence marks a
/// request as self-test traffic.
pub const HEADER_WITH_ID: &str = "x-with-id";
/// Trusted header overriding the level for a single request.
pub const HEADER_WITH_LEVEL: &str = "x-with-level";

pub struct VerificationClient {
    http: reqwest::Client,
    verifier_url: String,
    shop_base: String,
    issuer: FlagIssuer,
}

impl VerificationClient {
    /// `verifier_url` is the verification service root (no trailing
    /// slash); `shop_base` is the absolute base under which the
    /// probe's browser reaches the shop.
    pub fn new(verifier_url: String, shop_base: String, issuer: FlagIssuer) -> Self {
        Self {
            http: reqwest::Client::new(),
            verifier_url,
            shop_base,
            issuer,
        }
    }

    /// Probe `path` (path + query as the target page would see it) as
    /// `identity` at `level`, and issue the flag if the exploit
    /// demonstrably ran. Absorbs every failure.
    pub async fn test_exploit(&self, identity: &Identity, level: Level, path: &str) {
        if identity.self_test {
            info!("[Verify] Skipping test (originated from verification harness)");
            return;
        }

        let url = format!("{}{}", self.shop_base, path);
        info!("[Verify] Testing {}, level {}: {}", identity.id, level, url);

        match self.submit_probe(&url, &identity.id, level).await {
            Ok(source) if source.contains(PURCHASE_SUCCESS_STRING) => {
                let flag = self.issuer.issue(&identity.id, level).await;
                info!("[Verify] Test passed, issued {}", flag);
            }
            Ok(_) => {
                warn!("[Verify] Test failed for url: {}", url);
            }
            Err(e) => {
                error!("[Verify] Testing server error for {}: {}", url, e);
            }
        }
    }

    /// POST the probe and return the rendered document source.
    async fn submit_probe(&self, url: &str, identity: &str, level: Level) -> LapanenResult<String> {
        let body = json!({
            "url": url,
            "headers": {
                HEADER_WITH_ID: identity,
                HEADER_WITH_LEVEL: level.as_u8().to_string(),
            }
        });

        let response = self
            .http
            .post(format!("{}/visit", self.verifier_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LapanenError::Transport(format!("Malformed verifier response: {e}")))?;

        if !status.is_success() {
            let message = payload
                .get("error")
                .and_then(|e| e.as_str())
                .unwrap_or("unknown verifier error");
            return Err(LapanenError::Transport(format!(
                "Verifier returned {status}: {message}"
            )));
        }

        Ok(payload
            .get("source")
            .and_then(|s| s.as_str())
            .unwrap_or_default()
            .to_string())
    }
}
