// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Lapanen - Visit Orchestrator
 * One page load under a leased browser session
 *
 * The orchestrator leases a session, injects the impersonation
 * headers into every request the page makes (the exploited page may
 * itself fetch further resources that must carry them), loads the
 * page under a hard timeout, and returns the post-script-execution
 * serialization of the document - injected script that mutates the
 * page is visible in the result, not just the original markup.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::driver_pool::{BrowserSession, DriverPool};
use crate::errors::VisitError;

/// Hard bound on one page load, navigation included.
pub const PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Settle window after navigation so injected script has run before
/// the document is serialized.
const RENDER_SETTLE: Duration = Duration::from_millis(500);

/// Seam between the verification HTTP surface and the browser work,
/// so the protocol can be tested without Chrome.
#[async_trait]
pub trait PageVisitor: Send + Sync {
    /// Load `url` with `headers` attached to every outbound request,
    /// returning the rendered document source.
    async fn visit(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
    ) -> Result<String, VisitError>;
}

/// Production visitor backed by the driver pool.
pub struct BrowserVisitor {
    pool: DriverPool<BrowserSession>,
    page_load_timeout: Duration,
}

impl BrowserVisitor {
    pub fn new(pool: DriverPool<BrowserSession>) -> Self {
        Self {
            pool,
            page_load_timeout: PAGE_LOAD_TIMEOUT,
        }
    }

    pub fn pool(&self) -> &DriverPool<BrowserSession> {
        &self.pool
    }
}

#[async_trait]
impl PageVisitor for BrowserVisitor {
    async fn visit(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
    ) -> Result<String, VisitError> {
        validate_url(url)?;

        let lease = self.pool.lease().await?;
        info!("[Visit] Got free driver for {}", url);

        // Browser is a cheap handle; the session itself stays with the
        // lease on this side of the blocking boundary.
        let browser = lease.browser().clone();
        let url_owned = url.to_string();
        let headers_owned = headers.clone();

        // headless_chrome is synchronous; run the load in a blocking
        // task like the rest of our browser work.
        let load =
            tokio::task::spawn_blocking(move || load_page(&browser, &url_owned, &headers_owned));

        let result = match tokio::time::timeout(self.page_load_timeout, load).await {
            Err(_elapsed) => {
                // The in-flight load is abandoned, not interrupted; the
                // lease still returns the session when it drops below.
                Err(VisitError::Timeout {
                    duration: self.page_load_timeout,
                })
            }
            Ok(Err(join_err)) => Err(VisitError::Browser(format!(
                "Page load task panicked: {join_err}"
            ))),
            Ok(Ok(outcome)) => outcome,
        };

        drop(lease);
        result
    }
}

/// A probe target must be an absolute http(s) URL.
pub fn validate_url(raw: &str) -> Result<(), VisitError> {
    let parsed = Url::parse(raw).map_err(|_| VisitError::InvalidUrl {
        url: raw.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(VisitError::InvalidUrl {
            url: raw.to_string(),
        }),
    }
}

/// Synchronous page load (runs in a blocking thread).
fn load_page(
    browser: &headless_chrome::Browser,
    url: &str,
    headers: &HashMap<String, String>,
) -> Result<String, VisitError> {
    let tab = browser
        .new_tab()
        .map_err(|e| VisitError::Browser(format!("Failed to create tab: {e}")))?;

    if !headers.is_empty() {
        // Applied by the browser to every request from this tab, not
        // only the top-level navigation.
        let header_refs: HashMap<&str, &str> = headers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        tab.set_extra_http_headers(header_refs)
            .map_err(|e| VisitError::Browser(format!("Failed to install headers: {e}")))?;
    }

    debug!("[Visit] Navigating to {}", url);
    tab.navigate_to(url)
        .map_err(|e| VisitError::Browser(format!("Navigation failed: {e}")))?;
    tab.wait_until_navigated()
        .map_err(|e| VisitError::Browser(format!("Navigation did not settle: {e}")))?;

    std::thread::sleep(RENDER_SETTLE);

    let source = tab
        .get_content()
        .map_err(|e| VisitError::Browser(format!("Failed to serialize document: {e}")))?;

    // Tabs accumulate across pool reuses otherwise
    let _ = tab.close(true);

    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url_accepts_http_and_https() {
        assert!(validate_url("http://app/?query=x").is_ok());
        assert!(validate_url("https://shop.example/item/3").is_ok());
    }

    #[test]
    fn test_validate_url_rejects_relative_and_garbage() {
        assert!(matches!(
            validate_url("/item/3"),
            Err(VisitError::InvalidUrl { .. })
        ));
        assert!(matches!(
            validate_url("not a url"),
            Err(VisitError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_validate_url_rejects_unsupported_schemes() {
        assert!(matches!(
            validate_url("ftp://files.example/x"),
            Err(VisitError::InvalidUrl { .. })
        ));
        assert!(matches!(
            validate_url("javascript:alert(1)"),
            Err(VisitError::InvalidUrl { .. })
        ));
    }
}
