// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Lapanen - Browser Driver Pool
 * Fixed-capacity pool of headless Chrome sessions with scoped leases
 *
 * Sessions are expensive to create, so they are launched once at
 * startup and reused indefinitely. A lease is exclusive: the session
 * is popped from the available set, used by exactly one visit, and
 * pushed back by the lease guard on every exit path. The lock covers
 * only the push/pop itself; page loads run outside it.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use headless_chrome::{Browser, LaunchOptions};
use std::ops::Deref;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::errors::{LapanenError, LapanenResult, VisitError};

/// Pop attempts before a lease gives up.
pub const LEASE_RETRIES: u32 = 4;
/// Backoff between pop attempts.
pub const LEASE_RETRY_WAIT: Duration = Duration::from_millis(500);

/// One live headless Chrome instance.
pub struct BrowserSession {
    browser: Browser,
}

impl BrowserSession {
    /// Launch a fresh Chrome instance. Headful in debug mode so the
    /// operator can watch exploits fire.
    pub fn launch(headless: bool) -> LapanenResult<Self> {
        let options = LaunchOptions::default_builder()
            .headless(headless)
            // Sessions live for the whole process; don't let the
            // transport reap an idle browser between probes.
            .idle_browser_timeout(Duration::from_secs(86_400))
            .build()
            .map_err(|e| LapanenError::Configuration(format!("Browser launch options: {e}")))?;

        let browser = Browser::new(options)
            .map_err(|e| LapanenError::Configuration(format!("Failed to launch Chrome: {e}")))?;

        Ok(Self { browser })
    }

    pub fn browser(&self) -> &Browser {
        &self.browser
    }
}

/// Fixed-capacity pool. Generic over the session type so pool
/// accounting is testable without Chrome; the services use
/// `DriverPool<BrowserSession>`.
pub struct DriverPool<S> {
    available: Arc<Mutex<Vec<S>>>,
    capacity: usize,
}

impl<S> DriverPool<S> {
    pub fn new(sessions: Vec<S>) -> Self {
        let capacity = sessions.len();
        Self {
            available: Arc::new(Mutex::new(sessions)),
            capacity,
        }
    }

    /// Capacity fixed at startup. leased() + available() == capacity()
    /// at all times.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.available
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn leased(&self) -> usize {
        self.capacity - self.available()
    }

    /// Take an exclusive lease on one session. Which session is
    /// immaterial; they are interchangeable. Retries a fixed number of
    /// times with a fixed backoff, then fails with PoolExhausted -
    /// terminal for this probe, the caller does not retry further.
    pub async fn lease(&self) -> Result<Lease<S>, VisitError> {
        for attempt in 1..=LEASE_RETRIES {
            if let Some(session) = self.try_take() {
                debug!("[Pool] Leased session on attempt {}", attempt);
                return Ok(Lease {
                    session: Some(session),
                    slot: Arc::clone(&self.available),
                });
            }
            debug!("[Pool] No free session (attempt {}), backing off", attempt);
            tokio::time::sleep(LEASE_RETRY_WAIT).await;
        }

        warn!("[Pool] Exhausted after {} attempts", LEASE_RETRIES);
        Err(VisitError::PoolExhausted {
            attempts: LEASE_RETRIES,
        })
    }

    fn try_take(&self) -> Option<S> {
        // The only critical section in the pool: one pop.
        self.available
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
    }
}

impl DriverPool<BrowserSession> {
    /// Launch `capacity` Chrome sessions up front.
    pub fn launch(capacity: usize, headless: bool) -> LapanenResult<Self> {
        let mut sessions = Vec::with_capacity(capacity);
        for n in 1..=capacity {
            sessions.push(BrowserSession::launch(headless)?);
            info!("[Pool] Browser session {}/{} ready", n, capacity);
        }
        Ok(Self::new(sessions))
    }
}

/// Exclusive checkout of one pooled session. Returns the session to
/// the pool exactly once when dropped, regardless of how the visit
/// ended.
#[derive(Debug)]
pub struct Lease<S> {
    session: Option<S>,
    slot: Arc<Mutex<Vec<S>>>,
}

impl<S> Deref for Lease<S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.session
            .as_ref()
            .expect("lease session present until drop")
    }
}

impl<S> Drop for Lease<S> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            self.slot
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(session);
            debug!("[Pool] Session released");
        }
    }
}
