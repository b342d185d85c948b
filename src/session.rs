// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Lapanen - Identity Session Store
 * Concurrency-safe per-identity state (level, earned flags)
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

use crate::sanitizer::Level;

/// The identity acting on a request. Assigned once per user and
/// persisted in their cookie; the verification harness supplies its
/// own via the trusted `x-with-id` header, which marks the request as
/// self-test traffic.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: String,
    /// True when the request originated from the verification harness.
    /// Such a request must never trigger another probe.
    pub self_test: bool,
}

impl Identity {
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            self_test: false,
        }
    }

    pub fn harness(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            self_test: true,
        }
    }
}

#[derive(Debug, Default, Clone)]
struct UserSession {
    level: Option<Level>,
    flags: HashMap<u8, String>,
}

/// Identity-keyed mutable state behind a narrow get/set interface.
/// The map is the only shared structure; every access goes through
/// the lock.
#[derive(Default)]
pub struct SessionStore {
    inner: RwLock<HashMap<String, UserSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored level for an identity, defaulting to level 0 on first
    /// contact.
    pub async fn level(&self, identity: &str) -> Level {
        self.inner
            .read()
            .await
            .get(identity)
            .and_then(|s| s.level)
            .unwrap_or(Level::Zero)
    }

    pub async fn set_level(&self, identity: &str, level: Level) {
        let mut inner = self.inner.write().await;
        inner.entry(identity.to_string()).or_default().level = Some(level);
        info!("[Session] User {} switched to level {}", identity, level);
    }

    /// Previously issued flag for (identity, level), if any.
    pub async fn flag(&self, identity: &str, level: Level) -> Option<String> {
        self.inner
            .read()
            .await
            .get(identity)
            .and_then(|s| s.flags.get(&level.as_u8()).cloned())
    }

    pub async fn record_flag(&self, identity: &str, level: Level, flag: String) {
        let mut inner = self.inner.write().await;
        inner
            .entry(identity.to_string())
            .or_default()
            .flags
            .insert(level.as_u8(), flag);
    }

    /// Drop all earned flags for an identity. Re-issuance afterwards
    /// yields the same deterministic flags.
    pub async fn clear_flags(&self, identity: &str) {
        let mut inner = self.inner.write().await;
        if let Some(session) = inner.get_mut(identity) {
            session.flags.clear();
        }
    }
}
