// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Lapanen - Flag Issuer
 * Deterministic, identity-scoped proof-of-exploit tokens
 *
 * Each flag is mutated slightly per identity so students cannot copy
 * a classmate's flag verbatim and claim credit: the variant is picked
 * by a stable hash of (identity, level), not assigned randomly.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::info;

use crate::sanitizer::Level;
use crate::session::SessionStore;

/// Textual variants per level. Every flag for a level comes from its
/// row; which entry an identity gets is deterministic.
const FLAG_VARIANTS: [[&str; 4]; 5] = [
    ["ezpz", "Ezpz", "EZPZ", "EzPz"],
    ["looknoscript", "Looknoscript", "LOOKNOSCRIPT", "LookNoScript"],
    ["veryclever", "Veryclever", "VERYCLEVER", "VeryClever"],
    ["zerosstars", "Zerosstars", "ZEROSSTARS", "ZerosStars"],
    ["tootrusting", "Tootrusting", "TOOTRUSTING", "TooTrusting"],
];

/// Variant row for a level.
pub fn variants(level: Level) -> &'static [&'static str; 4] {
    &FLAG_VARIANTS[level.as_u8() as usize]
}

/// Compute the flag for (identity, level). Stable hash reduced modulo
/// the variant count; no stored state involved.
pub fn flag_for(identity: &str, level: Level) -> String {
    let mut hasher = Sha256::new();
    hasher.update(identity.as_bytes());
    hasher.update([level.as_u8()]);
    let digest = hasher.finalize();

    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    let row = variants(level);
    let variant = row[(u64::from_be_bytes(prefix) % row.len() as u64) as usize];

    format!("flag-{}-{}", level.as_u8(), variant)
}

/// Issues and remembers flags against the identity store.
#[derive(Clone)]
pub struct FlagIssuer {
    sessions: Arc<SessionStore>,
}

impl FlagIssuer {
    pub fn new(sessions: Arc<SessionStore>) -> Self {
        Self { sessions }
    }

    /// Issue the flag for (identity, level). Idempotent for the
    /// lifetime of the stored state; clearing the state allows
    /// re-issuance with the same deterministic result.
    pub async fn issue(&self, identity: &str, level: Level) -> String {
        if let Some(existing) = self.sessions.flag(identity, level).await {
            return existing;
        }
        let flag = flag_for(identity, level);
        info!("[Flags] Issuing level {} flag to {}", level, identity);
        self.sessions
            .record_flag(identity, level, flag.clone())
            .await;
        flag
    }

    /// Previously issued flag for (identity, level), if any.
    pub async fn get(&self, identity: &str, level: Level) -> Option<String> {
        self.sessions.flag(identity, level).await
    }
}
