// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Error Types
 * Failure taxonomy for the training shop and the verification path
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::time::Duration;
use thiserror::Error;

/// Failures of a single verification visit.
///
/// Every variant is terminal for that probe: the caller reports
/// "exploit unproven" and moves on, it never crashes the service.
#[derive(Error, Debug)]
pub enum VisitError {
    #[error("Driver pool exhausted after {attempts} attempts")]
    PoolExhausted { attempts: u32 },

    #[error("Page load timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("URL was invalid: {url}")]
    InvalidUrl { url: String },

    #[error("Browser error: {0}")]
    Browser(String),
}

/// Application-level errors for the shop side.
#[derive(Error, Debug)]
pub enum LapanenError {
    /// Fatal, deployment-time only (bad level, browser launch failure).
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Visit error: {0}")]
    Visit(#[from] VisitError),

    /// Failure to reach the verification service. Absorbed at the shop
    /// boundary and logged, never surfaced to the end user.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for LapanenError {
    fn from(err: reqwest::Error) -> Self {
        LapanenError::Transport(err.to_string())
    }
}

/// Result type for shop operations
pub type LapanenResult<T> = Result<T, LapanenError>;
