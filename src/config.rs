// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Lapanen - Configuration
 * Environment-driven settings with production defaults
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use serde::{Deserialize, Serialize};

/// Browser sessions kept in the production pool. Debug mode runs a
/// single headful session instead.
pub const DEFAULT_POOL_SIZE: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierConfig {
    pub host: String,
    pub port: u16,
    pub pool_size: usize,
    pub headless: bool,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            pool_size: DEFAULT_POOL_SIZE,
            headless: true,
        }
    }
}

impl VerifierConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(port) = std::env::var("VERIFIER_PORT") {
            if let Ok(port) = port.parse() {
                config.port = port;
            }
        }
        if let Ok(size) = std::env::var("VERIFIER_POOL_SIZE") {
            if let Ok(size) = size.parse() {
                config.pool_size = size;
            }
        }
        config
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopConfig {
    pub host: String,
    pub port: u16,
    /// Root URL of the verification service.
    pub verifier_url: String,
    /// Absolute base under which the probe's browser reaches the shop
    /// (the docker service name in the standard deployment).
    pub public_base_url: String,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 80,
            verifier_url: "http://xss-tester:8080".to_string(),
            public_base_url: "http://app".to_string(),
        }
    }
}

impl ShopConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(port) = std::env::var("SHOP_PORT") {
            if let Ok(port) = port.parse() {
                config.port = port;
            }
        }
        if let Ok(url) = std::env::var("VERIFIER_URL") {
            config.verifier_url = url;
        }
        if let Ok(url) = std::env::var("SHOP_PUBLIC_URL") {
            config.public_base_url = url;
        }
        config
    }
}
