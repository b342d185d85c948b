// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Lapanen - XSS Training Shop & Exploit Verification Service
 *
 * Two cooperating services:
 * - the shop: an intentionally vulnerable mitten store with five
 *   escalating sanitization levels
 * - the verifier: a bounded pool of headless Chrome sessions that
 *   visits a crafted URL and reports the rendered document, so
 *   exploits are confirmed by an actual browser rather than by
 *   string matching alone
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

pub mod catalog;
pub mod config;
pub mod driver_pool;
pub mod errors;
pub mod flags;
pub mod pages;
pub mod sanitizer;
pub mod session;
pub mod shop;
pub mod verify_client;
pub mod verify_service;
pub mod visitor;
