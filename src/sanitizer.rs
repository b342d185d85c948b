// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Lapanen - Sanitization Engine
 * Per-level query filtering, weakest to strongest
 *
 * Each level is a lesson: the filter is exactly as strong as the
 * lesson requires and no stronger. Levels 0-2 are bypassable on
 * purpose; level 3 leaves filtering to the sink; level 4 escapes
 * unconditionally and moves the lesson to header trust instead.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{LapanenError, LapanenResult};

/// Open angle bracket, one or more letters, close angle bracket.
/// Bypassable via attributes (`<img src=x onerror=..>`) or malformed
/// tags, which is the level-2 lesson.
static SIMPLE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[a-zA-Z]+>").expect("simple tag pattern is valid"));

/// Difficulty tier. Closed set: adding a level is a compile-time
/// checked change everywhere it is matched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Zero,
    One,
    Two,
    Three,
    Four,
}

impl Level {
    /// All levels, weakest first.
    pub const ALL: [Level; 5] = [
        Level::Zero,
        Level::One,
        Level::Two,
        Level::Three,
        Level::Four,
    ];

    /// Parse a stored or submitted numeric level. Anything outside
    /// 0..=4 is unreachable except via tampering and is rejected as a
    /// configuration error.
    pub fn parse(raw: u8) -> LapanenResult<Level> {
        match raw {
            0 => Ok(Level::Zero),
            1 => Ok(Level::One),
            2 => Ok(Level::Two),
            3 => Ok(Level::Three),
            4 => Ok(Level::Four),
            other => Err(LapanenError::Configuration(format!(
                "No sanitization level #{other}"
            ))),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Level::Zero => 0,
            Level::One => 1,
            Level::Two => 2,
            Level::Three => 3,
            Level::Four => 4,
        }
    }

    /// Reflected levels probe after rendering the search page; stored
    /// levels probe after a review is written, since the exploit only
    /// manifests when the stored content is rendered later.
    pub fn is_reflected(self) -> bool {
        matches!(self, Level::Zero | Level::One | Level::Two)
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Transform a raw query into its rendered form for the given level.
/// Pure function of its two inputs.
pub fn transform(raw: &str, level: Level) -> String {
    match level {
        // Deliberately exploitable: no filtering at all.
        Level::Zero => raw.to_string(),
        // Removes only the literal opening script tag. Case variants
        // and alternate tags go straight through.
        Level::One => raw.replace("<script>", ""),
        Level::Two => SIMPLE_TAG.replace_all(raw, "").into_owned(),
        // Identity on purpose: whatever protection level 3 has must
        // come from the sink, not from this filter.
        Level::Three => raw.to_string(),
        // Baseline-safe output. The level-4 lesson is about trusting
        // the identity header, not about this filter.
        Level::Four => raw.replace('<', "&lt;").replace('>', "&gt;"),
    }
}
