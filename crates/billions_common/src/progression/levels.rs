//! Level System
//!
//! Levels 1-20 with an exponential experience curve and rank title bands.
//!
//! ## Experience Curve
//!
//! Experience required to advance from level L to L+1:
//! floor(BASE * 1.1^(L-1))
//! - BASE = 1000 (level 1 -> 2)
//! - each level costs 10% more than the one before
//!
//! This means:
//! - Level 1: 1,000 exp
//! - Level 5: 1,464 exp
//! - Level 19: 5,559 exp
//! - Level 20: maximum, no further threshold

use serde::{Deserialize, Serialize};

/// Highest reachable level
pub const MAX_LEVEL: u8 = 20;

/// Experience needed to leave level 1
pub const BASE_EXPERIENCE_PER_LEVEL: f64 = 1000.0;

/// Per-level growth of the experience curve
const GROWTH_FACTOR: f64 = 1.1;

/// Title bands mapping level ranges to rank titles
pub const TITLE_BANDS: &[(u8, u8, &str)] = &[
    (1, 4, "Newbie"),
    (5, 9, "Novice"),
    (10, 14, "Intermediate"),
    (15, 19, "Advanced"),
    (20, 20, "Legend"),
];

/// A member's level (1-20)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct Level(u8);

impl Level {
    pub const MIN: Level = Level(1);
    pub const MAX: Level = Level(MAX_LEVEL);

    /// Create a new level (clamped to 1-20)
    pub fn new(level: u8) -> Self {
        Self(level.clamp(1, MAX_LEVEL))
    }

    /// Create a level from a stored integer column (clamped to 1-20)
    pub fn from_i64(level: i64) -> Self {
        Self(level.clamp(1, i64::from(MAX_LEVEL)) as u8)
    }

    /// Get the raw level number
    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn is_max(&self) -> bool {
        self.0 >= MAX_LEVEL
    }

    /// Experience needed to advance from this level (0 at max level)
    pub fn threshold(&self) -> u64 {
        experience_threshold(self.0)
    }

    /// Get the rank title for this level
    pub fn title(&self) -> &'static str {
        rank_title(self.0)
    }
}

impl Default for Level {
    fn default() -> Self {
        Self::MIN
    }
}

impl From<u8> for Level {
    fn from(level: u8) -> Self {
        Self::new(level)
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.0
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Experience required to advance from `level` to `level + 1`.
///
/// Returns 0 at or above [`MAX_LEVEL`]. Levels below 1 are treated as level 1.
pub fn experience_threshold(level: u8) -> u64 {
    let level = level.max(1);
    if level >= MAX_LEVEL {
        return 0;
    }
    (BASE_EXPERIENCE_PER_LEVEL * experience_multiplier(Level(level))).floor() as u64
}

/// Growth factor 1.1^(level-1), shared by the curve and the diminishing-returns divisor
pub fn experience_multiplier(level: Level) -> f64 {
    GROWTH_FACTOR.powi(i32::from(level.value()) - 1)
}

/// Total experience needed to reach `level` from level 1
pub fn exp_for_level(level: u8) -> u64 {
    (1..level.max(1)).map(experience_threshold).sum()
}

/// Total experience needed to reach the level after `level`
pub fn next_level_exp(level: u8) -> u64 {
    exp_for_level(level.saturating_add(1))
}

/// Rank title for a level
pub fn rank_title(level: u8) -> &'static str {
    for &(min, max, title) in TITLE_BANDS {
        if level >= min && level <= max {
            return title;
        }
    }
    if level < 1 {
        "Newbie"
    } else {
        "Legend"
    }
}

/// Level breakdown derived from lifetime experience
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelInfo {
    pub level: Level,
    /// Experience accumulated inside the current level
    pub current_exp: u64,
    pub exp_to_next_level: u64,
    /// 0-100; exactly 100 at max level
    pub exp_percentage: f64,
    pub total_exp: u64,
}

impl LevelInfo {
    /// Walk the curve from level 1, consuming whole thresholds while they fit
    pub fn from_total_exp(total_exp: u64) -> Self {
        let mut level = 1u8;
        let mut exp_used = 0u64;

        while level < MAX_LEVEL {
            let needed = experience_threshold(level);
            if exp_used + needed > total_exp {
                break;
            }
            exp_used += needed;
            level += 1;
        }

        let current_exp = total_exp - exp_used;

        if level >= MAX_LEVEL {
            return Self {
                level: Level::MAX,
                current_exp,
                exp_to_next_level: 0,
                exp_percentage: 100.0,
                total_exp,
            };
        }

        let threshold = experience_threshold(level);
        Self {
            level: Level(level),
            current_exp,
            exp_to_next_level: threshold - current_exp,
            exp_percentage: current_exp as f64 * 100.0 / threshold as f64,
            total_exp,
        }
    }

    pub fn title(&self) -> &'static str {
        self.level.title()
    }
}

/// Level breakdown for a lifetime experience total
pub fn level_info_from_total_exp(total_exp: u64) -> LevelInfo {
    LevelInfo::from_total_exp(total_exp)
}
