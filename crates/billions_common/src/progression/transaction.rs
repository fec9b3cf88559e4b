//! Score Transaction
//!
//! Applies raw point and experience deltas to a member's stored progression.
//! Both the score route and in-process sessions call into here, so the rules
//! cannot drift between call sites.
//!
//! Nothing in this module persists anything. Callers write the returned
//! tuple back to their store.

use super::levels::{experience_multiplier, Level, MAX_LEVEL};
use serde::{Deserialize, Serialize};

/// Flat experience per level used when leveling up inside a transaction.
/// Independent of the display curve in `levels`.
pub const LEVEL_UP_EXPERIENCE: i64 = 1000;

/// Stored progression state of one member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgression {
    /// Spendable score, never negative
    pub points: i64,
    /// Experience inside the current level; 0 at max level
    pub experience: i64,
    /// Lifetime experience
    pub total_exp: i64,
    pub level: Level,
}

impl UserProgression {
    /// Fresh level-1 progression with the given starting points
    pub fn new(starting_points: i64) -> Self {
        Self {
            points: starting_points.max(0),
            experience: 0,
            total_exp: 0,
            level: Level::MIN,
        }
    }

    /// Display breakdown from lifetime experience
    pub fn level_info(&self) -> super::LevelInfo {
        super::LevelInfo::from_total_exp(self.total_exp.max(0) as u64)
    }
}

/// Result of applying experience: the new tuple plus what happened on the way
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExperienceOutcome {
    pub progression: UserProgression,
    /// Experience actually credited after the level divisor
    pub adjusted_amount: i64,
    pub levels_gained: u8,
}

impl ExperienceOutcome {
    pub fn leveled_up(&self) -> bool {
        self.levels_gained > 0
    }
}

/// floor(raw / 1.1^(level-1)); negative amounts floor away from zero
pub fn adjusted_experience(raw_amount: i64, level: Level) -> i64 {
    (raw_amount as f64 / experience_multiplier(level)).floor() as i64
}

/// Apply a raw experience delta (award or penalty).
pub fn apply_experience(user: &UserProgression, raw_amount: i64) -> ExperienceOutcome {
    let adjusted = adjusted_experience(raw_amount, user.level);
    let starting_level = user.level;

    let mut next = *user;
    next.experience = user.experience.saturating_add(adjusted).max(0);
    next.total_exp = user.total_exp.saturating_add(adjusted).max(0);

    if next.level.is_max() {
        next.experience = 0;
    } else if next.experience >= LEVEL_UP_EXPERIENCE {
        let reached = i64::from(next.level.value()) + next.experience / LEVEL_UP_EXPERIENCE;
        next.experience %= LEVEL_UP_EXPERIENCE;

        if reached >= i64::from(MAX_LEVEL) {
            next.level = Level::MAX;
            next.experience = 0;
        } else {
            next.level = Level::from_i64(reached);
        }
    }

    ExperienceOutcome {
        progression: next,
        adjusted_amount: adjusted,
        levels_gained: next.level.value() - starting_level.value(),
    }
}

/// Apply a raw points delta, flooring the balance at zero.
pub fn apply_points(user: &UserProgression, raw_amount: i64) -> UserProgression {
    UserProgression {
        points: user.points.saturating_add(raw_amount).max(0),
        ..*user
    }
}

/// Points first, then experience. The single entry point for game events.
pub fn apply_game_result(user: &UserProgression, points: i64, experience: i64) -> ExperienceOutcome {
    apply_experience(&apply_points(user, points), experience)
}
