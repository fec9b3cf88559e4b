//! Progression Module
//!
//! Leveling and score rules for Billions Club members.
//!
//! ## Level System
//!
//! - Levels 1-20, each level needs 10% more experience than the last
//! - Rank titles based on level bands
//! - Experience earned from mini-games, verification and daily activity
//!
//! ## Transaction
//!
//! - Incoming experience is divided by the same 1.1 growth curve (diminishing returns)
//! - Level-ups inside a transaction use a flat 1000 experience per level
//! - Points never drop below zero
//!
//! The display curve and the flat level-up threshold disagree on purpose;
//! both are kept so stored levels stay compatible with existing accounts.

pub mod levels;
pub mod rewards;
pub mod transaction;

pub use levels::{
    exp_for_level, experience_multiplier, experience_threshold, level_info_from_total_exp,
    next_level_exp, rank_title, Level, LevelInfo, BASE_EXPERIENCE_PER_LEVEL, MAX_LEVEL, TITLE_BANDS,
};
pub use rewards::{
    impostor_round_score, match_count, quiz_reward, roll_reels, spin_reward, ExperienceRewards,
    RewardDelta, SpinMatch, Toy, EXPERIENCE_REWARDS,
};
pub use transaction::{
    adjusted_experience, apply_experience, apply_game_result, apply_points, ExperienceOutcome,
    UserProgression, LEVEL_UP_EXPERIENCE,
};
