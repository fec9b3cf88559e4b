//! Shared types and logic for Billions Club components.
//!
//! The daemon and any in-process caller both go through this crate, so the
//! leveling math and the score transaction live in exactly one place.

pub mod accounts;
pub mod error;
pub mod leaderboard;
pub mod moderation;
pub mod progression;
pub mod referral;
pub mod session;
pub mod store;
pub mod verification;

pub use accounts::{sign_up, SignUpRequest};
pub use error::{ParseVariantError, SessionError, StoreError};
pub use leaderboard::{LeaderboardEntry, LeaderboardKind};
pub use moderation::{check_message_content, sanitize_message, ModerationReport};
pub use progression::{
    apply_experience, apply_game_result, apply_points, experience_threshold, level_info_from_total_exp,
    rank_title, ExperienceOutcome, Level, LevelInfo, RewardDelta, UserProgression, MAX_LEVEL,
};
pub use session::Session;
pub use store::{
    AvatarType, GameResultRecord, NewUser, ProfileUpdate, SqliteUserStore, UserProfile, UserStore,
};
pub use verification::{
    evaluate_verification, record_verification, VerificationAnswer, VerificationResult, VerificationStatus,
};
