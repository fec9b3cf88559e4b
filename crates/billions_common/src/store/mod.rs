//! User Record Store
//!
//! Persistence boundary for member accounts. Everything above this module
//! computes a complete new state first and then hands it to the store in a
//! single call, so a failed write never leaves a half-applied update.
//!
//! `SqliteUserStore` is the production implementation; callers hold an
//! `Arc<dyn UserStore>` so tests and other backends can be swapped in.

pub mod sqlite;

pub use sqlite::SqliteUserStore;

use crate::error::{ParseVariantError, StoreError};
use crate::leaderboard::LeaderboardKind;
use crate::progression::UserProgression;
use crate::verification::VerificationStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Avatar chosen at sign-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvatarType {
    #[default]
    Penguin,
    Rabbit,
}

impl AvatarType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AvatarType::Penguin => "penguin",
            AvatarType::Rabbit => "rabbit",
        }
    }
}

impl FromStr for AvatarType {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "penguin" => Ok(AvatarType::Penguin),
            "rabbit" => Ok(AvatarType::Rabbit),
            other => Err(ParseVariantError::new("avatar type", other)),
        }
    }
}

/// A member account as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub username: String,
    pub avatar_type: AvatarType,
    /// Code this member hands out to others
    pub referral_code: String,
    pub referral_count: i64,
    /// Id of the member whose code was used at sign-up
    pub referred_by: Option<String>,
    pub profile_picture_url: Option<String>,
    pub is_verified: bool,
    pub verification_status: VerificationStatus,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub progression: UserProgression,
}

/// Fields for a new account row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub id: String,
    pub email: String,
    pub username: String,
    pub avatar_type: AvatarType,
    pub referral_code: String,
    pub starting_points: i64,
    pub created_at: DateTime<Utc>,
}

/// Partial profile edit; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub avatar_type: Option<AvatarType>,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.avatar_type.is_none() && self.profile_picture_url.is_none()
    }
}

/// One row of the game results log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResultRecord {
    pub user_id: String,
    pub game_id: String,
    /// Raw points as reported by the game, before flooring
    pub points_earned: i64,
    /// Raw experience as reported by the game, before the level divisor
    pub exp_earned: i64,
    pub result: String,
}

/// Repository interface over member accounts
pub trait UserStore: Send + Sync {
    fn create_user(&self, user: &NewUser) -> Result<UserProfile, StoreError>;

    fn get_user(&self, id: &str) -> Result<UserProfile, StoreError>;

    /// Read only `{points, experience, level, total_exp}`
    fn get_progression(&self, id: &str) -> Result<UserProgression, StoreError>;

    /// Write `{points, experience, total_exp, level}` in one statement
    fn update_progression(&self, id: &str, progression: &UserProgression) -> Result<(), StoreError>;

    fn update_profile(&self, id: &str, update: &ProfileUpdate) -> Result<UserProfile, StoreError>;

    /// Set verification status and `is_verified` without touching progression
    fn set_verification(&self, id: &str, status: VerificationStatus) -> Result<(), StoreError>;

    /// Mark a member verified and apply `bonus` to the progression read in the
    /// same transaction. `Ok(false)` with no write when already verified.
    fn verify_with_bonus(
        &self,
        id: &str,
        bonus: &dyn Fn(&UserProgression) -> UserProgression,
    ) -> Result<bool, StoreError>;

    fn record_game_result(&self, record: &GameResultRecord) -> Result<(), StoreError>;

    /// Atomic referral grant. `Ok(false)` when the code is unknown, the
    /// member referred themselves, or the new member was already referred.
    fn process_referral_bonus(&self, referral_code: &str, new_user_id: &str) -> Result<bool, StoreError>;

    fn top_players(&self, kind: LeaderboardKind, limit: usize) -> Result<Vec<UserProfile>, StoreError>;
}
