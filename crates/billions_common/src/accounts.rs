//! Account creation.
//!
//! Identity (passwords, sessions, tokens) belongs to the external identity
//! provider. This module only creates the member record that gameplay hangs off.

use crate::error::StoreError;
use crate::referral::{generate_referral_code, grant_referral_bonus, normalize_referral_code, starting_points};
use crate::store::{AvatarType, NewUser, UserProfile, UserStore};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Extra attempts when two sign-ups land on the same millisecond referral code
const MAX_CODE_RETRIES: i64 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub avatar_type: AvatarType,
    #[serde(default)]
    pub referral_code: Option<String>,
}

/// Create a member record, then try the referral bonus.
///
/// The record is written once with its final starting points. A failed
/// referral grant is logged and does not fail the sign-up.
pub fn sign_up(store: &dyn UserStore, request: &SignUpRequest) -> Result<UserProfile, StoreError> {
    let referral = normalize_referral_code(request.referral_code.as_deref());
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();

    let mut attempt = 0;
    let profile = loop {
        let new_user = NewUser {
            id: id.clone(),
            email: request.email.trim().to_string(),
            username: request.username.trim().to_string(),
            avatar_type: request.avatar_type,
            referral_code: generate_referral_code(now + Duration::milliseconds(attempt)),
            starting_points: starting_points(request.referral_code.as_deref()),
            created_at: now,
        };

        match store.create_user(&new_user) {
            Ok(profile) => break profile,
            Err(StoreError::Conflict(msg)) if msg.contains("referral_code") && attempt < MAX_CODE_RETRIES => {
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    };

    info!(
        "Member {} signed up ({} starting points)",
        profile.id, profile.progression.points
    );

    if let Some(code) = referral {
        if grant_referral_bonus(store, code, &profile.id) {
            return Ok(store.get_user(&profile.id).unwrap_or(profile));
        }
    }

    Ok(profile)
}
