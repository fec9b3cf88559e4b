//! Human verification quiz scoring.
//!
//! A member passes with at least 80% correct answers. Passing grants a flat
//! +500 points / +500 experience bonus through the normal score transaction.

use crate::error::{ParseVariantError, StoreError};
use crate::progression::{apply_game_result, ExperienceOutcome, UserProgression, EXPERIENCE_REWARDS};
use crate::store::UserStore;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Minimum share of correct answers, in percent
pub const PASS_THRESHOLD_PERCENT: u64 = 80;

pub const VERIFICATION_BONUS_POINTS: i64 = 500;

/// Verification lifecycle of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    Pending,
    UnderReview,
    Verified,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::UnderReview => "under_review",
            VerificationStatus::Verified => "verified",
        }
    }

    pub fn is_verified(&self) -> bool {
        *self == VerificationStatus::Verified
    }
}

impl FromStr for VerificationStatus {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(VerificationStatus::Pending),
            "under_review" => Ok(VerificationStatus::UnderReview),
            "verified" => Ok(VerificationStatus::Verified),
            other => Err(ParseVariantError::new("verification status", other)),
        }
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One submitted quiz answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationAnswer {
    pub is_correct: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub verified: bool,
    pub status: VerificationStatus,
    pub score_percent: f64,
}

/// Score a verification attempt. An empty attempt scores 0 and stays pending.
pub fn evaluate_verification(answers: &[VerificationAnswer]) -> VerificationResult {
    let total = answers.len() as u64;
    if total == 0 {
        return VerificationResult {
            verified: false,
            status: VerificationStatus::Pending,
            score_percent: 0.0,
        };
    }

    let correct = answers.iter().filter(|a| a.is_correct).count() as u64;
    // Integer comparison keeps exactly 80% a pass regardless of float rounding
    let passed = correct * 100 >= total * PASS_THRESHOLD_PERCENT;

    VerificationResult {
        verified: passed,
        status: if passed {
            VerificationStatus::Verified
        } else {
            VerificationStatus::Pending
        },
        score_percent: correct as f64 * 100.0 / total as f64,
    }
}

/// Apply the pass bonus to a member's progression
pub fn apply_verification_bonus(user: &UserProgression) -> ExperienceOutcome {
    apply_game_result(
        user,
        VERIFICATION_BONUS_POINTS,
        EXPERIENCE_REWARDS.verification_complete,
    )
}

/// Persist an evaluated attempt. A pass marks the member verified and grants
/// the bonus atomically, once; a fail writes `pending`. Returns whether the
/// bonus was granted.
pub fn record_verification(
    store: &dyn UserStore,
    user_id: &str,
    result: &VerificationResult,
) -> Result<bool, StoreError> {
    if result.verified {
        store.verify_with_bonus(user_id, &|current| apply_verification_bonus(current).progression)
    } else {
        store.set_verification(user_id, VerificationStatus::Pending)?;
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::Level;
    use approx::assert_relative_eq;

    fn answers(correct: usize, wrong: usize) -> Vec<VerificationAnswer> {
        let mut out = vec![VerificationAnswer { is_correct: true }; correct];
        out.extend(vec![VerificationAnswer { is_correct: false }; wrong]);
        out
    }

    #[test]
    fn test_exactly_eighty_passes() {
        let result = evaluate_verification(&answers(8, 2));
        assert!(result.verified);
        assert_eq!(result.status, VerificationStatus::Verified);
        assert_relative_eq!(result.score_percent, 80.0);
    }

    #[test]
    fn test_just_below_eighty_fails() {
        let result = evaluate_verification(&answers(799, 201));
        assert!(!result.verified);
        assert_eq!(result.status, VerificationStatus::Pending);
        assert!(result.score_percent < 80.0);
    }

    #[test]
    fn test_order_does_not_matter() {
        let mut mixed = answers(4, 1);
        mixed.rotate_left(2);
        assert!(evaluate_verification(&mixed).verified);
    }

    #[test]
    fn test_empty_attempt_is_pending() {
        let result = evaluate_verification(&[]);
        assert!(!result.verified);
        assert_eq!(result.score_percent, 0.0);
    }

    #[test]
    fn test_perfect_and_zero() {
        assert_relative_eq!(evaluate_verification(&answers(5, 0)).score_percent, 100.0);
        assert_relative_eq!(evaluate_verification(&answers(0, 5)).score_percent, 0.0);
    }

    #[test]
    fn test_status_round_trip_strings() {
        for status in [
            VerificationStatus::Pending,
            VerificationStatus::UnderReview,
            VerificationStatus::Verified,
        ] {
            assert_eq!(status.as_str().parse::<VerificationStatus>().unwrap(), status);
        }
        assert!("approved".parse::<VerificationStatus>().is_err());
    }

    #[test]
    fn test_bonus_goes_through_transaction() {
        let user = UserProgression::new(1000);
        let outcome = apply_verification_bonus(&user);
        assert_eq!(outcome.progression.points, 1500);
        assert_eq!(outcome.progression.experience, 500);
        assert_eq!(outcome.progression.total_exp, 500);
        assert_eq!(outcome.progression.level, Level::MIN);
    }

    #[test]
    fn test_bonus_is_level_adjusted() {
        let user = UserProgression {
            level: Level::new(2),
            ..UserProgression::new(0)
        };
        let outcome = apply_verification_bonus(&user);
        // 500 / 1.1 = 454.5...
        assert_eq!(outcome.progression.experience, 454);
        assert_eq!(outcome.progression.points, 500);
    }
}
