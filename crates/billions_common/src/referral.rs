//! Referral program policy.
//!
//! A new member who signs up with any non-empty referral code starts at 1200
//! points instead of 1000 (an override, not an addition). The referrer's side
//! of the bonus runs as one atomic store procedure; if it fails the sign-up
//! still stands.

use crate::store::UserStore;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

pub const DEFAULT_STARTING_POINTS: i64 = 1000;
pub const REFERRAL_STARTING_POINTS: i64 = 1200;

/// Points added to the referrer when their code is redeemed
pub const REFERRER_BONUS_POINTS: i64 = 200;

pub const REFERRAL_CODE_PREFIX: &str = "REF_";

/// Trimmed code, or `None` when nothing usable was supplied
pub fn normalize_referral_code(code: Option<&str>) -> Option<&str> {
    code.map(str::trim).filter(|c| !c.is_empty())
}

/// Any non-empty code counts, even whitespace. Trimming only matters for the bonus lookup.
pub fn starting_points(referral_code: Option<&str>) -> i64 {
    if referral_code.is_some_and(|c| !c.is_empty()) {
        REFERRAL_STARTING_POINTS
    } else {
        DEFAULT_STARTING_POINTS
    }
}

/// `REF_` followed by the Unix time in milliseconds, uppercase base 36
pub fn generate_referral_code(now: DateTime<Utc>) -> String {
    let millis = now.timestamp_millis().max(0) as u64;
    format!("{}{}", REFERRAL_CODE_PREFIX, to_base36(millis))
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Run the referrer bonus procedure. Never fails the caller: store errors are
/// logged and reported as `false`.
pub fn grant_referral_bonus(store: &dyn UserStore, referral_code: &str, new_user_id: &str) -> bool {
    match store.process_referral_bonus(referral_code, new_user_id) {
        Ok(true) => {
            info!("Referral bonus granted for {} via {}", new_user_id, referral_code);
            true
        }
        Ok(false) => {
            info!("Referral code {} not applied for {}", referral_code, new_user_id);
            false
        }
        Err(e) => {
            warn!("Referral bonus failed for {}: {}", new_user_id, e);
            false
        }
    }
}
