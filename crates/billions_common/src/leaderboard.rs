//! Read-only leaderboard ranking.

use crate::error::StoreError;
use crate::store::{UserProfile, UserStore};
use serde::{Deserialize, Serialize};

/// Which column a leaderboard is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardKind {
    #[default]
    Points,
    Referrals,
    Level,
}

impl LeaderboardKind {
    /// Unknown or missing types fall back to the points board
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("referrals") => LeaderboardKind::Referrals,
            Some("level") => LeaderboardKind::Level,
            _ => LeaderboardKind::Points,
        }
    }
}

/// One ranked row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub id: String,
    pub username: String,
    pub level: u8,
    pub points: i64,
    pub total_exp: i64,
    pub profile_picture_url: Option<String>,
    pub is_verified: bool,
    pub referral_count: i64,
    /// 1-based position
    pub rank: usize,
}

/// Attach 1-based ranks to players already in board order
pub fn rank_players(players: Vec<UserProfile>) -> Vec<LeaderboardEntry> {
    players
        .into_iter()
        .enumerate()
        .map(|(index, player)| LeaderboardEntry {
            id: player.id,
            username: player.username,
            level: player.progression.level.value(),
            points: player.progression.points,
            total_exp: player.progression.total_exp,
            profile_picture_url: player.profile_picture_url,
            is_verified: player.is_verified,
            referral_count: player.referral_count,
            rank: index + 1,
        })
        .collect()
}

/// Requested limit, or the default, clamped to `1..=max`
pub fn clamp_limit(requested: Option<usize>, default: usize, max: usize) -> usize {
    let max = max.max(1);
    requested.unwrap_or(default).clamp(1, max)
}

/// Fetch and rank the top players for a board
pub fn top_players(
    store: &dyn UserStore,
    kind: LeaderboardKind,
    limit: usize,
) -> Result<Vec<LeaderboardEntry>, StoreError> {
    Ok(rank_players(store.top_players(kind, limit)?))
}
