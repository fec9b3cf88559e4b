//! API routes for billionsd
//!
//! Handlers stay thin: they validate the body, call into billions_common and
//! shape the JSON reply. All progression math lives in the common crate.

use crate::error::ApiError;
use crate::server::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    routing::{get, post},
    Json, Router,
};
use billions_common::leaderboard::{self, clamp_limit, LeaderboardEntry, LeaderboardKind};
use billions_common::progression::{match_count, roll_reels, spin_reward, SpinMatch, Toy};
use billions_common::{
    apply_game_result, check_message_content, evaluate_verification, rank_title,
    record_verification, sanitize_message, sign_up, GameResultRecord, LevelInfo, ProfileUpdate,
    SignUpRequest, UserProfile, UserProgression, VerificationAnswer, VerificationStatus,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

type AppStateArc = Arc<AppState>;

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

// ============================================================================
// Health
// ============================================================================

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/health", get(health))
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

async fn health(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

// ============================================================================
// Sign-up
// ============================================================================

pub fn auth_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/auth/signup", post(signup))
}

#[derive(Debug, Serialize)]
pub struct SignUpResponse {
    pub user: UserProfile,
}

async fn signup(
    State(state): State<AppStateArc>,
    body: Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<Json<SignUpResponse>, ApiError> {
    let Json(req) = body?;
    if req.email.trim().is_empty() || req.username.trim().is_empty() {
        return Err(ApiError::missing_fields());
    }

    let user = sign_up(state.store.as_ref(), &req)?;
    info!("  Signed up {} ({})", user.username, user.id);
    Ok(Json(SignUpResponse { user }))
}

// ============================================================================
// Profiles
// ============================================================================

pub fn user_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/v1/users/:id", get(get_user))
        .route("/v1/users/:id/profile", post(update_profile))
}

/// Profile plus the display-side level curve
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub level_info: LevelInfo,
    pub rank_title: &'static str,
}

impl From<UserProfile> for UserView {
    fn from(profile: UserProfile) -> Self {
        let total_exp = u64::try_from(profile.progression.total_exp).unwrap_or(0);
        Self {
            level_info: LevelInfo::from_total_exp(total_exp),
            rank_title: rank_title(profile.progression.level.value()),
            profile,
        }
    }
}

async fn get_user(
    State(state): State<AppStateArc>,
    Path(id): Path<String>,
) -> Result<Json<UserView>, ApiError> {
    let profile = state.store.get_user(&id)?;
    Ok(Json(profile.into()))
}

async fn update_profile(
    State(state): State<AppStateArc>,
    Path(id): Path<String>,
    body: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<UserView>, ApiError> {
    let Json(update) = body?;
    if let Some(username) = &update.username {
        if username.trim().is_empty() {
            return Err(ApiError::Validation("Username cannot be empty".to_string()));
        }
    }

    let profile = state.store.update_profile(&id, &update)?;
    Ok(Json(profile.into()))
}

// ============================================================================
// Games
// ============================================================================

pub fn game_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/v1/games/submit-score", post(submit_score))
        .route("/v1/games/spin", post(spin))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitScoreRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub game_id: Option<String>,
    #[serde(default)]
    pub points: Option<i64>,
    #[serde(default)]
    pub experience: Option<i64>,
    /// Free-form game outcome, logged as text. An explicit `null` counts as present.
    #[serde(default, deserialize_with = "present")]
    pub result: Option<serde_json::Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResponse {
    pub new_points: i64,
    pub new_level: u8,
    pub new_experience: i64,
    pub new_total_exp: i64,
}

impl From<&UserProgression> for ScoreResponse {
    fn from(p: &UserProgression) -> Self {
        Self {
            new_points: p.points,
            new_level: p.level.value(),
            new_experience: p.experience,
            new_total_exp: p.total_exp,
        }
    }
}

fn result_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Load, apply, persist, then log the result row. A failed log write is not fatal.
fn settle_game(
    state: &AppState,
    user_id: &str,
    game_id: &str,
    points: i64,
    experience: i64,
    result: String,
) -> Result<UserProgression, ApiError> {
    let current = state.store.get_progression(user_id)?;
    let outcome = apply_game_result(&current, points, experience);
    state.store.update_progression(user_id, &outcome.progression)?;

    if outcome.leveled_up() {
        info!(
            "  {} reached level {} (+{})",
            user_id,
            outcome.progression.level,
            outcome.levels_gained
        );
    }

    let record = GameResultRecord {
        user_id: user_id.to_string(),
        game_id: game_id.to_string(),
        points_earned: points,
        exp_earned: experience,
        result,
    };
    if let Err(e) = state.store.record_game_result(&record) {
        warn!("  Failed to log game result for {}: {}", user_id, e);
    }

    Ok(outcome.progression)
}

async fn submit_score(
    State(state): State<AppStateArc>,
    body: Result<Json<SubmitScoreRequest>, JsonRejection>,
) -> Result<Json<ScoreResponse>, ApiError> {
    let Json(req) = body?;
    let (Some(user_id), Some(game_id), Some(result)) =
        (non_empty(&req.user_id), non_empty(&req.game_id), req.result.as_ref())
    else {
        return Err(ApiError::missing_fields());
    };

    let progression = settle_game(
        &state,
        user_id,
        game_id,
        req.points.unwrap_or(0),
        req.experience.unwrap_or(0),
        result_text(result),
    )?;
    Ok(Json(ScoreResponse::from(&progression)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpinRequest {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpinResponse {
    pub reels: Vec<String>,
    pub match_count: usize,
    pub outcome: String,
    pub points_delta: i64,
    pub experience_delta: i64,
    #[serde(flatten)]
    pub score: ScoreResponse,
}

async fn spin(
    State(state): State<AppStateArc>,
    body: Result<Json<SpinRequest>, JsonRejection>,
) -> Result<Json<SpinResponse>, ApiError> {
    let Json(req) = body?;
    let user_id = non_empty(&req.user_id).ok_or_else(ApiError::missing_fields)?;

    let reels: [Toy; 3] = {
        let mut rng = rand::thread_rng();
        roll_reels(&mut rng)
    };
    let count = match_count(&reels);
    let outcome = SpinMatch::from_count(count);
    let reward = spin_reward(outcome);

    let progression = settle_game(
        &state,
        user_id,
        "spin",
        reward.points,
        reward.experience,
        outcome.as_str().to_string(),
    )?;

    Ok(Json(SpinResponse {
        reels: reels.iter().map(|t| t.name().to_string()).collect(),
        match_count: count,
        outcome: outcome.as_str().to_string(),
        points_delta: reward.points,
        experience_delta: reward.experience,
        score: ScoreResponse::from(&progression),
    }))
}

// ============================================================================
// Verification
// ============================================================================

pub fn verification_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/verification/submit", post(submit_verification))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub answers: Vec<VerificationAnswer>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerificationResponse {
    pub verified: bool,
    pub status: VerificationStatus,
    pub score: f64,
}

async fn submit_verification(
    State(state): State<AppStateArc>,
    body: Result<Json<VerificationRequest>, JsonRejection>,
) -> Result<Json<VerificationResponse>, ApiError> {
    let Json(req) = body?;
    let user_id = non_empty(&req.user_id).ok_or_else(ApiError::missing_fields)?;
    if req.answers.is_empty() {
        return Err(ApiError::missing_fields());
    }

    let result = evaluate_verification(&req.answers);
    let bonus_granted = record_verification(state.store.as_ref(), user_id, &result)?;
    if bonus_granted {
        info!("  {} verified ({:.1}%)", user_id, result.score_percent);
    } else if !result.verified {
        info!("  {} failed verification ({:.1}%)", user_id, result.score_percent);
    }

    Ok(Json(VerificationResponse {
        verified: result.verified,
        status: result.status,
        score: result.score_percent,
    }))
}

// ============================================================================
// Referral
// ============================================================================

pub fn referral_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/referral/process-bonus", post(process_bonus))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralRequest {
    #[serde(default)]
    pub referral_code: Option<String>,
    #[serde(default)]
    pub new_user_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReferralResponse {
    pub success: bool,
}

async fn process_bonus(
    State(state): State<AppStateArc>,
    body: Result<Json<ReferralRequest>, JsonRejection>,
) -> Result<Json<ReferralResponse>, ApiError> {
    let Json(req) = body?;
    let (Some(code), Some(new_user_id)) = (non_empty(&req.referral_code), non_empty(&req.new_user_id))
    else {
        return Err(ApiError::Validation(
            "Missing referral code or user ID".to_string(),
        ));
    };

    let success = state.store.process_referral_bonus(code, new_user_id)?;
    if success {
        info!("  Referral {} credited for {}", code, new_user_id);
    }
    Ok(Json(ReferralResponse { success }))
}

// ============================================================================
// Leaderboard
// ============================================================================

pub fn leaderboard_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/leaderboard", get(get_leaderboard))
}

#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub limit: Option<usize>,
}

async fn get_leaderboard(
    State(state): State<AppStateArc>,
    query: Result<Query<LeaderboardQuery>, QueryRejection>,
) -> Result<Json<Vec<LeaderboardEntry>>, ApiError> {
    let Query(query) = query?;
    let kind = LeaderboardKind::parse(query.kind.as_deref());
    let limits = &state.config.leaderboard;
    let limit = clamp_limit(query.limit, limits.default_limit, limits.max_limit);

    let rows = leaderboard::top_players(state.store.as_ref(), kind, limit)?;
    Ok(Json(rows))
}

// ============================================================================
// Community
// ============================================================================

pub fn community_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/community/moderate", post(moderate))
}

#[derive(Debug, Deserialize)]
pub struct ModerateRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerateResponse {
    pub is_clean: bool,
    pub violations: Vec<String>,
    pub sanitized: String,
}

async fn moderate(
    body: Result<Json<ModerateRequest>, JsonRejection>,
) -> Result<Json<ModerateResponse>, ApiError> {
    let Json(req) = body?;
    let message = req.message.ok_or_else(ApiError::missing_fields)?;

    let report = check_message_content(&message);
    Ok(Json(ModerateResponse {
        is_clean: report.is_clean,
        violations: report.violations.iter().map(|v| v.to_string()).collect(),
        sanitized: sanitize_message(&message),
    }))
}
