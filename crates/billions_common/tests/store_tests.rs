//! Tests for the SQLite user store, leaderboard and verification flow.

use billions_common::leaderboard::{top_players, LeaderboardKind};
use billions_common::progression::{apply_game_result, Level, UserProgression};
use billions_common::verification::{evaluate_verification, record_verification};
use billions_common::{
    sign_up, AvatarType, ProfileUpdate, SignUpRequest, SqliteUserStore, StoreError, UserStore,
    VerificationAnswer, VerificationStatus,
};
use tempfile::TempDir;

fn join(store: &dyn UserStore, name: &str) -> String {
    sign_up(
        store,
        &SignUpRequest {
            email: format!("{}@example.com", name),
            username: name.to_string(),
            avatar_type: AvatarType::Penguin,
            referral_code: None,
        },
    )
    .unwrap()
    .id
}

#[test]
fn test_store_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("billions.db");

    let id = {
        let store = SqliteUserStore::open(&path).unwrap();
        assert_eq!(store.db_path(), Some(path.as_path()));
        let id = join(&store, "persisted");
        let outcome = apply_game_result(&store.get_progression(&id).unwrap(), 50, 1_200);
        store.update_progression(&id, &outcome.progression).unwrap();
        id
    };

    let store = SqliteUserStore::open(&path).unwrap();
    let progression = store.get_progression(&id).unwrap();
    assert_eq!(progression.points, 1050);
    assert_eq!(progression.level.value(), 2);
    assert_eq!(progression.experience, 200);
    assert_eq!(progression.total_exp, 1_200);
}

#[test]
fn test_profile_update_only_touches_given_fields() {
    let store = SqliteUserStore::open_in_memory().unwrap();
    let id = join(&store, "painter");

    let updated = store
        .update_profile(
            &id,
            &ProfileUpdate {
                profile_picture_url: Some("https://cdn.example/p.png".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(updated.username, "painter");
    assert_eq!(updated.avatar_type, AvatarType::Penguin);
    assert_eq!(updated.profile_picture_url.as_deref(), Some("https://cdn.example/p.png"));

    let updated = store
        .update_profile(
            &id,
            &ProfileUpdate {
                avatar_type: Some(AvatarType::Rabbit),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.avatar_type, AvatarType::Rabbit);
    assert!(updated.profile_picture_url.is_some());
}

#[test]
fn test_update_profile_unknown_user() {
    let store = SqliteUserStore::open_in_memory().unwrap();
    let err = store
        .update_profile("nobody", &ProfileUpdate::default())
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[test]
fn test_verification_bonus_written_with_status() {
    let store = SqliteUserStore::open_in_memory().unwrap();
    let id = join(&store, "human");

    let answers = vec![VerificationAnswer { is_correct: true }; 5];
    let result = evaluate_verification(&answers);
    assert!(result.verified);
    assert!(record_verification(&store, &id, &result).unwrap());

    let profile = store.get_user(&id).unwrap();
    assert!(profile.is_verified);
    assert_eq!(profile.verification_status, VerificationStatus::Verified);
    assert_eq!(profile.progression.points, 1500);
    assert_eq!(profile.progression.experience, 500);

    // Passing again is recorded but pays nothing
    assert!(!record_verification(&store, &id, &result).unwrap());
    assert_eq!(store.get_progression(&id).unwrap().points, 1500);
}

#[test]
fn test_verification_bonus_applies_to_latest_progression() {
    let store = SqliteUserStore::open_in_memory().unwrap();
    let id = join(&store, "racer");
    let result = evaluate_verification(&[VerificationAnswer { is_correct: true }]);

    // A score lands after the attempt was scored but before it is recorded
    let scored = apply_game_result(&store.get_progression(&id).unwrap(), 1_000, 0);
    store.update_progression(&id, &scored.progression).unwrap();

    assert!(record_verification(&store, &id, &result).unwrap());
    let progression = store.get_progression(&id).unwrap();
    assert_eq!(progression.points, 2_500);
    assert_eq!(progression.experience, 500);
}

#[test]
fn test_failed_verification_writes_pending() {
    let store = SqliteUserStore::open_in_memory().unwrap();
    let id = join(&store, "bot");
    let result = evaluate_verification(&[
        VerificationAnswer { is_correct: false },
        VerificationAnswer { is_correct: true },
    ]);

    assert!(!record_verification(&store, &id, &result).unwrap());
    let profile = store.get_user(&id).unwrap();
    assert_eq!(profile.verification_status, VerificationStatus::Pending);
    assert_eq!(profile.progression.points, 1000);

    let missing = record_verification(&store, "nobody", &result).unwrap_err();
    assert!(matches!(missing, StoreError::NotFound(_)));
}

#[test]
fn test_leaderboard_orders() {
    let store = SqliteUserStore::open_in_memory().unwrap();
    let low = join(&store, "low");
    let high = join(&store, "high");
    let mid = join(&store, "mid");

    let set = |id: &str, points: i64, level: u8, total_exp: i64| {
        store
            .update_progression(
                id,
                &UserProgression {
                    points,
                    experience: 0,
                    total_exp,
                    level: Level::new(level),
                },
            )
            .unwrap();
    };
    set(&low, 10, 9, 9_000);
    set(&high, 9_000, 2, 1_500);
    set(&mid, 500, 9, 9_500);

    let by_points = top_players(&store, LeaderboardKind::Points, 10).unwrap();
    let names: Vec<_> = by_points.iter().map(|e| e.username.as_str()).collect();
    assert_eq!(names, vec!["high", "mid", "low"]);
    assert_eq!(by_points.iter().map(|e| e.rank).collect::<Vec<_>>(), vec![1, 2, 3]);

    let by_level = top_players(&store, LeaderboardKind::Level, 10).unwrap();
    let names: Vec<_> = by_level.iter().map(|e| e.username.as_str()).collect();
    assert_eq!(names, vec!["mid", "low", "high"]);

    let limited = top_players(&store, LeaderboardKind::Points, 2).unwrap();
    assert_eq!(limited.len(), 2);
}

#[test]
fn test_referral_leaderboard() {
    let store = SqliteUserStore::open_in_memory().unwrap();
    let star = join(&store, "star");
    let star_code = store.get_user(&star).unwrap().referral_code;
    join(&store, "quiet");

    for name in ["f1", "f2"] {
        sign_up(
            &store,
            &SignUpRequest {
                email: format!("{}@example.com", name),
                username: name.to_string(),
                avatar_type: AvatarType::Rabbit,
                referral_code: Some(star_code.clone()),
            },
        )
        .unwrap();
    }

    let board = top_players(&store, LeaderboardKind::Referrals, 1).unwrap();
    assert_eq!(board[0].username, "star");
    assert_eq!(board[0].referral_count, 2);
    assert_eq!(board[0].rank, 1);
}
