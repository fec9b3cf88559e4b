//! Property-style tests for the leveling engine and score transaction.
//!
//! Randomized inputs come from a small xorshift generator so runs are
//! reproducible without extra dependencies.
//!
//! ## Invariants Tested
//!
//! - Points never go negative
//! - Per-level experience stays within [0, 1000) below max level, 0 at max
//! - Level stays within [1, 20] and never drops
//! - Lifetime experience never goes negative and never drops on awards
//! - Display level is monotonic in lifetime experience

use billions_common::progression::{
    apply_experience, apply_game_result, apply_points, exp_for_level, level_info_from_total_exp,
    Level, UserProgression, LEVEL_UP_EXPERIENCE, MAX_LEVEL,
};

// ============================================================================
// TEST HELPERS
// ============================================================================

struct TestRng {
    state: u64,
}

impl TestRng {
    fn new(seed: u64) -> Self {
        Self { state: if seed == 0 { 1 } else { seed } }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Uniform-ish integer in [min, max)
    fn next_range(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        min + (self.next_u64() % (max - min) as u64) as i64
    }
}

fn random_progression(rng: &mut TestRng) -> UserProgression {
    let level = Level::new(rng.next_range(1, i64::from(MAX_LEVEL) + 1) as u8);
    let experience = if level.is_max() {
        0
    } else {
        rng.next_range(0, LEVEL_UP_EXPERIENCE)
    };
    UserProgression {
        points: rng.next_range(0, 50_000),
        experience,
        total_exp: experience + rng.next_range(0, 100_000),
        level,
    }
}

fn assert_valid(p: &UserProgression) {
    assert!(p.points >= 0, "negative points: {:?}", p);
    assert!(p.total_exp >= 0, "negative total exp: {:?}", p);
    assert!(p.level.value() >= 1 && p.level.value() <= MAX_LEVEL, "{:?}", p);
    if p.level.is_max() {
        assert_eq!(p.experience, 0, "experience not pinned at max: {:?}", p);
    } else {
        assert!(p.experience >= 0 && p.experience < LEVEL_UP_EXPERIENCE, "{:?}", p);
    }
}

// ============================================================================
// PROPERTIES
// ============================================================================

#[test]
fn prop_random_events_keep_state_valid() {
    let mut rng = TestRng::new(0xB111_0115);

    for _ in 0..200 {
        let mut user = random_progression(&mut rng);
        for _ in 0..50 {
            let points = rng.next_range(-500, 500);
            let experience = rng.next_range(-300, 3_000);
            let before = user;

            user = apply_game_result(&user, points, experience).progression;

            assert_valid(&user);
            assert!(user.level >= before.level, "level dropped");
        }
    }
}

#[test]
fn prop_awards_never_reduce_total_exp() {
    let mut rng = TestRng::new(42);

    for _ in 0..1_000 {
        let user = random_progression(&mut rng);
        let award = rng.next_range(0, 10_000);
        let outcome = apply_experience(&user, award);
        assert!(outcome.progression.total_exp >= user.total_exp);
        assert!(outcome.adjusted_amount <= award);
    }
}

#[test]
fn prop_zero_experience_is_identity() {
    let mut rng = TestRng::new(7);

    for _ in 0..1_000 {
        let user = random_progression(&mut rng);
        assert_eq!(apply_experience(&user, 0).progression, user);
    }
}

#[test]
fn prop_points_floor_at_zero() {
    let mut rng = TestRng::new(99);

    for _ in 0..1_000 {
        let user = random_progression(&mut rng);
        let delta = rng.next_range(-100_000, 100_000);
        let updated = apply_points(&user, delta);
        assert_eq!(updated.points, (user.points + delta).max(0));
    }
}

#[test]
fn prop_display_level_monotonic() {
    let mut rng = TestRng::new(12345);
    let cap = exp_for_level(MAX_LEVEL) as i64 * 2;

    let mut samples: Vec<u64> = (0..2_000).map(|_| rng.next_range(0, cap) as u64).collect();
    samples.sort_unstable();

    let mut previous = Level::MIN;
    for total in samples {
        let info = level_info_from_total_exp(total);
        assert!(info.level >= previous, "display level dropped at {}", total);
        if info.level.is_max() {
            assert_eq!(info.exp_percentage, 100.0);
            assert_eq!(info.exp_to_next_level, 0);
        } else {
            assert!(info.exp_percentage < 100.0);
            assert_eq!(info.current_exp + info.exp_to_next_level, info.level.threshold());
        }
        previous = info.level;
    }
}

#[test]
fn prop_max_level_is_absorbing() {
    let mut rng = TestRng::new(2024);
    let mut user = UserProgression {
        level: Level::MAX,
        ..UserProgression::new(100)
    };

    for _ in 0..500 {
        user = apply_game_result(&user, rng.next_range(-50, 50), rng.next_range(-100, 5_000)).progression;
        assert_eq!(user.level, Level::MAX);
        assert_eq!(user.experience, 0);
    }
}
