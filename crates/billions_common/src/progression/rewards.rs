//! Reward tables for mini-games and community activity.
//!
//! Every game turns its result into a raw (points, experience) pair here;
//! the transaction module decides what that pair does to a member.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Experience granted per activity kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExperienceRewards {
    pub game_win: i64,
    pub game_loss: i64,
    pub community_post: i64,
    pub community_like: i64,
    pub verification_complete: i64,
    pub daily_login: i64,
}

pub const EXPERIENCE_REWARDS: ExperienceRewards = ExperienceRewards {
    game_win: 100,
    game_loss: 25,
    community_post: 10,
    community_like: 5,
    verification_complete: 500,
    daily_login: 50,
};

/// Raw deltas produced by one game event, before any level adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardDelta {
    pub points: i64,
    pub experience: i64,
}

impl RewardDelta {
    pub const fn new(points: i64, experience: i64) -> Self {
        Self { points, experience }
    }
}

// ============================================================================
// Spin
// ============================================================================

/// Toys on the spin reels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Toy {
    LadybugFriend,
    PizzaLover,
    Angel,
}

impl Toy {
    pub const ALL: [Toy; 3] = [Toy::LadybugFriend, Toy::PizzaLover, Toy::Angel];

    pub fn name(&self) -> &'static str {
        match self {
            Toy::LadybugFriend => "Ladybug Friend",
            Toy::PizzaLover => "Pizza Lover",
            Toy::Angel => "Angel",
        }
    }
}

/// How well a spin matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpinMatch {
    Perfect,
    Good,
    NoMatch,
}

impl SpinMatch {
    pub fn from_count(count: usize) -> Self {
        match count {
            3 => SpinMatch::Perfect,
            2 => SpinMatch::Good,
            _ => SpinMatch::NoMatch,
        }
    }

    /// Label written to the game results log
    pub fn as_str(&self) -> &'static str {
        match self {
            SpinMatch::Perfect => "perfect_match",
            SpinMatch::Good => "good_match",
            SpinMatch::NoMatch => "no_match",
        }
    }
}

/// Draw three reels
pub fn roll_reels<R: Rng + ?Sized>(rng: &mut R) -> [Toy; 3] {
    [
        Toy::ALL[rng.gen_range(0..Toy::ALL.len())],
        Toy::ALL[rng.gen_range(0..Toy::ALL.len())],
        Toy::ALL[rng.gen_range(0..Toy::ALL.len())],
    ]
}

/// Number of reels showing the same toy as the first reel
pub fn match_count(reels: &[Toy; 3]) -> usize {
    reels.iter().filter(|toy| **toy == reels[0]).count()
}

pub fn spin_reward(spin: SpinMatch) -> RewardDelta {
    match spin {
        SpinMatch::Perfect => RewardDelta::new(100, 50),
        SpinMatch::Good => RewardDelta::new(50, 25),
        SpinMatch::NoMatch => RewardDelta::new(-10, 5),
    }
}

// ============================================================================
// Quiz / Impostor
// ============================================================================

/// Correct answers pay the question reward plus half of it as experience;
/// wrong answers still earn a little experience.
pub fn quiz_reward(correct: bool, question_reward: i64) -> RewardDelta {
    if correct {
        RewardDelta::new(question_reward, question_reward.div_euclid(2))
    } else {
        RewardDelta::new(0, 5)
    }
}

/// Round score for the impostor game. Stays local to the game screen.
pub fn impostor_round_score(guessed_impostor: bool) -> i64 {
    if guessed_impostor {
        100
    } else {
        0
    }
}
