// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Dopamine Rewards Engine - Dice Roll

use rand::Rng;
use serde::{Deserialize, Serialize};

pub const DIE_FACES: u8 = 6;
/// Rolls at or above this unlock the reward flow.
pub const SUCCESS_THRESHOLD: u8 = 4;
pub const ROLL_DURATION_MS: u64 = 1500;
pub const REWARD_REVEAL_DELAY_MS: u64 = 1000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiceRoll {
    pub value: u8,
}

impl DiceRoll {
    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self { value: rng.gen_range(1..=DIE_FACES) }
    }

    pub fn is_success(&self) -> bool {
        self.value >= SUCCESS_THRESHOLD
    }

    pub fn message(&self) -> String {
        if self.is_success() {
            format!("Success! You rolled a {} 🎉", self.value)
        } else {
            format!("Keep trying! You rolled a {} 💪", self.value)
        }
    }
}
