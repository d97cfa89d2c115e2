// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Dopamine Rewards Engine - Easing Curves

use serde::{Deserialize, Serialize};

/// Timing curve mapping normalized phase progress `t ∈ [0, 1]` to normalized
/// distance covered. Every curve satisfies `apply(0) == 0` and `apply(1) == 1`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Easing {
    Linear,
    EaseInQuad,
    EaseInCubic,
    EaseOutQuad,
    EaseOutCubic,
    CircOut,
}

impl Easing {
    pub fn apply(&self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Self::Linear => t,
            Self::EaseInQuad => t * t,
            Self::EaseInCubic => t * t * t,
            Self::EaseOutQuad => t * (2.0 - t),
            Self::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Self::CircOut => (1.0 - (t - 1.0).powi(2)).sqrt(),
        }
    }
}
