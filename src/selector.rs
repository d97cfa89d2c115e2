// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Dopamine Rewards Engine - Random Selection
//
// Picks one candidate out of a finite ordered sequence. Two policies exist:
// uniform (every index 1/N) and log-skewed (geometric falloff toward index 0,
// the amount spinner's historical behavior).

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SelectionPolicy {
    /// P(i) = 1/N.
    #[default]
    Uniform,
    /// P(i) = 2^-(i+1); the tail mass lands on the last index.
    LogSkewed,
}

pub struct WeightedRandomSelector<R: Rng> {
    rng: R,
    policy: SelectionPolicy,
}

impl<R: Rng> WeightedRandomSelector<R> {
    pub fn new(rng: R, policy: SelectionPolicy) -> Self {
        Self { rng, policy }
    }

    pub fn uniform(rng: R) -> Self {
        Self::new(rng, SelectionPolicy::Uniform)
    }

    /// Draw an index in `[0, len)`, or `None` when there is nothing to pick.
    pub fn pick_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let index = match self.policy {
            SelectionPolicy::Uniform => self.rng.gen_range(0..len),
            SelectionPolicy::LogSkewed => {
                let u: f64 = self.rng.gen();
                let k = (u.ln() / 0.5_f64.ln()).floor();
                if k.is_finite() && k >= 0.0 { (k as usize).min(len - 1) } else { len - 1 }
            }
        };
        Some(index)
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        self.pick_index(items.len()).map(|i| &items[i])
    }

    /// Uniform integer in `[lo, lo + span]`.
    pub fn draw_span(&mut self, lo: u32, span: u32) -> u32 {
        if span == 0 { lo } else { lo + self.rng.gen_range(0..=span) }
    }
}
