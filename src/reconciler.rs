// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Dopamine Rewards Engine - Outcome Reconciliation
//
// Maps a final track position back to the item under the pointer.
//
// Alignment convention (centered): item `i` sits at travel
//
//     (R·N + i)·E + E/2
//
// i.e. the pointer lands on the midpoint of the item's segment. Resolution
// takes the Euclidean remainder modulo N·E and buckets by E, so the half-unit
// margin absorbs floating-point error and `resolve_index` is an exact left
// inverse of `target_position` for any revolution count.

use crate::error::{ConfigError, RewardError};
use crate::sequencer::{SpinConfig, SpinDirection};

/// Travel distance that parks item `index` under the pointer after
/// `revolutions` full cycles of `item_count` items of size `item_extent`.
pub fn target_position(index: usize, revolutions: u32, item_extent: f64, item_count: usize) -> f64 {
    let slots = revolutions as u64 * item_count as u64 + index as u64;
    slots as f64 * item_extent + item_extent / 2.0
}

/// Index of the item under the pointer for a travel distance. Negative
/// positions wrap around the cycle.
pub fn resolve_index(final_position: f64, item_extent: f64, item_count: usize) -> Result<usize, RewardError> {
    if item_count == 0 {
        return Err(ConfigError::EmptyCandidates.into());
    }
    if !(item_extent.is_finite() && item_extent > 0.0) {
        return Err(ConfigError::InvalidSpin("item extent must be positive").into());
    }
    if !final_position.is_finite() {
        return Err(ConfigError::InvalidSpin("position must be finite").into());
    }

    let cycle = item_count as f64 * item_extent;
    let normalized = final_position.rem_euclid(cycle);
    let bucket = (normalized / item_extent).floor() as usize;
    Ok(bucket.min(item_count - 1))
}

/// Resolver bound to one spin configuration: accounts for the rendering
/// offset and travel direction before bucketing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutcomeReconciler {
    pub item_extent: f64,
    pub item_count: usize,
    pub initial_offset: f64,
    pub direction: SpinDirection,
}

impl OutcomeReconciler {
    pub fn new(config: &SpinConfig) -> Self {
        Self {
            item_extent: config.item_extent,
            item_count: config.item_count,
            initial_offset: config.initial_offset,
            direction: config.direction,
        }
    }

    /// Rendered (host-facing) position for a travel distance.
    pub fn rendered(&self, travel: f64) -> f64 {
        self.initial_offset + self.direction.sign() * travel
    }

    /// Undo [`rendered`](Self::rendered).
    pub fn travel(&self, rendered: f64) -> f64 {
        (rendered - self.initial_offset) * self.direction.sign()
    }

    pub fn resolve(&self, rendered: f64) -> Result<usize, RewardError> {
        resolve_index(self.travel(rendered), self.item_extent, self.item_count)
    }

    pub fn target(&self, index: usize, revolutions: u32) -> f64 {
        target_position(index, revolutions, self.item_extent, self.item_count)
    }
}
