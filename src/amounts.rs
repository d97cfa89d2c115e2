// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Dopamine Rewards Engine - Amount Value Generator
//
// Produces the discrete amounts shown on the amount spinner. Values are spread
// evenly in log-space so small amounts get finer granularity than large ones.

use crate::error::{ConfigError, RewardError};

/// Number of spinner values requested from the generator per contribution type.
pub const AMOUNT_VALUE_COUNT: usize = 30;

/// Sample `count` points evenly in log-space between `min` and `max`, round
/// each to the nearest integer and collapse consecutive repeats.
///
/// The first element is forced to `min` and the last to `max`. A zero `min`
/// is treated as `1`. The result may be shorter than `count`.
pub fn generate_log_values(min: u32, max: u32, count: usize) -> Result<Vec<u32>, RewardError> {
    let min = min.max(1);
    if count < 2 {
        return Err(ConfigError::DegenerateRange { min, max, count }.into());
    }
    if max < min {
        return Err(ConfigError::InvalidRange { field: "amount", min, max }.into());
    }

    let min_log = (min as f64).ln();
    let max_log = (max as f64).ln();
    let step = (max_log - min_log) / (count - 1) as f64;

    let mut values: Vec<u32> = Vec::with_capacity(count);
    for i in 0..count {
        let value = (min_log + step * i as f64).exp().round() as u32;
        if values.last() != Some(&value) {
            values.push(value);
        }
    }

    if let Some(first) = values.first_mut() {
        *first = min;
    }
    if let Some(last) = values.last_mut() {
        *last = max;
    }
    Ok(values)
}
