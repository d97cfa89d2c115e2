// Simulation Report Types
// Structured output for selection fairness and ledger consistency checks

use serde::Serialize;

// ─── Statistics (per-metric Monte Carlo aggregation) ────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub mean: f64,
    pub std_dev: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub min: f64,
    pub max: f64,
    pub n: usize,
}

impl Stats {
    pub fn from_samples(samples: &[f64]) -> Self {
        let n = samples.len();
        if n == 0 {
            return Self { mean: 0.0, std_dev: 0.0, ci_lower: 0.0, ci_upper: 0.0, min: 0.0, max: 0.0, n: 0 };
        }
        let mean = samples.iter().sum::<f64>() / n as f64;
        let variance = if n > 1 {
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };
        let std_dev = variance.sqrt();
        let stderr = std_dev / (n as f64).sqrt();
        let z = 1.96; // 95% CI
        Self {
            mean,
            std_dev,
            ci_lower: mean - z * stderr,
            ci_upper: mean + z * stderr,
            min: samples.iter().cloned().fold(f64::INFINITY, f64::min),
            max: samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            n,
        }
    }
}

/// Pearson's statistic of `observed` counts against a uniform expectation.
pub fn chi_square_uniform(observed: &[u64]) -> f64 {
    let total: u64 = observed.iter().sum();
    if observed.is_empty() || total == 0 {
        return 0.0;
    }
    let expected = total as f64 / observed.len() as f64;
    observed
        .iter()
        .map(|&o| (o as f64 - expected).powi(2) / expected)
        .sum()
}

/// Upper 0.1% critical value of χ² with `dof` degrees of freedom
/// (Wilson–Hilferty approximation).
pub fn chi_square_critical(dof: usize) -> f64 {
    if dof == 0 {
        return 0.0;
    }
    let k = dof as f64;
    let z = 3.090; // one-sided 99.9%
    let h = 2.0 / (9.0 * k);
    k * (1.0 - h + z * h.sqrt()).powi(3)
}

pub fn add_counts(total: &mut Vec<u64>, counts: &[u64]) {
    if total.len() < counts.len() {
        total.resize(counts.len(), 0);
    }
    for (t, c) in total.iter_mut().zip(counts) {
        *t += c;
    }
}

// ─── Single-Run Result ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub seed: u64,
    pub pass: bool,
    pub rolls: u64,
    pub successes: u64,
    pub flows: u64,
    pub unsaved: u64,
    /// Wheel landings per goal, in wheel order.
    pub goal_counts: Vec<u64>,
    /// `[money, time]`.
    pub type_counts: [u64; 2],
    pub money_index_counts: Vec<u64>,
    pub time_index_counts: Vec<u64>,
    pub total_money: i64,
    pub total_time: i64,
    /// Σ per-goal net == total for both types.
    pub additive: bool,
    /// Ledger totals equal the sum of saved commitments.
    pub conserved: bool,
    /// Resetting the largest goal left both of its nets at zero.
    pub reset_zeroes: bool,
    pub elapsed_ms: u128,
}

// ─── Aggregate ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Fairness {
    pub counts: Vec<u64>,
    pub chi_square: f64,
    pub critical: f64,
    pub uniform: bool,
}

impl Fairness {
    pub fn from_counts(counts: Vec<u64>) -> Self {
        let chi_square = chi_square_uniform(&counts);
        let critical = chi_square_critical(counts.len().saturating_sub(1));
        Self { uniform: chi_square <= critical, counts, chi_square, critical }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MonteCarloReport {
    pub n_runs: usize,
    pub flows_per_run: usize,
    pub amount_policy: String,
    pub pass_rate: f64,
    pub success_rate: Stats,
    pub total_money: Stats,
    pub total_time: Stats,
    pub elapsed_ms: Stats,
    pub goals: Fairness,
    pub types: Fairness,
    pub money_amounts: Fairness,
    pub time_amounts: Fairness,
    pub individual_runs: Vec<RunResult>,
}

#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub timestamp: String,
    pub version: &'static str,
    pub prng: &'static str,
    pub base_seed: u64,
    pub report: MonteCarloReport,
}
