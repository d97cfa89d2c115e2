// Monte Carlo Infrastructure - N seeded runs of full game rounds
// Each run plays rounds until `flows` rewards have completed, then checks the
// ledger against what was committed.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use dopamine_engine::*;

use crate::report::*;
use crate::time_series::{CommitmentRecord, OutcomeRecorder};

use std::path::Path;
use std::time::Instant;

/// Wall-clock budget of one round; long enough for roll, reveal and all
/// three spins with their gaps.
const ROUND_MS: u64 = 120_000;
/// Rolls allowed per completed flow before a run is declared stuck.
const MAX_ROLLS_PER_FLOW: u64 = 64;
const EPOCH_MS: i64 = 1_700_000_000_000;

pub struct RunOptions<'a> {
    pub flows: usize,
    pub amount_policy: SelectionPolicy,
    pub store_dir: Option<&'a Path>,
}

/// Run one seeded batch against a fresh store.
pub fn run_single(seed: u64, opts: &RunOptions<'_>, recorder: Option<&mut OutcomeRecorder>) -> Result<RunResult, StoreError> {
    match opts.store_dir {
        Some(base) => {
            let dir = base.join(format!("seed-{}", seed));
            if dir.exists() {
                std::fs::remove_dir_all(&dir)?;
            }
            Ok(play(FileStore::new(dir), seed, opts, recorder))
        }
        None => Ok(play(MemoryStore::new(), seed, opts, recorder)),
    }
}

fn play<S: BlobStore + Clone>(store: S, seed: u64, opts: &RunOptions<'_>, mut recorder: Option<&mut OutcomeRecorder>) -> RunResult {
    let start = Instant::now();
    let clock = ManualClock::new(EPOCH_MS);
    let mut session = GameSession::new(store, &clock, ChaCha8Rng::seed_from_u64(seed));
    session.set_amount_policy(opts.amount_policy);

    let goal_ids: Vec<String> = session.goals().iter().map(|g| g.id.clone()).collect();
    let money_values = session.settings().amount_values(ContributionType::Money).unwrap_or_default();
    let time_values = session.settings().amount_values(ContributionType::Time).unwrap_or_default();

    let mut goal_counts = vec![0u64; goal_ids.len()];
    let mut type_counts = [0u64; 2];
    let mut money_index_counts = vec![0u64; money_values.len()];
    let mut time_index_counts = vec![0u64; time_values.len()];
    let mut committed = [0i64; 2];
    let mut rolls = 0u64;
    let mut successes = 0u64;
    let mut flows = 0u64;
    let mut unsaved = 0u64;
    let mut now = 0u64;

    while (flows as usize) < opts.flows && rolls < MAX_ROLLS_PER_FLOW * opts.flows as u64 {
        clock.set(EPOCH_MS + now as i64);
        if let Err(e) = session.roll(now) {
            log::error!("seed {}: roll failed: {}", seed, e);
            break;
        }
        rolls += 1;
        let frame = session.tick(now + ROUND_MS);
        if frame.roll.map_or(false, |r| r.is_success()) {
            successes += 1;
        }
        if let Some(commitment) = session.acknowledge() {
            flows += 1;
            if let Some(i) = goal_ids.iter().position(|id| *id == commitment.goal.id) {
                goal_counts[i] += 1;
            }
            let (slot, values, counts) = match commitment.contribution_type {
                ContributionType::Money => (0, &money_values, &mut money_index_counts),
                ContributionType::Time => (1, &time_values, &mut time_index_counts),
            };
            type_counts[slot] += 1;
            let amount_index = values.iter().position(|&v| v == commitment.amount);
            if let Some(i) = amount_index {
                counts[i] += 1;
            }
            if commitment.saved {
                committed[slot] += commitment.amount as i64;
            } else {
                unsaved += 1;
            }
            if let Some(rec) = recorder.as_deref_mut() {
                rec.record(CommitmentRecord::new(seed, flows, now, rolls, &commitment, amount_index));
            }
        }
        now += ROUND_MS;
    }

    let ledger = session.ledger();
    let stats = ledger.stats();
    let additive = ContributionType::ALL.iter().all(|&kind| {
        let by_goal: i64 = stats.goals.iter().map(|g| g.net(kind)).sum();
        by_goal == ledger.total_by_type(kind)
    });
    let conserved = stats.total_money == committed[0] && stats.total_time == committed[1];

    let reset_zeroes = match stats.goals.iter().max_by_key(|g| g.net_money + g.net_time) {
        Some(goal) => match ledger.reset_goal(&goal.goal_id, &goal.goal_name) {
            Ok(_) => ContributionType::ALL.iter().all(|&kind| ledger.net_contribution(&goal.goal_id, kind) == 0),
            Err(e) => {
                log::error!("seed {}: reset of {} failed: {}", seed, goal.goal_id, e);
                false
            }
        },
        None => true,
    };

    RunResult {
        seed,
        pass: additive && conserved && reset_zeroes && flows as usize == opts.flows,
        rolls,
        successes,
        flows,
        unsaved,
        goal_counts,
        type_counts,
        money_index_counts,
        time_index_counts,
        total_money: stats.total_money,
        total_time: stats.total_time,
        additive,
        conserved,
        reset_zeroes,
        elapsed_ms: start.elapsed().as_millis(),
    }
}

/// Run Monte Carlo: `n_runs` batches with seeds `base_seed..`, aggregate stats.
pub fn run_monte_carlo(
    n_runs: usize,
    base_seed: u64,
    opts: &RunOptions<'_>,
    mut recorder: Option<&mut OutcomeRecorder>,
) -> Result<MonteCarloReport, StoreError> {
    let mut results = Vec::with_capacity(n_runs);
    for i in 0..n_runs {
        let seed = base_seed + i as u64;
        let result = run_single(seed, opts, recorder.as_deref_mut())?;
        log::debug!("seed {} done: {} flows in {} rolls", seed, result.flows, result.rolls);
        results.push(result);
    }
    Ok(aggregate(opts, results))
}

fn aggregate(opts: &RunOptions<'_>, results: Vec<RunResult>) -> MonteCarloReport {
    let n = results.len();
    let passed = results.iter().filter(|r| r.pass).count();
    let pass_rate = if n == 0 { 0.0 } else { passed as f64 / n as f64 };

    let success_rate = Stats::from_samples(
        &results.iter().map(|r| r.successes as f64 / r.rolls.max(1) as f64).collect::<Vec<_>>()
    );
    let total_money = Stats::from_samples(
        &results.iter().map(|r| r.total_money as f64).collect::<Vec<_>>()
    );
    let total_time = Stats::from_samples(
        &results.iter().map(|r| r.total_time as f64).collect::<Vec<_>>()
    );
    let elapsed_ms = Stats::from_samples(
        &results.iter().map(|r| r.elapsed_ms as f64).collect::<Vec<_>>()
    );

    let mut goals = Vec::new();
    let mut types = Vec::new();
    let mut money = Vec::new();
    let mut time = Vec::new();
    for r in &results {
        add_counts(&mut goals, &r.goal_counts);
        add_counts(&mut types, &r.type_counts);
        add_counts(&mut money, &r.money_index_counts);
        add_counts(&mut time, &r.time_index_counts);
    }

    MonteCarloReport {
        n_runs: n,
        flows_per_run: opts.flows,
        amount_policy: format!("{:?}", opts.amount_policy),
        pass_rate,
        success_rate,
        total_money,
        total_time,
        elapsed_ms,
        goals: Fairness::from_counts(goals),
        types: Fairness::from_counts(types),
        money_amounts: Fairness::from_counts(money),
        time_amounts: Fairness::from_counts(time),
        individual_runs: results,
    }
}
