// Reward Simulation Runner - selection fairness and ledger consistency
// Monte Carlo over seeded game sessions, ChaCha8 PRNG, optional JSONL output
//
// Usage:
//   cargo run --release --bin simulate                          # 30 runs × 100 flows
//   cargo run --release --bin simulate -- --runs 5 --flows 20   # Quick mode
//   cargo run --release --bin simulate -- --seed 42             # Custom base seed
//   cargo run --release --bin simulate -- --outcomes out.jsonl  # One line per commitment
//   cargo run --release --bin simulate -- --store-dir /tmp/sim  # Exercise the file store
//   cargo run --release --bin simulate -- --skewed-amounts      # Log-skewed amount spinner

mod monte_carlo;
mod report;
mod time_series;

use clap::Parser;
use dopamine_engine::SelectionPolicy;
use monte_carlo::RunOptions;
use report::*;
use std::path::PathBuf;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use time_series::OutcomeRecorder;

#[derive(Parser, Debug)]
#[command(name = "simulate")]
#[command(about = "Monte Carlo check of reward selection fairness and ledger consistency")]
struct Args {
    /// Number of seeded runs
    #[arg(long, default_value_t = 30)]
    runs: usize,

    /// Seed of the first run; run i uses seed + i
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Completed reward flows per run
    #[arg(long, default_value_t = 100)]
    flows: usize,

    /// Persist each run's ledger under this directory instead of in memory
    #[arg(long)]
    store_dir: Option<PathBuf>,

    /// Write every commitment as JSON lines to this file
    #[arg(long)]
    outcomes: Option<PathBuf>,

    /// Use the log-skewed policy for the amount spinner
    #[arg(long)]
    skewed_amounts: bool,

    /// Where to write the JSON report
    #[arg(long, default_value = "simulation-results")]
    report_dir: PathBuf,
}

fn fairness_line(name: &str, f: &Fairness) {
    println!(
        "  {:<16} {:>6} {:>10.2} {:>10.2}  {}",
        name,
        f.counts.iter().sum::<u64>(),
        f.chi_square,
        f.critical,
        if f.uniform { "uniform" } else { "SKEWED" },
    );
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("simulate failed: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let amount_policy = if args.skewed_amounts { SelectionPolicy::LogSkewed } else { SelectionPolicy::Uniform };

    println!("\n  Reward Simulation Runner");
    println!(
        "  PRNG: ChaCha8Rng | Runs: {} | Flows/run: {} | Base seed: {} | Amount policy: {:?}\n",
        args.runs, args.flows, args.seed, amount_policy
    );

    let opts = RunOptions {
        flows: args.flows,
        amount_policy,
        store_dir: args.store_dir.as_deref(),
    };
    let mut recorder = args.outcomes.as_ref().map(|_| OutcomeRecorder::new());

    let started = Instant::now();
    let report = monte_carlo::run_monte_carlo(args.runs, args.seed, &opts, recorder.as_mut())?;
    let elapsed = started.elapsed();

    println!("  {:<16} {:>6} {:>10} {:>10}", "Selection", "n", "chi²", "crit.999");
    println!("  {}", "-".repeat(56));
    fairness_line("goal wheel", &report.goals);
    fairness_line("coin flip", &report.types);
    fairness_line("money amounts", &report.money_amounts);
    fairness_line("time amounts", &report.time_amounts);
    println!("  {}", "-".repeat(56));
    println!(
        "  Roll success rate: {:.3} ± {:.3}   Money/run: {:.1}   Time/run: {:.1}",
        report.success_rate.mean,
        (report.success_rate.ci_upper - report.success_rate.ci_lower) / 2.0,
        report.total_money.mean,
        report.total_time.mean,
    );

    let failed: Vec<u64> = report.individual_runs.iter().filter(|r| !r.pass).map(|r| r.seed).collect();
    println!(
        "  Ledger checks: {}/{} runs pass   Suite time: {:.1}s\n",
        report.individual_runs.len() - failed.len(),
        report.individual_runs.len(),
        elapsed.as_secs_f64()
    );
    if !failed.is_empty() {
        println!("  Failing seeds: {:?}\n", failed);
    }

    if let (Some(rec), Some(path)) = (&recorder, &args.outcomes) {
        rec.write_jsonl(path)?;
        println!("  {} commitments written to {}", rec.len(), path.display());
    }

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
        .to_string();
    let output = SimulationReport {
        timestamp: timestamp.clone(),
        version: env!("CARGO_PKG_VERSION"),
        prng: "ChaCha8Rng",
        base_seed: args.seed,
        report,
    };
    std::fs::create_dir_all(&args.report_dir)?;
    let path = args.report_dir.join(format!("simulate-{}.json", timestamp));
    std::fs::write(&path, serde_json::to_string_pretty(&output)?)?;
    println!("  Results saved to: {}\n", path.display());

    if !failed.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}
