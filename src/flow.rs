// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Dopamine Rewards Engine - Reward Flow
//
// Chains the three spins of a reward: goal wheel, then money-or-time coin
// flip, then amount spinner, then the success card. Each step starts
// `step_delay_ms` after the previous spin completed. The contribution is
// written to the ledger when the amount spin completes.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::amounts::{generate_log_values, AMOUNT_VALUE_COUNT};
use crate::clock::Clock;
use crate::dice::{REWARD_REVEAL_DELAY_MS, ROLL_DURATION_MS};
use crate::error::{ConfigError, RewardError};
use crate::ledger::{ContributionLedger, NewContribution};
use crate::selector::SelectionPolicy;
use crate::sequencer::{SpinConfig, SpinFrame, SpinOutcome, SpinSequencer};
use crate::settings::{AmountSettings, SettingsStore};
use crate::storage::BlobStore;
use crate::timeline::Timeline;
use crate::types::{ContributionType, Goal, SelectableItem};

pub const DEFAULT_STEP_DELAY_MS: u64 = 1000;

// ─── Configuration ──────────────────────────────────────────────────────────

/// Delays between the stages of a game round.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct FlowTimings {
    /// Gap between one spin completing and the next step starting.
    pub step_delay_ms: u64,
    pub roll_duration_ms: u64,
    pub reward_reveal_delay_ms: u64,
}

impl Default for FlowTimings {
    fn default() -> Self {
        Self {
            step_delay_ms: DEFAULT_STEP_DELAY_MS,
            roll_duration_ms: ROLL_DURATION_MS,
            reward_reveal_delay_ms: REWARD_REVEAL_DELAY_MS,
        }
    }
}

// ─── Output ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlowStep {
    Goal,
    #[serde(rename = "type")]
    ContributionType,
    Amount,
    Success,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Commitment {
    pub goal: Goal,
    pub contribution_type: ContributionType,
    pub amount: u32,
    /// False when the ledger write failed.
    pub saved: bool,
}

impl Commitment {
    pub fn message(&self) -> String {
        format!(
            "You've committed to contribute {} {} to {}.",
            self.amount,
            self.contribution_type.unit_plural(),
            self.goal.name
        )
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FlowFrame {
    pub step: FlowStep,
    pub spin: Option<SpinFrame>,
    pub commitment: Option<Commitment>,
}

// ─── Flow ───────────────────────────────────────────────────────────────────

pub struct RewardFlow<S: BlobStore, C: Clock, R: Rng + SeedableRng = ChaCha8Rng> {
    goals: Vec<Goal>,
    settings: SettingsStore<S>,
    ledger: ContributionLedger<S, C>,
    timings: FlowTimings,
    amount_policy: SelectionPolicy,
    rng: R,
    step: FlowStep,
    spinner: Option<SpinSequencer<R>>,
    step_started_ms: u64,
    timeline: Timeline<FlowStep>,
    goal: Option<Goal>,
    contribution_type: Option<ContributionType>,
    commitment: Option<Commitment>,
    started: bool,
    finished: bool,
    alive: bool,
}

impl<S: BlobStore, C: Clock, R: Rng + SeedableRng> RewardFlow<S, C, R> {
    pub fn new(
        goals: Vec<Goal>,
        settings: SettingsStore<S>,
        ledger: ContributionLedger<S, C>,
        rng: R,
        timings: FlowTimings,
    ) -> Self {
        Self {
            goals,
            settings,
            ledger,
            timings,
            amount_policy: SelectionPolicy::default(),
            rng,
            step: FlowStep::Goal,
            spinner: None,
            step_started_ms: 0,
            timeline: Timeline::new(),
            goal: None,
            contribution_type: None,
            commitment: None,
            started: false,
            finished: false,
            alive: true,
        }
    }

    pub fn set_amount_policy(&mut self, policy: SelectionPolicy) {
        self.amount_policy = policy;
    }

    pub fn step(&self) -> FlowStep {
        self.step
    }

    pub fn commitment(&self) -> Option<&Commitment> {
        self.commitment.as_ref()
    }

    /// Started and neither acknowledged nor torn down.
    pub fn is_active(&self) -> bool {
        self.started && !self.finished && self.alive
    }

    pub fn ledger(&self) -> &ContributionLedger<S, C> {
        &self.ledger
    }

    /// Start the goal wheel at `now_ms`. A second call is a no-op.
    pub fn begin(&mut self, now_ms: u64) -> Result<(), RewardError> {
        if !self.alive {
            return Err(RewardError::AnimationInterrupted);
        }
        if self.started {
            return Ok(());
        }
        if self.goals.is_empty() {
            return Err(ConfigError::EmptyCandidates.into());
        }
        self.started = true;
        self.timeline.sync(now_ms);
        self.enter(FlowStep::Goal, now_ms)
    }

    /// Advance every pending spin and step transition up to `now_ms`.
    pub fn tick(&mut self, now_ms: u64) -> FlowFrame {
        let mut spin = None;
        if self.is_active() {
            loop {
                let completed = match self.spinner.as_mut() {
                    Some(sequencer) => {
                        let frame = sequencer.tick(now_ms);
                        let done_ms = self.step_started_ms + sequencer.config().total_duration_ms();
                        let completed = frame.completed.clone().map(|outcome| (outcome, done_ms));
                        spin = Some(frame);
                        completed
                    }
                    None => None,
                };
                if let Some((outcome, done_ms)) = completed {
                    self.on_spin_complete(outcome, done_ms);
                }

                let Some((due_ms, step)) = self.timeline.pop_due(now_ms) else { break };
                spin = None;
                if let Err(e) = self.enter(step, due_ms) {
                    log::error!("reward flow stalled entering {:?}: {}", step, e);
                    break;
                }
            }
            self.timeline.sync(now_ms);
        } else if let Some(sequencer) = self.spinner.as_mut() {
            spin = Some(sequencer.tick(now_ms));
        }

        FlowFrame {
            step: self.step,
            spin,
            commitment: if self.step == FlowStep::Success { self.commitment.clone() } else { None },
        }
    }

    /// Dismiss the success card. Returns the commitment once.
    pub fn acknowledge(&mut self) -> Option<Commitment> {
        if self.step != FlowStep::Success || self.finished {
            return None;
        }
        self.finished = true;
        self.commitment.clone()
    }

    pub fn teardown(&mut self) {
        self.alive = false;
        self.timeline.cancel_all();
        if let Some(sequencer) = self.spinner.as_mut() {
            sequencer.teardown();
        }
    }

    fn enter(&mut self, step: FlowStep, at_ms: u64) -> Result<(), RewardError> {
        log::debug!("reward flow entering {:?} at {}ms", step, at_ms);
        self.step = step;
        self.step_started_ms = at_ms;
        let (config, items): (SpinConfig, Vec<SelectableItem>) = match step {
            FlowStep::Goal => (
                SpinConfig::goal_wheel(self.goals.len()),
                self.goals.iter().map(Goal::to_item).collect(),
            ),
            FlowStep::ContributionType => (
                SpinConfig::coin_flip(),
                ContributionType::ALL.iter().map(|&kind| SelectableItem::contribution_type(kind)).collect(),
            ),
            FlowStep::Amount => {
                let kind = self.contribution_type.unwrap_or_default();
                let values = self.amount_values(kind)?;
                let mut config = SpinConfig::amount_spinner(values.len());
                config.policy = self.amount_policy;
                (config, values.into_iter().map(SelectableItem::amount).collect())
            }
            FlowStep::Success => {
                self.spinner = None;
                return Ok(());
            }
        };
        let mut sequencer = SpinSequencer::new(config, items, R::seed_from_u64(self.rng.gen()));
        sequencer.start(at_ms)?;
        self.spinner = Some(sequencer);
        Ok(())
    }

    fn amount_values(&self, kind: ContributionType) -> Result<Vec<u32>, RewardError> {
        self.settings.amount_values(kind).or_else(|e| {
            log::error!("Invalid stored {} range, using defaults: {}", kind, e);
            let (min, max) = AmountSettings::default().range(kind);
            generate_log_values(min, max, AMOUNT_VALUE_COUNT)
        })
    }

    fn on_spin_complete(&mut self, outcome: SpinOutcome, done_ms: u64) {
        let next = match self.step {
            FlowStep::Goal => {
                self.goal = self.goals.get(outcome.index).cloned();
                FlowStep::ContributionType
            }
            FlowStep::ContributionType => {
                self.contribution_type = ContributionType::parse(&outcome.item.id);
                FlowStep::Amount
            }
            FlowStep::Amount => {
                let amount = outcome.item.number().and_then(|n| u32::try_from(n).ok()).unwrap_or(0);
                self.commit(amount);
                FlowStep::Success
            }
            FlowStep::Success => return,
        };
        self.timeline.sync(done_ms);
        self.timeline.after(self.timings.step_delay_ms, next);
    }

    fn commit(&mut self, amount: u32) {
        let Some(goal) = self.goal.clone() else {
            log::error!("amount selected without a goal");
            return;
        };
        let contribution_type = self.contribution_type.unwrap_or_default();
        let saved = match self.ledger.append(NewContribution::deposit(&goal.id, &goal.name, contribution_type, amount)) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to save contribution: {}", e);
                false
            }
        };
        log::info!(
            "committed {} to {} (saved: {})",
            contribution_type.format_amount(amount),
            goal.id,
            saved
        );
        self.commitment = Some(Commitment { goal, contribution_type, amount, saved });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::StoreError;
    use crate::storage::{MemoryStore, CONTRIBUTIONS_KEY, SETTINGS_KEY};
    use crate::types::default_goals;

    type TestFlow<'a> = RewardFlow<&'a MemoryStore, &'a ManualClock>;

    fn flow<'a>(store: &'a MemoryStore, clock: &'a ManualClock, seed: u64) -> TestFlow<'a> {
        RewardFlow::new(
            default_goals(),
            SettingsStore::new(store),
            ContributionLedger::new(store, clock),
            ChaCha8Rng::seed_from_u64(seed),
            FlowTimings::default(),
        )
    }

    /// Tick at frame rate until the success card shows.
    fn run_to_success(flow: &mut TestFlow<'_>, from_ms: u64) -> (u64, Commitment) {
        let mut t = from_ms;
        loop {
            let frame = flow.tick(t);
            if let Some(commitment) = frame.commitment {
                return (t, commitment);
            }
            t += 16;
            assert!(t < from_ms + 60_000, "flow never reached success");
        }
    }

    #[test]
    fn steps_advance_in_order() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(0);
        let mut flow = flow(&store, &clock, 1);
        flow.begin(0).unwrap();

        let mut seen = vec![flow.step()];
        let mut t = 0;
        while flow.step() != FlowStep::Success {
            t += 16;
            let step = flow.tick(t).step;
            if seen.last() != Some(&step) {
                seen.push(step);
            }
        }
        assert_eq!(
            seen,
            vec![FlowStep::Goal, FlowStep::ContributionType, FlowStep::Amount, FlowStep::Success]
        );
    }

    #[test]
    fn next_step_waits_for_step_delay() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(0);
        let mut flow = flow(&store, &clock, 2);
        flow.begin(0).unwrap();
        // Goal wheel completes at 6500ms.
        assert!(flow.tick(6_500).spin.is_some());
        assert_eq!(flow.tick(7_499).step, FlowStep::Goal);
        assert_eq!(flow.tick(7_500).step, FlowStep::ContributionType);
    }

    #[test]
    fn completion_appends_to_ledger() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(1_717_000_000_000);
        let mut flow = flow(&store, &clock, 3);
        flow.begin(0).unwrap();
        let (_, commitment) = run_to_success(&mut flow, 0);

        assert!(commitment.saved);
        assert!(commitment.amount >= 1);
        let events = flow.ledger().events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].goal_id, commitment.goal.id);
        assert_eq!(events[0].contribution_type, commitment.contribution_type);
        assert_eq!(events[0].amount, commitment.amount);
        assert_eq!(events[0].timestamp, 1_717_000_000_000);
    }

    #[test]
    fn fast_forward_matches_frame_by_frame() {
        let store_a = MemoryStore::new();
        let store_b = MemoryStore::new();
        let clock = ManualClock::new(0);
        let mut stepped = flow(&store_a, &clock, 4);
        let mut jumped = flow(&store_b, &clock, 4);
        stepped.begin(0).unwrap();
        jumped.begin(0).unwrap();

        let (_, expected) = run_to_success(&mut stepped, 0);
        let frame = jumped.tick(120_000);
        assert_eq!(frame.step, FlowStep::Success);
        assert_eq!(frame.commitment, Some(expected));
        assert!(frame.spin.is_none());
    }

    #[test]
    fn amount_comes_from_configured_range() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(0);
        store
            .set(SETTINGS_KEY, br#"{"moneyMin":200,"moneyMax":300,"timeMin":200,"timeMax":300}"#)
            .unwrap();
        for seed in 0..5 {
            let mut flow = flow(&store, &clock, seed);
            flow.begin(0).unwrap();
            let commitment = flow.tick(120_000).commitment.unwrap();
            assert!((200..=300).contains(&commitment.amount), "amount {}", commitment.amount);
        }
    }

    #[test]
    fn acknowledge_only_from_success() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(0);
        let mut flow = flow(&store, &clock, 5);
        flow.begin(0).unwrap();
        flow.tick(100);
        assert!(flow.acknowledge().is_none());
        flow.tick(120_000);
        let commitment = flow.acknowledge().unwrap();
        assert!(commitment.message().starts_with("You've committed to contribute "));
        assert!(!flow.is_active());
        assert!(flow.acknowledge().is_none());
    }

    #[test]
    fn teardown_stops_before_ledger_write() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(0);
        let mut flow = flow(&store, &clock, 6);
        flow.begin(0).unwrap();
        flow.tick(3_000);
        flow.teardown();
        let frame = flow.tick(120_000);
        assert_eq!(frame.step, FlowStep::Goal);
        assert!(frame.spin.map_or(true, |s| s.completed.is_none()));
        assert!(store.get(CONTRIBUTIONS_KEY).unwrap().is_none());
        assert!(matches!(flow.begin(0), Err(RewardError::AnimationInterrupted)));
    }

    #[test]
    fn failed_write_still_reaches_success() {
        struct ReadOnly(MemoryStore);
        impl BlobStore for ReadOnly {
            fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
                self.0.get(key)
            }
            fn set(&self, _key: &str, _value: &[u8]) -> Result<(), StoreError> {
                Err(StoreError::Backend("read-only".into()))
            }
        }

        let store = ReadOnly(MemoryStore::new());
        let clock = ManualClock::new(0);
        let mut flow: RewardFlow<&ReadOnly, &ManualClock> = RewardFlow::new(
            default_goals(),
            SettingsStore::new(&store),
            ContributionLedger::new(&store, &clock),
            ChaCha8Rng::seed_from_u64(7),
            FlowTimings::default(),
        );
        flow.begin(0).unwrap();
        let commitment = flow.tick(120_000).commitment.unwrap();
        assert!(!commitment.saved);
    }

    #[test]
    fn empty_goals_rejected() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(0);
        let mut flow: TestFlow<'_> = RewardFlow::new(
            Vec::new(),
            SettingsStore::new(&store),
            ContributionLedger::new(&store, &clock),
            ChaCha8Rng::seed_from_u64(8),
            FlowTimings::default(),
        );
        assert!(matches!(
            flow.begin(0),
            Err(RewardError::Configuration(ConfigError::EmptyCandidates))
        ));
    }

    #[test]
    fn commitment_message_matches_success_card() {
        let commitment = Commitment {
            goal: Goal::new("travel", "Travel", "Exploring the world"),
            contribution_type: ContributionType::Money,
            amount: 25,
            saved: true,
        };
        assert_eq!(commitment.message(), "You've committed to contribute 25 dollars to Travel.");
    }
}
