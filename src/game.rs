// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Dopamine Rewards Engine - Game Session
//
// Top-level round: roll the die, reveal the result, and on a success open the
// reward flow. Owns the storage handle and hands out ledger and settings
// views over it for the stats and settings screens.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::dice::DiceRoll;
use crate::error::RewardError;
use crate::flow::{Commitment, FlowFrame, FlowTimings, RewardFlow};
use crate::ledger::ContributionLedger;
use crate::selector::SelectionPolicy;
use crate::settings::SettingsStore;
use crate::storage::BlobStore;
use crate::timeline::Timeline;
use crate::types::{default_goals, Goal};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    Ready,
    Rolling,
    /// Result on screen; a success moves on to the rewards shortly.
    Revealed,
    Rewarding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollStart {
    Rolling,
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GameEvent {
    Reveal(DiceRoll),
    OpenRewards,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GameFrame {
    pub phase: GamePhase,
    pub roll: Option<DiceRoll>,
    /// Result text, shown only between the reveal and the rewards.
    pub message: Option<String>,
    pub flow: Option<FlowFrame>,
}

pub struct GameSession<S, C, R = ChaCha8Rng>
where
    S: BlobStore + Clone,
    C: Clock + Clone,
    R: Rng + SeedableRng,
{
    store: S,
    clock: C,
    goals: Vec<Goal>,
    timings: FlowTimings,
    amount_policy: SelectionPolicy,
    rng: R,
    timeline: Timeline<GameEvent>,
    phase: GamePhase,
    roll: Option<DiceRoll>,
    rewards_pending: bool,
    flow: Option<RewardFlow<S, C, R>>,
    alive: bool,
}

impl<S, C, R> GameSession<S, C, R>
where
    S: BlobStore + Clone,
    C: Clock + Clone,
    R: Rng + SeedableRng,
{
    pub fn new(store: S, clock: C, rng: R) -> Self {
        Self::with_goals(store, clock, rng, default_goals(), FlowTimings::default())
    }

    pub fn with_goals(store: S, clock: C, rng: R, goals: Vec<Goal>, timings: FlowTimings) -> Self {
        Self {
            store,
            clock,
            goals,
            timings,
            amount_policy: SelectionPolicy::default(),
            rng,
            timeline: Timeline::new(),
            phase: GamePhase::Ready,
            roll: None,
            rewards_pending: false,
            flow: None,
            alive: true,
        }
    }

    pub fn set_amount_policy(&mut self, policy: SelectionPolicy) {
        self.amount_policy = policy;
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn ledger(&self) -> ContributionLedger<&S, &C> {
        ContributionLedger::new(&self.store, &self.clock)
    }

    pub fn settings(&self) -> SettingsStore<&S> {
        SettingsStore::new(&self.store)
    }

    /// Throw the die at `now_ms`. Ignored while a roll is animating or a
    /// reward is pending or open.
    pub fn roll(&mut self, now_ms: u64) -> Result<RollStart, RewardError> {
        if !self.alive {
            return Err(RewardError::AnimationInterrupted);
        }
        if self.phase == GamePhase::Rolling || self.phase == GamePhase::Rewarding || self.rewards_pending {
            log::debug!("roll ignored in phase {:?}", self.phase);
            return Ok(RollStart::Ignored);
        }
        let roll = DiceRoll::roll(&mut self.rng);
        self.phase = GamePhase::Rolling;
        self.roll = None;
        self.timeline.sync(now_ms);
        self.timeline.after(self.timings.roll_duration_ms, GameEvent::Reveal(roll));
        Ok(RollStart::Rolling)
    }

    pub fn tick(&mut self, now_ms: u64) -> GameFrame {
        if self.alive {
            while let Some((due_ms, event)) = self.timeline.pop_due(now_ms) {
                self.apply(event, due_ms);
            }
            self.timeline.sync(now_ms);
        }
        let flow = self.flow.as_mut().map(|flow| flow.tick(now_ms));
        GameFrame {
            phase: self.phase,
            roll: self.roll,
            message: match self.phase {
                GamePhase::Revealed => self.roll.map(|r| r.message()),
                _ => None,
            },
            flow,
        }
    }

    /// Close the success card and return to the die.
    pub fn acknowledge(&mut self) -> Option<Commitment> {
        let commitment = self.flow.as_mut()?.acknowledge()?;
        self.flow = None;
        self.roll = None;
        self.phase = GamePhase::Ready;
        Some(commitment)
    }

    pub fn teardown(&mut self) {
        self.alive = false;
        self.rewards_pending = false;
        self.timeline.cancel_all();
        if let Some(flow) = self.flow.as_mut() {
            flow.teardown();
        }
    }

    fn apply(&mut self, event: GameEvent, due_ms: u64) {
        match event {
            GameEvent::Reveal(roll) => {
                log::debug!("rolled {}", roll.value);
                self.roll = Some(roll);
                self.phase = GamePhase::Revealed;
                if roll.is_success() {
                    self.rewards_pending = true;
                    self.timeline.after(self.timings.reward_reveal_delay_ms, GameEvent::OpenRewards);
                }
            }
            GameEvent::OpenRewards => {
                self.rewards_pending = false;
                let mut flow = RewardFlow::new(
                    self.goals.clone(),
                    SettingsStore::new(self.store.clone()),
                    ContributionLedger::new(self.store.clone(), self.clock.clone()),
                    R::seed_from_u64(self.rng.gen()),
                    self.timings,
                );
                flow.set_amount_policy(self.amount_policy);
                match flow.begin(due_ms) {
                    Ok(()) => {
                        self.phase = GamePhase::Rewarding;
                        self.flow = Some(flow);
                    }
                    Err(e) => {
                        log::error!("could not open rewards: {}", e);
                        self.phase = GamePhase::Ready;
                    }
                }
            }
        }
    }
}
