// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Dopamine Rewards Engine

//! Core of a dice-and-wheel habit reward game. A successful roll opens three
//! chained spins (funding goal, money or time, amount) whose outcome is
//! appended to a local contribution ledger.
//!
//! Every animation is host-driven: the page calls `tick(now_ms)` once per
//! frame and renders the returned position. Selection happens before motion
//! and the settled position is mapped back to the selected index, so the
//! item under the pointer is always the item reported.

pub mod error;
pub mod types;

pub mod amounts;
pub mod easing;
pub mod reconciler;
pub mod selector;
pub mod sequencer;
pub mod timeline;

pub mod clock;
pub mod ledger;
pub mod settings;
pub mod storage;

pub mod dice;
pub mod flow;
pub mod game;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use error::{ConfigError, RewardError, StoreError};
pub use types::*;

pub use amounts::{generate_log_values, AMOUNT_VALUE_COUNT};
pub use easing::Easing;
pub use reconciler::{resolve_index, target_position, OutcomeReconciler};
pub use selector::{SelectionPolicy, WeightedRandomSelector};
pub use sequencer::{SpinConfig, SpinDirection, SpinFrame, SpinOutcome, SpinPhase, SpinSequencer, SpinStart, SpinState};
pub use timeline::Timeline;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ledger::{ContributionEvent, ContributionLedger, GoalAggregate, NewContribution, StatsSummary};
pub use settings::{AmountSettings, SettingsStore};
pub use storage::{BlobStore, FileStore, MemoryStore, CONTRIBUTIONS_KEY, SETTINGS_KEY};

pub use dice::DiceRoll;
pub use flow::{Commitment, FlowFrame, FlowStep, FlowTimings, RewardFlow};
pub use game::{GameFrame, GamePhase, GameSession, RollStart};

#[cfg(target_arch = "wasm32")]
pub use web::{BrowserStore, RewardClient};
