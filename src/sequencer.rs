// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Dopamine Rewards Engine - Spin Sequencer
//
// Three-phase spin state machine shared by the goal wheel, the coin flip and
// the amount spinner:
//
//   Idle ──start──▶ Windup ──pre-spin delay──▶ Fast ──fast duration──▶ Decel
//        ──slow duration──▶ Settled ──post-settle delay──▶ completion
//
// The target index is drawn before any motion and the final position is
// computed from it. On settling the index is re-derived from the position
// through the reconciler. The host drives time by calling `tick(now_ms)` once
// per animation frame.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::easing::Easing;
use crate::error::{ConfigError, RewardError};
use crate::reconciler::OutcomeReconciler;
use crate::selector::{SelectionPolicy, WeightedRandomSelector};
use crate::timeline::Timeline;
use crate::types::SelectableItem;

// ─── Constants ──────────────────────────────────────────────────────────────

/// Share of the total travel covered by the fast phase.
pub const FAST_PHASE_FRACTION: f64 = 0.25;

pub const DEFAULT_PRE_SPIN_DELAY_MS: u64 = 500;
pub const DEFAULT_POST_SETTLE_DELAY_MS: u64 = 1000;

/// Row height of the amount spinner track, in pixels.
pub const SPINNER_ITEM_HEIGHT_PX: f64 = 50.0;

// ─── Configuration ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SpinDirection {
    /// Positions grow positive (coin flip rotateY).
    Forward,
    /// Positions grow negative (wheel rotation, spinner track translateY).
    Reverse,
}

impl SpinDirection {
    pub fn sign(&self) -> f64 {
        match self {
            Self::Forward => 1.0,
            Self::Reverse => -1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpinConfig {
    pub item_count: usize,
    /// Degrees per segment (wheel, coin) or pixels per row (spinner).
    pub item_extent: f64,
    pub total_revolutions: u32,
    /// Extra revolutions drawn uniformly from `0..=revolution_jitter`.
    pub revolution_jitter: u32,
    /// `[fast, slow]` phase durations in milliseconds.
    pub phase_durations: [u64; 2],
    pub initial_offset: f64,
    pub direction: SpinDirection,
    pub pre_spin_delay_ms: u64,
    pub post_settle_delay_ms: u64,
    pub fast_easing: Easing,
    pub decel_easing: Easing,
    pub policy: SelectionPolicy,
}

impl SpinConfig {
    pub fn goal_wheel(goal_count: usize) -> Self {
        Self {
            item_count: goal_count,
            item_extent: 360.0 / goal_count.max(1) as f64,
            total_revolutions: 5,
            revolution_jitter: 0,
            phase_durations: [1000, 4000],
            initial_offset: 0.0,
            direction: SpinDirection::Reverse,
            pre_spin_delay_ms: DEFAULT_PRE_SPIN_DELAY_MS,
            post_settle_delay_ms: DEFAULT_POST_SETTLE_DELAY_MS,
            fast_easing: Easing::EaseInQuad,
            decel_easing: Easing::EaseOutCubic,
            policy: SelectionPolicy::Uniform,
        }
    }

    /// Two faces, 180° apart, 2 to 7 full flips.
    pub fn coin_flip() -> Self {
        Self {
            item_count: 2,
            item_extent: 180.0,
            total_revolutions: 2,
            revolution_jitter: 5,
            phase_durations: [1200, 2000],
            initial_offset: 0.0,
            direction: SpinDirection::Forward,
            pre_spin_delay_ms: DEFAULT_PRE_SPIN_DELAY_MS,
            post_settle_delay_ms: DEFAULT_POST_SETTLE_DELAY_MS,
            fast_easing: Easing::EaseInQuad,
            decel_easing: Easing::EaseOutCubic,
            policy: SelectionPolicy::Uniform,
        }
    }

    pub fn amount_spinner(value_count: usize) -> Self {
        Self {
            item_count: value_count,
            item_extent: SPINNER_ITEM_HEIGHT_PX,
            total_revolutions: 3,
            revolution_jitter: 0,
            phase_durations: [1000, 4000],
            initial_offset: 0.0,
            direction: SpinDirection::Reverse,
            pre_spin_delay_ms: DEFAULT_PRE_SPIN_DELAY_MS,
            post_settle_delay_ms: DEFAULT_POST_SETTLE_DELAY_MS,
            fast_easing: Easing::EaseInQuad,
            decel_easing: Easing::CircOut,
            policy: SelectionPolicy::Uniform,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.item_count == 0 {
            return Err(ConfigError::EmptyCandidates);
        }
        if !(self.item_extent.is_finite() && self.item_extent > 0.0) {
            return Err(ConfigError::InvalidSpin("item extent must be positive"));
        }
        if self.total_revolutions == 0 {
            return Err(ConfigError::InvalidSpin("at least one revolution required"));
        }
        if !self.initial_offset.is_finite() {
            return Err(ConfigError::InvalidSpin("initial offset must be finite"));
        }
        Ok(())
    }

    /// Total wall-clock time from `start` to completion.
    pub fn total_duration_ms(&self) -> u64 {
        self.pre_spin_delay_ms
            + self.phase_durations[0]
            + self.phase_durations[1]
            + self.post_settle_delay_ms
    }
}

// ─── State ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SpinPhase {
    /// Pre-spin settling delay; the track has not moved yet.
    Windup,
    Fast,
    Decel,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
pub enum SpinState {
    Idle,
    Animating { target_index: usize, target_position: f64, phase: SpinPhase },
    Settled { selected_index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpinEvent {
    BeginFast,
    BeginDecel,
    Settle,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinStart {
    Started { target_index: usize },
    /// A spin was already in flight; nothing changed.
    Ignored,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SpinOutcome {
    pub index: usize,
    pub item: SelectableItem,
}

/// Snapshot returned to the host once per animation frame.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SpinFrame {
    /// Rendered position (degrees or pixels, signed by direction).
    pub position: f64,
    pub state: SpinState,
    /// Present on exactly one frame per spin.
    pub completed: Option<SpinOutcome>,
}

// ─── Sequencer ──────────────────────────────────────────────────────────────

pub struct SpinSequencer<R: Rng = ChaCha8Rng> {
    config: SpinConfig,
    items: Vec<SelectableItem>,
    selector: WeightedRandomSelector<R>,
    reconciler: OutcomeReconciler,
    state: SpinState,
    timeline: Timeline<SpinEvent>,
    phase_started_ms: u64,
    /// Travel of the current (or last) spin's target.
    target_travel: f64,
    completion_pending: bool,
    /// Last rendered position; frozen once torn down.
    last_position: f64,
    alive: bool,
}

impl<R: Rng> SpinSequencer<R> {
    pub fn new(config: SpinConfig, items: Vec<SelectableItem>, rng: R) -> Self {
        let selector = WeightedRandomSelector::new(rng, config.policy);
        let reconciler = OutcomeReconciler::new(&config);
        let last_position = reconciler.rendered(0.0);
        Self {
            config,
            items,
            selector,
            reconciler,
            state: SpinState::Idle,
            timeline: Timeline::new(),
            phase_started_ms: 0,
            target_travel: 0.0,
            completion_pending: false,
            last_position,
            alive: true,
        }
    }

    pub fn config(&self) -> &SpinConfig {
        &self.config
    }

    pub fn items(&self) -> &[SelectableItem] {
        &self.items
    }

    pub fn state(&self) -> SpinState {
        self.state
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// A spin is in flight from `start` until its completion has fired.
    pub fn is_in_flight(&self) -> bool {
        matches!(self.state, SpinState::Animating { .. }) || self.completion_pending
    }

    /// Begin a spin at `now_ms`.
    ///
    /// Returns [`SpinStart::Ignored`] if a spin is already in flight. Fails
    /// with a configuration error, leaving the sequencer idle, when there are
    /// no items, the geometry is invalid, or the geometry was laid out for a
    /// different number of items.
    pub fn start(&mut self, now_ms: u64) -> Result<SpinStart, RewardError> {
        if !self.alive {
            return Err(RewardError::AnimationInterrupted);
        }
        if self.is_in_flight() {
            log::debug!("start ignored: spin already in flight");
            return Ok(SpinStart::Ignored);
        }
        if self.items.is_empty() {
            return Err(ConfigError::EmptyCandidates.into());
        }
        self.config.validate()?;
        if self.config.item_count != self.items.len() {
            log::error!(
                "spin geometry laid out for {} items but {} supplied",
                self.config.item_count,
                self.items.len()
            );
            return Err(ConfigError::InvalidSpin("item count does not match candidates").into());
        }

        let target_index = self
            .selector
            .pick_index(self.items.len())
            .ok_or(ConfigError::EmptyCandidates)?;
        let revolutions = self
            .selector
            .draw_span(self.config.total_revolutions, self.config.revolution_jitter);

        self.reconciler = OutcomeReconciler::new(&self.config);
        let target_position = self.reconciler.target(target_index, revolutions);

        self.timeline.sync(now_ms);
        self.timeline.after(self.config.pre_spin_delay_ms, SpinEvent::BeginFast);
        self.phase_started_ms = self.timeline.now_ms();
        self.target_travel = target_position;
        self.state = SpinState::Animating {
            target_index,
            target_position,
            phase: SpinPhase::Windup,
        };

        log::debug!(
            "spin started: target {} of {} after {} revolutions (travel {:.1})",
            target_index, self.items.len(), revolutions, target_position
        );
        Ok(SpinStart::Started { target_index })
    }

    /// Advance to `now_ms`, applying every phase transition that has come due,
    /// and report the frame to render.
    pub fn tick(&mut self, now_ms: u64) -> SpinFrame {
        let mut completed = None;
        if self.alive {
            while let Some((due_ms, event)) = self.timeline.pop_due(now_ms) {
                if let Some(outcome) = self.apply(event, due_ms) {
                    completed = Some(outcome);
                }
            }
            self.timeline.sync(now_ms);
            self.last_position = self.position_at(now_ms);
        }
        SpinFrame {
            position: self.last_position,
            state: self.state,
            completed,
        }
    }

    /// Host surface is gone: cancel pending phases and never fire completion.
    pub fn teardown(&mut self) {
        if self.alive {
            log::debug!("sequencer torn down in state {:?}", self.state);
        }
        self.alive = false;
        self.completion_pending = false;
        self.timeline.cancel_all();
    }

    fn apply(&mut self, event: SpinEvent, due_ms: u64) -> Option<SpinOutcome> {
        match (event, self.state) {
            (SpinEvent::BeginFast, SpinState::Animating { target_index, target_position, phase: SpinPhase::Windup }) => {
                self.enter_phase(due_ms, target_index, target_position, SpinPhase::Fast);
                self.timeline.after(self.config.phase_durations[0], SpinEvent::BeginDecel);
                None
            }
            (SpinEvent::BeginDecel, SpinState::Animating { target_index, target_position, phase: SpinPhase::Fast }) => {
                self.enter_phase(due_ms, target_index, target_position, SpinPhase::Decel);
                self.timeline.after(self.config.phase_durations[1], SpinEvent::Settle);
                None
            }
            (SpinEvent::Settle, SpinState::Animating { target_index, target_position, phase: SpinPhase::Decel }) => {
                let selected_index = self.reconcile(target_index, target_position);
                self.state = SpinState::Settled { selected_index };
                self.phase_started_ms = due_ms;
                self.completion_pending = true;
                self.timeline.after(self.config.post_settle_delay_ms, SpinEvent::Complete);
                log::debug!("spin settled on index {}", selected_index);
                None
            }
            (SpinEvent::Complete, SpinState::Settled { selected_index }) if self.completion_pending => {
                self.completion_pending = false;
                let item = self.items.get(selected_index)?.clone();
                Some(SpinOutcome { index: selected_index, item })
            }
            (event, state) => {
                log::warn!("dropping out-of-order spin event {:?} in state {:?}", event, state);
                None
            }
        }
    }

    fn enter_phase(&mut self, due_ms: u64, target_index: usize, target_position: f64, phase: SpinPhase) {
        self.phase_started_ms = due_ms;
        self.state = SpinState::Animating { target_index, target_position, phase };
    }

    fn reconcile(&self, target_index: usize, target_position: f64) -> usize {
        let rendered = self.reconciler.rendered(target_position);
        match self.reconciler.resolve(rendered) {
            Ok(resolved) => {
                if resolved != target_index {
                    log::error!(
                        "reconciled index {} disagrees with drawn index {} (position {})",
                        resolved, target_index, rendered
                    );
                }
                debug_assert_eq!(resolved, target_index, "reconciliation must invert target_position");
                resolved
            }
            Err(e) => {
                log::error!("reconciliation failed: {}", e);
                target_index
            }
        }
    }

    fn progress(&self, now_ms: u64, duration_ms: u64) -> f64 {
        if duration_ms == 0 {
            return 1.0;
        }
        now_ms.saturating_sub(self.phase_started_ms) as f64 / duration_ms as f64
    }

    fn position_at(&self, now_ms: u64) -> f64 {
        let fast_end = self.target_travel * FAST_PHASE_FRACTION;
        let travel = match self.state {
            SpinState::Idle => 0.0,
            SpinState::Animating { phase: SpinPhase::Windup, .. } => 0.0,
            SpinState::Animating { phase: SpinPhase::Fast, .. } => {
                let t = self.progress(now_ms, self.config.phase_durations[0]);
                fast_end * self.config.fast_easing.apply(t)
            }
            SpinState::Animating { target_position, phase: SpinPhase::Decel, .. } => {
                let t = self.progress(now_ms, self.config.phase_durations[1]);
                fast_end + (target_position - fast_end) * self.config.decel_easing.apply(t)
            }
            SpinState::Settled { .. } => self.target_travel,
        };
        self.reconciler.rendered(travel)
    }
}
