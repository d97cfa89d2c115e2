// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Dopamine Rewards Engine - Contribution Ledger
//
// Append-only log of contribution and withdrawal events. Amounts are stored
// positive; the sign lives in `is_withdrawal`. Every aggregate is recomputed
// from the full log on demand, so there are no running counters to drift.

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::{RewardError, StoreError};
use crate::storage::{read_json, write_json, BlobStore, CONTRIBUTIONS_KEY};
use crate::types::ContributionType;

// ─── Events ─────────────────────────────────────────────────────────────────

fn is_false(b: &bool) -> bool {
    !*b
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContributionEvent {
    pub goal_id: String,
    pub goal_name: String,
    #[serde(rename = "type")]
    pub contribution_type: ContributionType,
    pub amount: u32,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_withdrawal: bool,
}

impl ContributionEvent {
    pub fn signed_amount(&self) -> i64 {
        if self.is_withdrawal { -(self.amount as i64) } else { self.amount as i64 }
    }
}

/// An event before the ledger stamps it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContribution {
    pub goal_id: String,
    pub goal_name: String,
    pub contribution_type: ContributionType,
    pub amount: u32,
    pub is_withdrawal: bool,
}

impl NewContribution {
    pub fn deposit(goal_id: &str, goal_name: &str, contribution_type: ContributionType, amount: u32) -> Self {
        Self {
            goal_id: goal_id.to_string(),
            goal_name: goal_name.to_string(),
            contribution_type,
            amount,
            is_withdrawal: false,
        }
    }

    pub fn withdrawal(goal_id: &str, goal_name: &str, contribution_type: ContributionType, amount: u32) -> Self {
        Self { is_withdrawal: true, ..Self::deposit(goal_id, goal_name, contribution_type, amount) }
    }

    fn stamp(self, timestamp: i64) -> ContributionEvent {
        ContributionEvent {
            goal_id: self.goal_id,
            goal_name: self.goal_name,
            contribution_type: self.contribution_type,
            amount: self.amount,
            timestamp,
            is_withdrawal: self.is_withdrawal,
        }
    }
}

// ─── Projections ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GoalAggregate {
    pub goal_id: String,
    pub goal_name: String,
    pub net_money: i64,
    pub net_time: i64,
}

impl GoalAggregate {
    pub fn net(&self, kind: ContributionType) -> i64 {
        match kind {
            ContributionType::Money => self.net_money,
            ContributionType::Time => self.net_time,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub total_money: i64,
    pub total_time: i64,
    pub goals: Vec<GoalAggregate>,
}

pub fn net_of<'a>(
    events: impl IntoIterator<Item = &'a ContributionEvent>,
    goal_id: Option<&str>,
    kind: ContributionType,
) -> i64 {
    events
        .into_iter()
        .filter(|e| e.contribution_type == kind)
        .filter(|e| goal_id.map_or(true, |g| e.goal_id == g))
        .map(ContributionEvent::signed_amount)
        .sum()
}

/// Per-goal nets in order of each goal's first appearance; the name comes
/// from that first event.
pub fn aggregate_goals(events: &[ContributionEvent]) -> Vec<GoalAggregate> {
    let mut goals: Vec<GoalAggregate> = Vec::new();
    for event in events {
        let position = match goals.iter().position(|g| g.goal_id == event.goal_id) {
            Some(i) => i,
            None => {
                goals.push(GoalAggregate {
                    goal_id: event.goal_id.clone(),
                    goal_name: event.goal_name.clone(),
                    net_money: 0,
                    net_time: 0,
                });
                goals.len() - 1
            }
        };
        let goal = &mut goals[position];
        match event.contribution_type {
            ContributionType::Money => goal.net_money += event.signed_amount(),
            ContributionType::Time => goal.net_time += event.signed_amount(),
        }
    }
    goals
}

// ─── Ledger ─────────────────────────────────────────────────────────────────

pub struct ContributionLedger<S: BlobStore, C: Clock> {
    store: S,
    clock: C,
}

impl<S: BlobStore, C: Clock> ContributionLedger<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Strict read used before every write: an unreadable log is an error,
    /// never silently replaced.
    fn load(&self) -> Result<Vec<ContributionEvent>, StoreError> {
        Ok(read_json(&self.store, CONTRIBUTIONS_KEY)?.unwrap_or_default())
    }

    fn load_logged(&self) -> Result<Vec<ContributionEvent>, RewardError> {
        self.load().map_err(|e| {
            log::error!("Failed to read contributions: {}", e);
            RewardError::from(e)
        })
    }

    fn persist(&self, events: &[ContributionEvent]) -> Result<(), StoreError> {
        write_json(&self.store, CONTRIBUTIONS_KEY, events)
    }

    fn append_all(&self, batch: Vec<NewContribution>) -> Result<usize, RewardError> {
        if batch.iter().any(|c| c.amount == 0) {
            return Err(RewardError::InvalidAmount);
        }
        let mut events = self.load_logged()?;
        let count = batch.len();
        if count == 0 {
            return Ok(0);
        }
        let timestamp = self.clock.now_millis();
        events.extend(batch.into_iter().map(|c| c.stamp(timestamp)));
        self.persist(&events).map_err(|e| {
            log::error!("Failed to save contribution: {}", e);
            RewardError::from(e)
        })?;
        Ok(count)
    }

    /// Stamp with the current time and append.
    pub fn append(&self, contribution: NewContribution) -> Result<(), RewardError> {
        log::debug!(
            "appending {} {} {} to {}",
            if contribution.is_withdrawal { "withdrawal" } else { "deposit" },
            contribution.amount,
            contribution.contribution_type,
            contribution.goal_id
        );
        self.append_all(vec![contribution]).map(|_| ())
    }

    /// Full log, oldest first. Empty when the log cannot be read.
    pub fn events(&self) -> Vec<ContributionEvent> {
        self.load().unwrap_or_else(|e| {
            log::error!("Failed to get contributions: {}", e);
            Vec::new()
        })
    }

    pub fn events_for_goal(&self, goal_id: &str) -> Vec<ContributionEvent> {
        self.events().into_iter().filter(|e| e.goal_id == goal_id).collect()
    }

    pub fn net_contribution(&self, goal_id: &str, kind: ContributionType) -> i64 {
        net_of(&self.events(), Some(goal_id), kind)
    }

    pub fn total_by_type(&self, kind: ContributionType) -> i64 {
        net_of(&self.events(), None, kind)
    }

    pub fn goal_aggregates(&self) -> Vec<GoalAggregate> {
        aggregate_goals(&self.events())
    }

    /// Everything the stats view renders, from a single read of the log.
    pub fn stats(&self) -> StatsSummary {
        let events = self.events();
        StatsSummary {
            total_money: net_of(&events, None, ContributionType::Money),
            total_time: net_of(&events, None, ContributionType::Time),
            goals: aggregate_goals(&events),
        }
    }

    /// Append a withdrawal of exactly `amount`, refusing to overdraw.
    pub fn withdraw(
        &self,
        goal_id: &str,
        goal_name: &str,
        kind: ContributionType,
        amount: u32,
    ) -> Result<(), RewardError> {
        if amount == 0 {
            return Err(RewardError::InvalidAmount);
        }
        let events = self.load_logged()?;
        let available = net_of(&events, Some(goal_id), kind);
        if amount as i64 > available {
            return Err(RewardError::InsufficientBalance { requested: amount, available });
        }
        self.append(NewContribution::withdrawal(goal_id, goal_name, kind, amount))
    }

    /// Zero out both nets of a goal. Each positive net is withdrawn in
    /// `u32`-sized chunks, all appended in one write. Returns the number of
    /// events appended.
    pub fn reset_goal(&self, goal_id: &str, goal_name: &str) -> Result<usize, RewardError> {
        let events = self.load_logged()?;
        let mut batch = Vec::new();
        for kind in ContributionType::ALL {
            let mut remaining = net_of(&events, Some(goal_id), kind);
            while remaining > 0 {
                let amount = u32::try_from(remaining).unwrap_or(u32::MAX);
                batch.push(NewContribution::withdrawal(goal_id, goal_name, kind, amount));
                remaining -= amount as i64;
            }
        }
        let appended = self.append_all(batch)?;
        log::debug!("reset goal {}: {} withdrawal(s) appended", goal_id, appended);
        Ok(appended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::StoreError;
    use crate::storage::MemoryStore;
    use ContributionType::{Money, Time};

    struct BrokenStore;

    impl BlobStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, StoreError> {
            Err(StoreError::Backend("quota exceeded".into()))
        }
        fn set(&self, _key: &str, _value: &[u8]) -> Result<(), StoreError> {
            Err(StoreError::Backend("quota exceeded".into()))
        }
    }

    fn ledger() -> ContributionLedger<MemoryStore, ManualClock> {
        ContributionLedger::new(MemoryStore::new(), ManualClock::new(1_000))
    }

    #[test]
    fn append_stamps_and_orders() {
        let ledger = ledger();
        ledger.append(NewContribution::deposit("books", "Books", Money, 10)).unwrap();
        ledger.clock.advance(5);
        ledger.append(NewContribution::deposit("travel", "Travel", Time, 30)).unwrap();
        let events = ledger.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].timestamp, 1_000);
        assert_eq!(events[1].timestamp, 1_005);
        assert_eq!(events[1].goal_id, "travel");
    }

    #[test]
    fn zero_amount_rejected() {
        let ledger = ledger();
        let err = ledger.append(NewContribution::deposit("books", "Books", Money, 0)).unwrap_err();
        assert!(matches!(err, RewardError::InvalidAmount));
        assert!(matches!(ledger.withdraw("books", "Books", Money, 0), Err(RewardError::InvalidAmount)));
        assert!(ledger.events().is_empty());
    }

    #[test]
    fn net_and_totals() {
        let ledger = ledger();
        ledger.append(NewContribution::deposit("books", "Books", Money, 25)).unwrap();
        ledger.append(NewContribution::deposit("books", "Books", Money, 15)).unwrap();
        ledger.append(NewContribution::deposit("stocks", "Stocks", Money, 5)).unwrap();
        ledger.append(NewContribution::deposit("books", "Books", Time, 60)).unwrap();
        ledger.withdraw("books", "Books", Money, 10).unwrap();

        assert_eq!(ledger.net_contribution("books", Money), 30);
        assert_eq!(ledger.net_contribution("books", Time), 60);
        assert_eq!(ledger.net_contribution("stocks", Money), 5);
        assert_eq!(ledger.net_contribution("nowhere", Money), 0);
        assert_eq!(ledger.total_by_type(Money), 35);
        assert_eq!(ledger.total_by_type(Time), 60);
    }

    #[test]
    fn insufficient_withdrawal_leaves_log_untouched() {
        let ledger = ledger();
        ledger.append(NewContribution::deposit("books", "Books", Money, 40)).unwrap();
        let err = ledger.withdraw("books", "Books", Money, 50).unwrap_err();
        match err {
            RewardError::InsufficientBalance { requested, available } => {
                assert_eq!((requested, available), (50, 40));
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(ledger.events().len(), 1);
        // Exact balance is allowed.
        ledger.withdraw("books", "Books", Money, 40).unwrap();
        assert_eq!(ledger.net_contribution("books", Money), 0);
    }

    #[test]
    fn reset_zeroes_and_is_idempotent() {
        let ledger = ledger();
        ledger.append(NewContribution::deposit("travel", "Travel", Money, 12)).unwrap();
        ledger.append(NewContribution::deposit("travel", "Travel", Time, 45)).unwrap();
        ledger.append(NewContribution::deposit("books", "Books", Money, 3)).unwrap();

        assert_eq!(ledger.reset_goal("travel", "Travel").unwrap(), 2);
        assert_eq!(ledger.net_contribution("travel", Money), 0);
        assert_eq!(ledger.net_contribution("travel", Time), 0);
        assert_eq!(ledger.net_contribution("books", Money), 3);
        let count = ledger.events().len();

        assert_eq!(ledger.reset_goal("travel", "Travel").unwrap(), 0);
        assert_eq!(ledger.events().len(), count);
    }

    #[test]
    fn reset_splits_nets_beyond_u32() {
        let ledger = ledger();
        ledger.append(NewContribution::deposit("house", "House", Money, u32::MAX)).unwrap();
        ledger.append(NewContribution::deposit("house", "House", Money, 10)).unwrap();
        ledger.append(NewContribution::deposit("house", "House", Time, 5)).unwrap();
        let before = ledger.events().len();

        assert_eq!(ledger.reset_goal("house", "House").unwrap(), 3);
        assert_eq!(ledger.net_contribution("house", Money), 0);
        assert_eq!(ledger.net_contribution("house", Time), 0);
        let withdrawals = ledger.events_for_goal("house");
        assert_eq!(withdrawals.len(), before + 3);
        let stamps: Vec<i64> = withdrawals[before..].iter().map(|e| e.timestamp).collect();
        assert!(stamps.iter().all(|&t| t == stamps[0]));

        assert_eq!(ledger.reset_goal("house", "House").unwrap(), 0);
        assert_eq!(ledger.events().len(), before + 3);
    }

    #[test]
    fn events_for_goal_filters_in_order() {
        let ledger = ledger();
        ledger.append(NewContribution::deposit("books", "Books", Money, 4)).unwrap();
        ledger.append(NewContribution::deposit("travel", "Travel", Money, 8)).unwrap();
        ledger.append(NewContribution::deposit("books", "Books", Time, 6)).unwrap();
        let books: Vec<u32> = ledger.events_for_goal("books").iter().map(|e| e.amount).collect();
        assert_eq!(books, vec![4, 6]);
        assert!(ledger.events_for_goal("nowhere").is_empty());
    }

    #[test]
    fn reset_skips_types_without_positive_net() {
        let ledger = ledger();
        ledger.append(NewContribution::deposit("savings", "Savings", Time, 20)).unwrap();
        assert_eq!(ledger.reset_goal("savings", "Savings").unwrap(), 1);
        let last = ledger.events().pop().unwrap();
        assert_eq!(last.contribution_type, Time);
        assert_eq!(last.amount, 20);
        assert!(last.is_withdrawal);
    }

    #[test]
    fn aggregates_in_first_appearance_order() {
        let ledger = ledger();
        ledger.append(NewContribution::deposit("stocks", "Stocks", Money, 7)).unwrap();
        ledger.append(NewContribution::deposit("books", "Books", Time, 9)).unwrap();
        ledger.append(NewContribution::deposit("stocks", "Stock Market", Time, 4)).unwrap();
        let stats = ledger.stats();
        assert_eq!(stats.total_money, 7);
        assert_eq!(stats.total_time, 13);
        assert_eq!(stats.goals.len(), 2);
        assert_eq!(stats.goals[0].goal_id, "stocks");
        assert_eq!(stats.goals[0].goal_name, "Stocks");
        assert_eq!((stats.goals[0].net_money, stats.goals[0].net_time), (7, 4));
        assert_eq!(stats.goals[1].net(Time), 9);
    }

    #[test]
    fn wire_format_matches_browser_log() {
        let store = MemoryStore::new();
        let ledger = ContributionLedger::new(&store, ManualClock::new(1_717_000_000_000));
        ledger.append(NewContribution::deposit("books", "Books", Money, 25)).unwrap();
        ledger.withdraw("books", "Books", Money, 5).unwrap();
        let raw = String::from_utf8(store.get(CONTRIBUTIONS_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(
            raw,
            concat!(
                r#"[{"goalId":"books","goalName":"Books","type":"money","amount":25,"timestamp":1717000000000},"#,
                r#"{"goalId":"books","goalName":"Books","type":"money","amount":5,"timestamp":1717000000000,"isWithdrawal":true}]"#
            )
        );
    }

    #[test]
    fn legacy_entries_without_withdrawal_flag_parse() {
        let store = MemoryStore::new();
        store
            .set(
                CONTRIBUTIONS_KEY,
                br#"[{"goalId":"robotics","goalName":"Robotics","type":"time","amount":15,"timestamp":1}]"#,
            )
            .unwrap();
        let ledger = ContributionLedger::new(store, ManualClock::new(2));
        assert_eq!(ledger.net_contribution("robotics", Time), 15);
    }

    #[test]
    fn storage_failure_surfaces_as_error() {
        let ledger = ContributionLedger::new(BrokenStore, ManualClock::new(0));
        let err = ledger.append(NewContribution::deposit("books", "Books", Money, 1)).unwrap_err();
        assert!(matches!(err, RewardError::Storage(_)));
        assert!(ledger.events().is_empty());
        assert_eq!(ledger.stats(), StatsSummary::default());
        assert!(matches!(ledger.reset_goal("books", "Books"), Err(RewardError::Storage(_))));
        assert!(matches!(ledger.withdraw("books", "Books", Money, 1), Err(RewardError::Storage(_))));
    }

    #[test]
    fn corrupt_log_is_never_overwritten() {
        let store = MemoryStore::new();
        store.set(CONTRIBUTIONS_KEY, b"not-json").unwrap();
        let ledger = ContributionLedger::new(&store, ManualClock::new(0));
        assert!(ledger.append(NewContribution::deposit("books", "Books", Money, 1)).is_err());
        assert_eq!(store.get(CONTRIBUTIONS_KEY).unwrap(), Some(b"not-json".to_vec()));
    }
}
