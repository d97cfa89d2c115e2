// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Dopamine Rewards Engine - Timeline Scheduler
//
// Deterministic stand-in for `setTimeout` chains. Events are scheduled with
// `after(delay, event)` relative to the timeline's current time and released
// by `advance_to(now)`. Jumping far ahead releases every intermediate event at
// its exact due time, so tests fast-forward without sleeping.

#[derive(Debug, Clone)]
struct Scheduled<E> {
    due_ms: u64,
    seq: u64,
    event: E,
}

#[derive(Debug, Clone)]
pub struct Timeline<E> {
    now_ms: u64,
    next_seq: u64,
    pending: Vec<Scheduled<E>>,
}

impl<E> Default for Timeline<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Timeline<E> {
    pub fn new() -> Self {
        Self { now_ms: 0, next_seq: 0, pending: Vec::new() }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Move the clock without releasing anything. Only forward moves apply.
    pub fn sync(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }

    /// Schedule `event` to fire `delay_ms` after the current time.
    pub fn after(&mut self, delay_ms: u64, event: E) {
        let due_ms = self.now_ms.saturating_add(delay_ms);
        self.pending.push(Scheduled { due_ms, seq: self.next_seq, event });
        self.next_seq += 1;
    }

    /// Release the earliest event due at or before `now_ms`, advancing the
    /// clock to its due time. Events scheduled while handling it are
    /// considered on the next call, which is how chained delays resolve
    /// within a single fast-forward.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(u64, E)> {
        let position = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, s)| s.due_ms <= now_ms)
            .min_by_key(|(_, s)| (s.due_ms, s.seq))
            .map(|(i, _)| i)?;
        let scheduled = self.pending.remove(position);
        self.now_ms = self.now_ms.max(scheduled.due_ms);
        Some((scheduled.due_ms, scheduled.event))
    }

    /// Release every event due at or before `now_ms`, in due order (FIFO on
    /// ties), then move the clock to `now_ms`.
    pub fn advance_to(&mut self, now_ms: u64) -> Vec<(u64, E)> {
        let mut fired = Vec::new();
        while let Some(entry) = self.pop_due(now_ms) {
            fired.push(entry);
        }
        self.sync(now_ms);
        fired
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn releases_in_due_order() {
        let mut t = Timeline::new();
        t.after(300, "c");
        t.after(100, "a");
        t.after(200, "b");
        let fired: Vec<_> = t.advance_to(1000).into_iter().map(|(_, e)| e).collect();
        assert_eq!(fired, vec!["a", "b", "c"]);
        assert!(t.is_empty());
        assert_eq!(t.now_ms(), 1000);
    }

    #[test]
    fn ties_fire_fifo() {
        let mut t = Timeline::new();
        t.after(50, 1);
        t.after(50, 2);
        t.after(50, 3);
        let fired: Vec<_> = t.advance_to(50).into_iter().map(|(_, e)| e).collect();
        assert_eq!(fired, vec![1, 2, 3]);
    }

    #[test]
    fn nothing_fires_early() {
        let mut t = Timeline::new();
        t.after(500, ());
        assert!(t.advance_to(499).is_empty());
        assert_eq!(t.len(), 1);
        assert_eq!(t.advance_to(500).len(), 1);
    }

    #[test]
    fn chained_delays_resolve_at_due_times() {
        let mut t = Timeline::new();
        t.after(500, 0u32);
        let mut seen = Vec::new();
        while let Some((due, step)) = t.pop_due(10_000) {
            seen.push((due, step));
            if step < 2 {
                t.after(1000, step + 1);
            }
        }
        assert_eq!(seen, vec![(500, 0), (1500, 1), (2500, 2)]);
    }

    #[test]
    fn cancel_drops_pending() {
        let mut t = Timeline::new();
        t.after(10, "x");
        t.cancel_all();
        assert!(t.advance_to(100).is_empty());
    }

    #[test]
    fn clock_never_moves_backward() {
        let mut t: Timeline<()> = Timeline::new();
        t.sync(400);
        t.sync(100);
        assert_eq!(t.now_ms(), 400);
    }
}
