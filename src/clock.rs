// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Dopamine Rewards Engine - Wall Clock
//
// Timestamps for ledger events. Animation time is host-driven and does not
// go through this trait.

use std::cell::Cell;

pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_millis(&self) -> i64 {
        (**self).now_millis()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[cfg(not(target_arch = "wasm32"))]
impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

#[cfg(target_arch = "wasm32")]
mod js_date {
    use wasm_bindgen::prelude::*;

    #[wasm_bindgen]
    extern "C" {
        #[wasm_bindgen(js_namespace = Date, js_name = now)]
        pub fn date_now() -> f64;
    }
}

#[cfg(target_arch = "wasm32")]
impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        js_date::date_now() as i64
    }
}

/// Settable clock for tests and replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<i64>,
}

impl ManualClock {
    pub fn new(start_millis: i64) -> Self {
        Self { now: Cell::new(start_millis) }
    }

    pub fn set(&self, millis: i64) {
        self.now.set(millis);
    }

    pub fn advance(&self, millis: i64) {
        self.now.set(self.now.get() + millis);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(1_700_000_000_000);
        clock.advance(250);
        assert_eq!((&clock).now_millis(), 1_700_000_000_250);
        clock.set(5);
        assert_eq!(clock.now_millis(), 5);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now_millis() > 1_577_836_800_000);
    }
}
