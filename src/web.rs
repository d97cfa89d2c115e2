// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Dopamine Rewards Engine - Browser Interface
//
// `RewardClient` is what the page holds. It forwards animation frames into
// the game session and hands back serialisable frames; persistence goes to
// `window.localStorage`.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use wasm_bindgen::prelude::*;

use crate::clock::SystemClock;
use crate::error::{RewardError, StoreError};
use crate::game::{GameSession, RollStart};
use crate::settings::AmountSettings;
use crate::storage::BlobStore;
use crate::types::ContributionType;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = localStorage, js_name = getItem)]
    fn local_storage_get(key: &str) -> Result<Option<String>, JsValue>;

    #[wasm_bindgen(catch, js_namespace = localStorage, js_name = setItem)]
    fn local_storage_set(key: &str, value: &str) -> Result<(), JsValue>;
}

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("[dopamine] engine loaded");
}

fn js_failure(e: JsValue) -> StoreError {
    StoreError::Backend(e.as_string().unwrap_or_else(|| format!("{:?}", e)))
}

fn to_js(e: RewardError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn parse_kind(kind: &str) -> Result<ContributionType, JsValue> {
    ContributionType::parse(kind).ok_or_else(|| JsValue::from_str(&format!("unknown contribution type '{}'", kind)))
}

// ─── localStorage ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserStore;

impl BlobStore for BrowserStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        local_storage_get(key)
            .map(|value| value.map(String::into_bytes))
            .map_err(js_failure)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let text = std::str::from_utf8(value).map_err(|e| StoreError::Backend(e.to_string()))?;
        local_storage_set(key, text).map_err(js_failure)
    }
}

// ─── Client ─────────────────────────────────────────────────────────────────

#[wasm_bindgen]
pub struct RewardClient {
    session: GameSession<BrowserStore, SystemClock>,
}

#[wasm_bindgen]
impl RewardClient {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            session: GameSession::new(BrowserStore, SystemClock, ChaCha8Rng::from_entropy()),
        }
    }

    /// `true` when a roll started, `false` when it was ignored.
    pub fn roll(&mut self, now_ms: f64) -> Result<bool, JsValue> {
        match self.session.roll(now_ms as u64) {
            Ok(RollStart::Rolling) => Ok(true),
            Ok(RollStart::Ignored) => Ok(false),
            Err(e) if e.is_silent() => Ok(false),
            Err(e) => Err(to_js(e)),
        }
    }

    /// Call once per `requestAnimationFrame` with its timestamp.
    pub fn tick(&mut self, now_ms: f64) -> JsValue {
        let frame = self.session.tick(now_ms as u64);
        serde_wasm_bindgen::to_value(&frame).unwrap_or(JsValue::NULL)
    }

    pub fn acknowledge(&mut self) -> JsValue {
        match self.session.acknowledge() {
            Some(commitment) => serde_wasm_bindgen::to_value(&commitment).unwrap_or(JsValue::NULL),
            None => JsValue::NULL,
        }
    }

    /// The component unmounted; pending timers never fire.
    pub fn teardown(&mut self) {
        self.session.teardown();
    }

    pub fn goals(&self) -> JsValue {
        serde_wasm_bindgen::to_value(self.session.goals()).unwrap_or(JsValue::NULL)
    }

    pub fn get_settings(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.session.settings().get_settings()).unwrap_or(JsValue::NULL)
    }

    /// Save from the settings form. Ranges are clamped first; the stored
    /// settings are returned.
    pub fn save_settings(&self, settings: JsValue) -> Result<JsValue, JsValue> {
        let settings: AmountSettings = serde_wasm_bindgen::from_value(settings)?;
        let stored = self.session.settings().save_sanitized(&settings).map_err(to_js)?;
        Ok(serde_wasm_bindgen::to_value(&stored)?)
    }

    pub fn reset_settings(&self) -> Result<(), JsValue> {
        self.session.settings().reset_settings().map_err(to_js)
    }

    pub fn amount_values(&self, kind: &str) -> Result<Vec<u32>, JsValue> {
        self.session.settings().amount_values(parse_kind(kind)?).map_err(to_js)
    }

    pub fn get_stats(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.session.ledger().stats()).unwrap_or(JsValue::NULL)
    }

    pub fn get_contributions(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.session.ledger().events()).unwrap_or(JsValue::NULL)
    }

    pub fn get_goal_contributions(&self, goal_id: &str) -> JsValue {
        serde_wasm_bindgen::to_value(&self.session.ledger().events_for_goal(goal_id)).unwrap_or(JsValue::NULL)
    }

    pub fn withdraw(&self, goal_id: &str, goal_name: &str, kind: &str, amount: u32) -> Result<(), JsValue> {
        self.session
            .ledger()
            .withdraw(goal_id, goal_name, parse_kind(kind)?, amount)
            .map_err(to_js)
    }

    /// Number of withdrawals appended.
    pub fn reset_goal(&self, goal_id: &str, goal_name: &str) -> Result<u32, JsValue> {
        self.session
            .ledger()
            .reset_goal(goal_id, goal_name)
            .map(|n| n as u32)
            .map_err(to_js)
    }
}

impl Default for RewardClient {
    fn default() -> Self {
        Self::new()
    }
}
