// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Dopamine Rewards Engine - Amount Settings

use serde::{Deserialize, Serialize};

use crate::amounts::{generate_log_values, AMOUNT_VALUE_COUNT};
use crate::error::{ConfigError, RewardError};
use crate::storage::{read_json, write_json, BlobStore, SETTINGS_KEY};
use crate::types::ContributionType;

/// User-tunable bounds of the amount spinner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AmountSettings {
    pub money_min: u32,
    pub money_max: u32,
    pub time_min: u32,
    pub time_max: u32,
}

impl Default for AmountSettings {
    fn default() -> Self {
        Self { money_min: 1, money_max: 100, time_min: 1, time_max: 120 }
    }
}

impl AmountSettings {
    pub fn range(&self, kind: ContributionType) -> (u32, u32) {
        match kind {
            ContributionType::Money => (self.money_min, self.money_max),
            ContributionType::Time => (self.time_min, self.time_max),
        }
    }

    /// Both ranges need `min > 0` and `max > min`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, min, max) in [
            ("money", self.money_min, self.money_max),
            ("time", self.time_min, self.time_max),
        ] {
            if min == 0 || max <= min {
                return Err(ConfigError::InvalidRange { field, min, max });
            }
        }
        Ok(())
    }

    /// Clamp into a valid shape: `min ≥ 1`, `max ≥ min + 1`.
    pub fn sanitized(&self) -> Self {
        let money_min = self.money_min.max(1);
        let time_min = self.time_min.max(1);
        Self {
            money_min,
            money_max: self.money_max.max(money_min.saturating_add(1)),
            time_min,
            time_max: self.time_max.max(time_min.saturating_add(1)),
        }
    }
}

/// Settings persisted under [`SETTINGS_KEY`].
pub struct SettingsStore<S: BlobStore> {
    store: S,
}

impl<S: BlobStore> SettingsStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Stored settings, or the defaults when none are stored or the blob
    /// cannot be read.
    pub fn get_settings(&self) -> AmountSettings {
        match read_json::<AmountSettings>(&self.store, SETTINGS_KEY) {
            Ok(Some(settings)) => settings,
            Ok(None) => AmountSettings::default(),
            Err(e) => {
                log::error!("Failed to get settings: {}", e);
                AmountSettings::default()
            }
        }
    }

    pub fn save_settings(&self, settings: &AmountSettings) -> Result<(), RewardError> {
        settings.validate()?;
        write_json(&self.store, SETTINGS_KEY, settings).map_err(|e| {
            log::error!("Failed to save settings: {}", e);
            RewardError::from(e)
        })
    }

    /// Settings-form save: clamp into shape, persist, and return what was
    /// stored.
    pub fn save_sanitized(&self, settings: &AmountSettings) -> Result<AmountSettings, RewardError> {
        let fixed = settings.sanitized();
        if fixed != *settings {
            log::debug!("settings normalised from {:?} to {:?}", settings, fixed);
        }
        self.save_settings(&fixed)?;
        Ok(fixed)
    }

    pub fn reset_settings(&self) -> Result<(), RewardError> {
        self.save_settings(&AmountSettings::default())
    }

    /// Spinner values for `kind` under the current settings.
    pub fn amount_values(&self, kind: ContributionType) -> Result<Vec<u32>, RewardError> {
        let (min, max) = self.get_settings().range(kind);
        generate_log_values(min, max, AMOUNT_VALUE_COUNT)
    }
}
