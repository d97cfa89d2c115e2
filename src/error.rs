// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Dopamine Rewards Engine - Error Types

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Rejected configuration: the operation is aborted before any state changes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("candidate set is empty")]
    EmptyCandidates,

    #[error("degenerate range: {count} values requested between {min} and {max}")]
    DegenerateRange { min: u32, max: u32, count: usize },

    #[error("invalid {field} range: max ({max}) must be greater than min ({min})")]
    InvalidRange { field: &'static str, min: u32, max: u32 },

    #[error("invalid spin configuration: {0}")]
    InvalidSpin(&'static str),
}

// ---------------------------------------------------------------------------
// Storage errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed stored data: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage backend error: {0}")]
    Backend(String),
}

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RewardError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("cannot withdraw more than available ({available})")]
    InsufficientBalance { requested: u32, available: i64 },

    #[error("amount must be greater than 0")]
    InvalidAmount,

    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),

    #[error("animation interrupted")]
    AnimationInterrupted,
}

impl RewardError {
    /// Errors that the host surface is expected to swallow silently.
    pub fn is_silent(&self) -> bool {
        matches!(self, RewardError::AnimationInterrupted)
    }
}
