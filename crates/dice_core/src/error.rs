//! Unified error type for the dice engine.
//!
//! A `Context` keeps at most one error at a time — first-wins, until
//! cleared — represented here as `Option<EngineError>` with a stable
//! numeric `code()` for callers that want to match on error identity
//! without string comparison.

use thiserror::Error;

/// All error kinds the engine can surface, one variant each.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("expected {expected} at position {position}")]
    ParseExpected { expected: &'static str, position: usize },

    #[error("unexpected trailing input at position {position}: {trailing:?}")]
    ParseUnexpectedTrailing { position: usize, trailing: String },

    #[error("missing comparison operator/value for '{suffix}' at position {position}")]
    ParseMissingOperator { suffix: char, position: usize },

    #[error("arena out of memory: requested {requested}, remaining {remaining}")]
    ArenaOutOfMemory { requested: usize, remaining: usize },

    #[error("dice count {count} exceeds policy limit {limit}")]
    PolicyDiceCount { count: i64, limit: i64 },

    #[error("dice sides {sides} exceeds policy limit {limit}")]
    PolicySides { sides: i64, limit: i64 },

    #[error("invalid dice count: {count}")]
    InvalidDiceCount { count: i64 },

    #[error("invalid dice sides: {sides}")]
    InvalidDiceSides { sides: i64 },

    #[error("division by zero")]
    DivisionByZero,

    #[error("unknown custom die: {name}")]
    UnknownCustomDie { name: String },

    #[error("custom die has no sides: {name}")]
    EmptyCustomDie { name: String },

    #[error("invalid comparison operator in filter/reroll")]
    InvalidComparison,

    #[error("reroll limit exceeded (> {limit} rerolls for a single die)")]
    RerollLimitExceeded { limit: u32 },

    #[error("rng failure: {reason}")]
    RngFailure { reason: &'static str },

    #[error("not supported: {what}")]
    NotSupported { what: String },
}

impl EngineError {
    /// Stable small integer code, echoing the source's `{ code: i32, .. }`
    /// error-slot shape for callers that want a non-string discriminant.
    pub fn code(&self) -> i32 {
        match self {
            EngineError::ParseExpected { .. } => 1,
            EngineError::ParseUnexpectedTrailing { .. } => 2,
            EngineError::ParseMissingOperator { .. } => 3,
            EngineError::ArenaOutOfMemory { .. } => 4,
            EngineError::PolicyDiceCount { .. } => 5,
            EngineError::PolicySides { .. } => 6,
            EngineError::InvalidDiceCount { .. } => 7,
            EngineError::InvalidDiceSides { .. } => 8,
            EngineError::DivisionByZero => 9,
            EngineError::UnknownCustomDie { .. } => 10,
            EngineError::EmptyCustomDie { .. } => 11,
            EngineError::InvalidComparison => 12,
            EngineError::RerollLimitExceeded { .. } => 13,
            EngineError::RngFailure { .. } => 14,
            EngineError::NotSupported { .. } => 15,
        }
    }

    /// Formatted message, equivalent to the source's fixed 256-byte slot
    /// contents (callers needing a hard cap can `message().get(..256)`, but
    /// nothing in this engine truncates internally).
    pub fn message(&self) -> String {
        self.to_string()
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
