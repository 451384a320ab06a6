use thiserror::Error;

use crate::api::ApiError;

/// Errors that can arise while mutating or persisting LifeVerse game state.
#[derive(Debug, Error)]
pub enum LifeVerseError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Snapshot (de)serialization errors.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Record service value (de)serialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Wrapper around IO errors (directory creation, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when an entity id does not resolve.
    #[error("not found: {0}")]
    NotFound(String),

    /// Returned when inserting an entity whose id is already taken.
    #[error("duplicate id: {0}")]
    DuplicateId(String),

    /// Spending more coins than the user holds.
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },

    /// Level gate (world unlocks).
    #[error("level {required} required (current level {current})")]
    LevelTooLow { required: u32, current: u32 },

    /// Action not allowed in the entity's current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Caller supplied a value outside the accepted range.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The external record service rejected or failed a request.
    #[error("record service: {0}")]
    Api(#[from] ApiError),

    /// Internal error (poisoned locks, unexpected conditions)
    #[error("internal error: {0}")]
    Internal(String),
}
