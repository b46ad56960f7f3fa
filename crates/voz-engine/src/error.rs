//! Turn-level error types.
//!
//! Most failure modes of a turn are *conversational* - a rejected
//! extraction, an unresolvable payment method, an ambiguous reference - and
//! those are reported as [`crate::AckData`] values so the caller can ask a
//! clarifying question. `EngineError` is reserved for conditions the
//! conversation cannot recover from by itself.

use thiserror::Error;

use voz_db::DbError;

/// Infrastructure-level turn failures.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The daily-ordinal race lost twice in a row (the writer already
    /// retried once with a fresh ordinal).
    #[error("Concurrent sale creation conflict, retry the turn")]
    ConcurrencyConflict,

    /// Store-level failure (connection, migration, query).
    #[error("Database error: {0}")]
    Db(DbError),
}

impl From<DbError> for EngineError {
    fn from(err: DbError) -> Self {
        if err.is_unique_violation() {
            EngineError::ConcurrencyConflict
        } else {
            EngineError::Db(err)
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
