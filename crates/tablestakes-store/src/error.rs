//! Store error types

use thiserror::Error;
use uuid::Uuid;

use tablestakes_types::Money;

/// Persistence layer errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("migration error: {0}")]
    Migration(String),

    #[error("query error: {0}")]
    Query(#[from] sqlx::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("duplicate: {0}")]
    Duplicate(String),

    /// Optimistic-concurrency check failed; the caller validated
    /// against a snapshot another writer has since moved past.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Write rejected because the room's ledger is sealed.
    #[error("room {0} is closed")]
    RoomClosed(Uuid),

    /// Cash-out rejected against the balance folded under the room's
    /// row lock.
    #[error("insufficient chips: requested {requested}, available {available}")]
    InsufficientChips {
        requested: Money,
        available: Money,
    },

    #[error("row decode error: {0}")]
    Decode(String),
}

impl StoreError {
    /// Translate PostgreSQL unique violations into [`StoreError::Duplicate`].
    pub(crate) fn from_insert(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db) = err {
            if db.code().as_deref() == Some("23505") {
                return StoreError::Duplicate(what.to_string());
            }
        }
        StoreError::Query(err)
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
