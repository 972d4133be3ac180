//! Room service errors

use thiserror::Error;
use uuid::Uuid;

use tablestakes_ledger::LedgerError;
use tablestakes_store::StoreError;
use tablestakes_types::{Money, MoneyError};

#[derive(Error, Debug)]
pub enum RoomError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Host user not found: {0}")]
    HostNotFound(Uuid),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Room {0} is already closed")]
    AlreadyClosed(Uuid),

    #[error("Settlement requires at least one declared result")]
    EmptyResults,

    #[error("Declared results do not reconcile, residual {residual}")]
    Unreconciled { residual: Money },

    #[error("Declared income {income} for player {player_id} converts to zero chips at the room's rate")]
    IncomeTooSmall { player_id: Uuid, income: Money },

    #[error("Room changed concurrently: {0}")]
    ConcurrentUpdate(String),

    #[error("Exchange rate must be positive, got {0}")]
    InvalidExchangeRate(Money),

    #[error("Room key must be exactly four digits")]
    InvalidRoomKey,

    #[error("The host role cannot be changed")]
    HostImmutable,

    #[error("Player {0} is not linked to a user")]
    NotUserLinked(Uuid),

    #[error("User is already seated in this room")]
    AlreadySeated,

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Money(#[from] MoneyError),

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for RoomError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => RoomError::NotFound(what),
            StoreError::RoomClosed(id) => RoomError::AlreadyClosed(id),
            StoreError::Conflict(msg) => RoomError::ConcurrentUpdate(msg),
            StoreError::Duplicate(_) => RoomError::AlreadySeated,
            other => RoomError::Store(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, RoomError>;
