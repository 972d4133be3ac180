//! Tablestakes Exchange Ledger
//!
//! Every chip movement in a room is an immutable exchange row: a
//! buy-in converts cash to chips at the room's rate, a cash-out
//! converts chips back. Balances are never stored; they are folded
//! from history, so the ledger is:
//!
//! - Append-only (rows are never updated or deleted)
//! - Rate-scoped (conversions always use the owning room's rate)
//! - Validated up front (a rejected exchange writes nothing)
//!
//! # Invariants
//!
//! 1. A cash-out never exceeds the player's current chip balance
//! 2. No exchanges against closed rooms
//! 3. Amounts are strictly positive

use thiserror::Error;
use uuid::Uuid;

use tablestakes_store::{Store, StoreError};
use tablestakes_types::{Exchange, ExchangeDirection, Money, MoneyError, NewExchange, Room};

/// Errors that can occur in ledger operations
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Room not found: {0}")]
    RoomNotFound(Uuid),

    #[error("Player not found: {0}")]
    PlayerNotFound(Uuid),

    #[error("Player {player_id} does not belong to room {room_id}")]
    WrongRoom { player_id: Uuid, room_id: Uuid },

    #[error("Room {0} is closed")]
    RoomClosed(Uuid),

    #[error("Exchange amount must be positive, got {0}")]
    NonPositiveAmount(Money),

    #[error("Insufficient chips: requested {requested}, available {available}")]
    InsufficientChips {
        requested: Money,
        available: Money,
    },

    #[error(transparent)]
    Money(#[from] MoneyError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Fold a player's exchange history into a chip balance.
///
/// Empty history folds to zero; the fold itself cannot fail for
/// amounts that passed the recording guards, so overflow is surfaced
/// as an error only at the edges.
pub fn chip_balance(history: &[Exchange]) -> Result<Money> {
    history.iter().try_fold(Money::ZERO, |acc, e| {
        let next = match e.direction {
            ExchangeDirection::BuyIn => acc.checked_add(e.chip_amount)?,
            ExchangeDirection::CashOut => acc.checked_sub(e.chip_amount)?,
        };
        Ok(next)
    })
}

/// Fold a set of exchanges into the cash the bank has taken in:
/// buy-in cash minus cash-out cash.
pub fn cash_balance(history: &[Exchange]) -> Result<Money> {
    history.iter().try_fold(Money::ZERO, |acc, e| {
        let next = match e.direction {
            ExchangeDirection::BuyIn => acc.checked_add(e.cash_amount)?,
            ExchangeDirection::CashOut => acc.checked_sub(e.cash_amount)?,
        };
        Ok(next)
    })
}

/// Convert a requested amount at the room's rate.
///
/// A buy-in is denominated in cash, a cash-out in chips; the other
/// leg is derived from the rate.
pub fn convert(room: &Room, amount: Money, direction: ExchangeDirection) -> Result<(Money, Money)> {
    match direction {
        ExchangeDirection::BuyIn => {
            let chips = amount.to_chips(room.exchange_rate)?;
            Ok((chips, amount))
        }
        ExchangeDirection::CashOut => {
            let cash = amount.to_cash(room.exchange_rate)?;
            Ok((amount, cash))
        }
    }
}

/// The exchange ledger service.
///
/// Validates each requested exchange against the current room and
/// player state, then hands the append to the store, which re-checks
/// room status and the cash-out chip balance under its row lock.
/// Validation failures write nothing.
#[derive(Clone)]
pub struct ExchangeLedger {
    store: Store,
}

impl ExchangeLedger {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Record one exchange for a player.
    ///
    /// `amount` is cash for a buy-in and chips for a cash-out.
    pub async fn record_exchange(
        &self,
        room_id: Uuid,
        player_id: Uuid,
        amount: Money,
        direction: ExchangeDirection,
    ) -> Result<Exchange> {
        let room = self
            .store
            .rooms
            .find(room_id)
            .await?
            .ok_or(LedgerError::RoomNotFound(room_id))?;

        let player = self
            .store
            .players
            .find(player_id)
            .await?
            .ok_or(LedgerError::PlayerNotFound(player_id))?;

        if player.room_id != room.id {
            return Err(LedgerError::WrongRoom { player_id, room_id });
        }
        if room.is_closed() {
            return Err(LedgerError::RoomClosed(room_id));
        }
        if !amount.is_positive() {
            return Err(LedgerError::NonPositiveAmount(amount));
        }

        let (chip_amount, cash_amount) = convert(&room, amount, direction)?;
        // The derived leg must not round down to nothing.
        if !chip_amount.is_positive() || !cash_amount.is_positive() {
            return Err(LedgerError::NonPositiveAmount(amount));
        }

        let entry = NewExchange {
            player_id: player.id,
            direction,
            chip_amount,
            cash_amount,
        };
        // The overdraw check lives in the store so it runs against
        // the balance as of the append itself, not a stale read.
        let exchange = self
            .store
            .exchanges
            .append(room_id, &entry)
            .await
            .map_err(|err| match err {
                StoreError::InsufficientChips {
                    requested,
                    available,
                } => LedgerError::InsufficientChips {
                    requested,
                    available,
                },
                other => LedgerError::Store(other),
            })?;

        tracing::debug!(
            room_id = %room_id,
            player_id = %player_id,
            direction = %direction,
            chips = %chip_amount,
            cash = %cash_amount,
            "recorded exchange"
        );

        Ok(exchange)
    }

    /// Current chip balance of a player. Unknown players have no
    /// history and fold to zero.
    pub async fn player_chip_balance(&self, player_id: Uuid) -> Result<Money> {
        let history = self.store.exchanges.list_by_player(player_id).await?;
        chip_balance(&history)
    }

    /// Net cash held by the room's bank across all players.
    pub async fn room_cash_balance(&self, room_id: Uuid) -> Result<Money> {
        let history = self.store.exchanges.list_by_room(room_id).await?;
        cash_balance(&history)
    }

    /// Full exchange history of a player, in insertion order.
    pub async fn player_history(&self, player_id: Uuid) -> Result<Vec<Exchange>> {
        Ok(self.store.exchanges.list_by_player(player_id).await?)
    }
}
