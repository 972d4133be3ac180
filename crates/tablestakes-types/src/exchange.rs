//! Exchange ledger entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::Money;

/// Direction of a chip/cash exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeDirection {
    /// Cash in, chips out.
    BuyIn,
    /// Chips in, cash out.
    CashOut,
}

impl ExchangeDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            ExchangeDirection::BuyIn => "buyin",
            ExchangeDirection::CashOut => "cashout",
        }
    }
}

impl fmt::Display for ExchangeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExchangeDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buyin" => Ok(ExchangeDirection::BuyIn),
            "cashout" => Ok(ExchangeDirection::CashOut),
            other => Err(format!("unknown exchange direction: {other}")),
        }
    }
}

/// One immutable ledger entry. The ledger is append-only: entries are
/// never updated or deleted, and balances are always derived folds
/// over the full history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub id: Uuid,
    pub player_id: Uuid,
    pub direction: ExchangeDirection,
    /// Chips moved, always positive; the direction carries the sign.
    pub chip_amount: Money,
    /// Cash moved at the room's rate when the entry was created.
    pub cash_amount: Money,
    pub created_at: DateTime<Utc>,
}

/// A ledger entry about to be appended (id and timestamp assigned by
/// the store).
#[derive(Debug, Clone, PartialEq)]
pub struct NewExchange {
    pub player_id: Uuid,
    pub direction: ExchangeDirection,
    pub chip_amount: Money,
    pub cash_amount: Money,
}
