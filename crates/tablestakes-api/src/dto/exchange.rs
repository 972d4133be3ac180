//! Exchange DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tablestakes_types::{Exchange, ExchangeDirection, Money};

/// Record one exchange.
///
/// `amount` is cash for a buy-in and chips for a cash-out; the other
/// leg is derived from the room's rate.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExchangeRequest {
    pub room_id: Uuid,
    pub player_id: Uuid,
    pub amount: Money,
    pub direction: ExchangeDirection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeResponse {
    pub id: Uuid,
    pub room_id: Uuid,
    pub player_id: Uuid,
    pub direction: ExchangeDirection,
    pub chip_amount: Money,
    pub cash_amount: Money,
    pub created_at: DateTime<Utc>,
}

impl ExchangeResponse {
    pub fn from_exchange(exchange: Exchange, room_id: Uuid) -> Self {
        Self {
            id: exchange.id,
            room_id,
            player_id: exchange.player_id,
            direction: exchange.direction,
            chip_amount: exchange.chip_amount,
            cash_amount: exchange.cash_amount,
            created_at: exchange.created_at,
        }
    }
}
