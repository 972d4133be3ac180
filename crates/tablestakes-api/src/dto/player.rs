//! Player DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use tablestakes_types::{Money, Player, PlayerRole, Seat};

use super::exchange::ExchangeResponse;

/// Seat a player in a room. `user_id` is absent for walk-in guests.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlayerRequest {
    pub room_id: Uuid,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[validate(length(min = 1, max = 64, message = "name must be 1-64 characters"))]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResponse {
    pub id: Uuid,
    pub room_id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub role: PlayerRole,
    pub created_at: DateTime<Utc>,
}

impl From<Player> for PlayerResponse {
    fn from(player: Player) -> Self {
        Self {
            id: player.id,
            room_id: player.room_id,
            user_id: player.user_id,
            name: player.name,
            role: player.role,
            created_at: player.created_at,
        }
    }
}

/// A seat with its exchange history, as embedded in room responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatResponse {
    #[serde(flatten)]
    pub player: PlayerResponse,
    pub username: Option<String>,
    pub exchanges: Vec<ExchangeResponse>,
}

impl SeatResponse {
    pub fn from_seat(seat: Seat) -> Self {
        let room_id = seat.player.room_id;
        Self {
            username: seat.user.map(|u| u.username),
            exchanges: seat
                .exchanges
                .into_iter()
                .map(|e| ExchangeResponse::from_exchange(e, room_id))
                .collect(),
            player: seat.player.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub balance: Money,
}
