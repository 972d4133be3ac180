//! Room DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use tablestakes_types::{Currency, Money, RoomAggregate, RoomStatus};

use super::player::SeatResponse;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    #[validate(length(min = 1, max = 64, message = "name must be 1-64 characters"))]
    pub name: String,
    pub exchange_rate: Money,
    #[serde(default)]
    pub currency: Currency,
    #[serde(default)]
    pub base_buy_in: Option<Money>,
    #[serde(default = "default_visible")]
    pub is_visible: bool,
    #[serde(default)]
    pub room_key: Option<String>,
    /// Display name for the host's seat; defaults to the username.
    #[serde(default)]
    pub host_name: Option<String>,
}

fn default_visible() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomResponse {
    pub id: Uuid,
    pub name: String,
    pub status: RoomStatus,
    pub exchange_rate: Money,
    pub currency: Currency,
    pub base_buy_in: Money,
    pub is_visible: bool,
    pub has_room_key: bool,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub players: Vec<SeatResponse>,
}

impl From<RoomAggregate> for RoomResponse {
    fn from(aggregate: RoomAggregate) -> Self {
        let room = aggregate.room;
        Self {
            id: room.id,
            name: room.name,
            status: room.status,
            exchange_rate: room.exchange_rate,
            currency: room.currency,
            base_buy_in: room.base_buy_in,
            is_visible: room.is_visible,
            has_room_key: room.room_key.is_some(),
            version: room.version,
            created_at: room.created_at,
            players: aggregate
                .seats
                .into_iter()
                .map(SeatResponse::from_seat)
                .collect(),
        }
    }
}

/// Bare room summary for list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: Uuid,
    pub name: String,
    pub status: RoomStatus,
    pub currency: Currency,
    pub is_visible: bool,
    pub created_at: DateTime<Utc>,
}

impl From<tablestakes_types::Room> for RoomSummary {
    fn from(room: tablestakes_types::Room) -> Self {
        Self {
            id: room.id,
            name: room.name,
            status: room.status,
            currency: room.currency,
            is_visible: room.is_visible,
            created_at: room.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomQuery {
    #[serde(default)]
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateKeyRequest {
    pub room_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateKeyResponse {
    pub valid: bool,
}
