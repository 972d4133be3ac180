//! Room records and aggregate views

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{Currency, Exchange, Money, Player, PlayerRole, User};

/// Lifecycle status of a room. The only transition is Opened -> Closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Opened,
    Closed,
}

impl RoomStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RoomStatus::Opened => "opened",
            RoomStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "opened" => Ok(RoomStatus::Opened),
            "closed" => Ok(RoomStatus::Closed),
            other => Err(format!("unknown room status: {other}")),
        }
    }
}

/// One poker session with its own chip-to-cash exchange rate.
///
/// `version` is an optimistic-concurrency counter: every ledger append
/// and the close transition bump it, so a close validated against a
/// stale snapshot is rejected at write time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: Uuid,
    pub name: String,
    pub status: RoomStatus,
    /// Chips issued per cash unit. Always positive.
    pub exchange_rate: Money,
    pub currency: Currency,
    pub base_buy_in: Money,
    pub is_visible: bool,
    /// Optional 4-digit join key.
    pub room_key: Option<String>,
    /// Opaque secret granting access to invisible rooms.
    pub access_token: String,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

impl Room {
    pub fn is_closed(&self) -> bool {
        self.status == RoomStatus::Closed
    }
}

/// A player together with the linked user and full exchange history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seat {
    pub player: Player,
    pub user: Option<User>,
    /// Exchange history in insertion order.
    pub exchanges: Vec<Exchange>,
}

/// A room loaded with all players, their users and exchange histories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomAggregate {
    pub room: Room,
    pub seats: Vec<Seat>,
}

impl RoomAggregate {
    /// The host seat. Every room is created with exactly one.
    pub fn host(&self) -> Option<&Seat> {
        self.seats.iter().find(|s| s.player.role == PlayerRole::Host)
    }

    pub fn seat_for_player(&self, player_id: Uuid) -> Option<&Seat> {
        self.seats.iter().find(|s| s.player.id == player_id)
    }

    pub fn seat_for_user(&self, user_id: Uuid) -> Option<&Seat> {
        self.seats
            .iter()
            .find(|s| s.player.user_id == Some(user_id))
    }

    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.seat_for_user(user_id).is_some()
    }

    /// True when `user_id` holds the Host or an Admin seat, the
    /// authority required for close and other room mutations.
    pub fn can_manage(&self, user_id: Uuid) -> bool {
        self.seats.iter().any(|s| {
            s.player.user_id == Some(user_id)
                && matches!(s.player.role, PlayerRole::Host | PlayerRole::Admin)
        })
    }
}
