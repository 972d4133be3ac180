//! Player records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Role a player holds within one room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerRole {
    /// Room creator. Assigned once, never changed.
    Host,
    /// Promoted by the host; may close the room.
    Admin,
    Player,
}

impl PlayerRole {
    pub fn as_str(self) -> &'static str {
        match self {
            PlayerRole::Host => "host",
            PlayerRole::Admin => "admin",
            PlayerRole::Player => "player",
        }
    }
}

impl fmt::Display for PlayerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlayerRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "host" => Ok(PlayerRole::Host),
            "admin" => Ok(PlayerRole::Admin),
            "player" => Ok(PlayerRole::Player),
            other => Err(format!("unknown player role: {other}")),
        }
    }
}

/// A participant's membership in one room.
///
/// `user_id` is optional: a seat may be created for someone without an
/// account and claimed later. At most one player per (user, room).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: Uuid,
    pub room_id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub role: PlayerRole,
    pub created_at: DateTime<Utc>,
}
