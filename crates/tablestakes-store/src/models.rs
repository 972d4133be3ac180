//! Row models mapped from PostgreSQL tables
//!
//! Monetary columns come back as `*_minor` BIGINT and are lifted into
//! [`Money`]; enum columns come back as TEXT and are parsed into their
//! domain enums. Parsing failures surface as [`StoreError::Decode`],
//! never as silent defaults.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use tablestakes_types::{
    Currency, Exchange, ExchangeDirection, Money, Player, PlayerRole, Room, RoomStatus, User,
};

use crate::StoreError;

#[derive(Debug, Clone, FromRow)]
pub struct DbRoom {
    pub id: Uuid,
    pub name: String,
    pub status: String,
    pub exchange_rate_minor: i64,
    pub currency: String,
    pub base_buy_in_minor: i64,
    pub is_visible: bool,
    pub room_key: Option<String>,
    pub access_token: String,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbRoom> for Room {
    type Error = StoreError;

    fn try_from(row: DbRoom) -> Result<Self, Self::Error> {
        Ok(Room {
            id: row.id,
            name: row.name,
            status: row.status.parse::<RoomStatus>().map_err(StoreError::Decode)?,
            exchange_rate: Money::from_minor(row.exchange_rate_minor),
            currency: row.currency.parse::<Currency>().map_err(StoreError::Decode)?,
            base_buy_in: Money::from_minor(row.base_buy_in_minor),
            is_visible: row.is_visible,
            room_key: row.room_key,
            access_token: row.access_token,
            version: row.version,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbPlayer {
    pub id: Uuid,
    pub room_id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbPlayer> for Player {
    type Error = StoreError;

    fn try_from(row: DbPlayer) -> Result<Self, Self::Error> {
        Ok(Player {
            id: row.id,
            room_id: row.room_id,
            user_id: row.user_id,
            name: row.name,
            role: row.role.parse::<PlayerRole>().map_err(StoreError::Decode)?,
            created_at: row.created_at,
        })
    }
}

/// Player row with its user joined in (LEFT JOIN, so the `u_*`
/// columns are nullable).
#[derive(Debug, Clone, FromRow)]
pub struct DbSeatRow {
    pub id: Uuid,
    pub room_id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub u_username: Option<String>,
    pub u_password_hash: Option<String>,
    pub u_created_at: Option<DateTime<Utc>>,
}

impl DbSeatRow {
    pub fn into_parts(self) -> Result<(Player, Option<User>), StoreError> {
        let user = match (self.user_id, self.u_username, self.u_created_at) {
            (Some(id), Some(username), Some(created_at)) => Some(User {
                id,
                username,
                password_hash: self.u_password_hash.unwrap_or_default(),
                created_at,
            }),
            _ => None,
        };
        let player = Player {
            id: self.id,
            room_id: self.room_id,
            user_id: self.user_id,
            name: self.name,
            role: self.role.parse::<PlayerRole>().map_err(StoreError::Decode)?,
            created_at: self.created_at,
        };
        Ok((player, user))
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbExchange {
    pub id: Uuid,
    pub player_id: Uuid,
    pub direction: String,
    pub chip_amount_minor: i64,
    pub cash_amount_minor: i64,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbExchange> for Exchange {
    type Error = StoreError;

    fn try_from(row: DbExchange) -> Result<Self, Self::Error> {
        Ok(Exchange {
            id: row.id,
            player_id: row.player_id,
            direction: row
                .direction
                .parse::<ExchangeDirection>()
                .map_err(StoreError::Decode)?,
            chip_amount: Money::from_minor(row.chip_amount_minor),
            cash_amount: Money::from_minor(row.cash_amount_minor),
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbUser {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl From<DbUser> for User {
    fn from(row: DbUser) -> Self {
        User {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}
