//! Room lifecycle
//!
//! Creating rooms, joining them, handing out seats and managing the
//! access token that gates invisible rooms. Settlement lives in
//! [`crate::settlement`].

use chrono::Utc;
use rand::RngCore;
use uuid::Uuid;

use tablestakes_store::Store;
use tablestakes_types::{
    Currency, Money, Player, PlayerRole, Room, RoomAggregate, RoomStatus,
};

use crate::error::{Result, RoomError};

/// Default buy-in when a room does not set one.
const DEFAULT_BASE_BUY_IN: Money = Money::from_major(50);

/// Parameters for creating a room.
#[derive(Debug, Clone)]
pub struct NewRoom {
    pub name: String,
    pub exchange_rate: Money,
    pub currency: Currency,
    pub base_buy_in: Option<Money>,
    pub is_visible: bool,
    pub room_key: Option<String>,
    /// Display name for the host's seat; defaults to the username.
    pub host_name: Option<String>,
}

/// Room lifecycle service.
#[derive(Clone)]
pub struct RoomLifecycle {
    store: Store,
}

impl RoomLifecycle {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Create a room with its host seated.
    ///
    /// If seating the host fails the room row is deleted again, so a
    /// room never exists without a host.
    pub async fn create_room(&self, params: NewRoom, host_user_id: Uuid) -> Result<RoomAggregate> {
        if !params.exchange_rate.is_positive() {
            return Err(RoomError::InvalidExchangeRate(params.exchange_rate));
        }
        if let Some(key) = &params.room_key {
            if !is_valid_room_key(key) {
                return Err(RoomError::InvalidRoomKey);
            }
        }

        let host = self
            .store
            .users
            .find(host_user_id)
            .await?
            .ok_or(RoomError::HostNotFound(host_user_id))?;

        let room = Room {
            id: Uuid::new_v4(),
            name: params.name,
            status: RoomStatus::Opened,
            exchange_rate: params.exchange_rate,
            currency: params.currency,
            base_buy_in: params.base_buy_in.unwrap_or(DEFAULT_BASE_BUY_IN),
            is_visible: params.is_visible,
            room_key: params.room_key,
            access_token: generate_access_token(),
            version: 0,
            created_at: Utc::now(),
        };
        self.store.rooms.insert(&room).await?;

        let host_player = Player {
            id: Uuid::new_v4(),
            room_id: room.id,
            user_id: Some(host.id),
            name: params.host_name.unwrap_or_else(|| host.username.clone()),
            role: PlayerRole::Host,
            created_at: Utc::now(),
        };
        if let Err(err) = self.store.players.insert(&host_player).await {
            tracing::error!(
                room_id = %room.id,
                host_user_id = %host.id,
                error = %err,
                "seating host failed, deleting room"
            );
            self.store.rooms.delete(room.id).await?;
            return Err(err.into());
        }

        tracing::info!(room_id = %room.id, host_user_id = %host.id, "room created");

        self.store
            .rooms
            .load_aggregate(room.id)
            .await?
            .ok_or_else(|| RoomError::NotFound(format!("room {}", room.id)))
    }

    /// Rotate the room's access token. Host only.
    pub async fn regenerate_access_token(
        &self,
        room_id: Uuid,
        requesting_user_id: Uuid,
    ) -> Result<String> {
        let aggregate = self.load(room_id).await?;
        self.require_host(&aggregate, requesting_user_id)?;

        let token = generate_access_token();
        self.store.rooms.update_access_token(room_id, &token).await?;
        Ok(token)
    }

    /// Fetch a room, enforcing visibility.
    ///
    /// Invisible rooms are only served to members or callers who
    /// present the current access token.
    pub async fn find_room(
        &self,
        room_id: Uuid,
        access_token: Option<&str>,
        user_id: Option<Uuid>,
    ) -> Result<RoomAggregate> {
        let aggregate = self.load(room_id).await?;

        if !aggregate.room.is_visible {
            let is_member = user_id.is_some_and(|uid| aggregate.is_member(uid));
            let token_ok = access_token == Some(aggregate.room.access_token.as_str());
            if !is_member && !token_ok {
                return Err(RoomError::Forbidden(
                    "room is not visible to this caller".to_string(),
                ));
            }
        }

        Ok(aggregate)
    }

    /// Rooms visible to everyone plus rooms the user plays in.
    pub async fn list_rooms(&self, user_id: Option<Uuid>) -> Result<Vec<Room>> {
        Ok(self.store.rooms.list_for_user(user_id).await?)
    }

    /// Check a room key guess. Keyless rooms and members always pass.
    pub async fn validate_room_key(
        &self,
        room_id: Uuid,
        key: &str,
        user_id: Option<Uuid>,
    ) -> Result<bool> {
        let aggregate = self.load(room_id).await?;

        let Some(room_key) = &aggregate.room.room_key else {
            return Ok(true);
        };
        if user_id.is_some_and(|uid| aggregate.is_member(uid)) {
            return Ok(true);
        }
        Ok(room_key == key)
    }

    /// Seat a new player in a room.
    pub async fn join_room(
        &self,
        room_id: Uuid,
        user_id: Option<Uuid>,
        name: String,
    ) -> Result<Player> {
        let aggregate = self.load(room_id).await?;
        if aggregate.room.is_closed() {
            return Err(RoomError::AlreadyClosed(room_id));
        }

        let player = Player {
            id: Uuid::new_v4(),
            room_id,
            user_id,
            name,
            role: PlayerRole::Player,
            created_at: Utc::now(),
        };
        self.store.players.insert(&player).await?;

        tracing::info!(room_id = %room_id, player_id = %player.id, "player joined");
        Ok(player)
    }

    /// Promote a user-linked player to admin. Host only; the host's
    /// own role never changes.
    pub async fn promote_to_admin(
        &self,
        player_id: Uuid,
        requesting_user_id: Uuid,
    ) -> Result<Player> {
        let player = self
            .store
            .players
            .find(player_id)
            .await?
            .ok_or_else(|| RoomError::NotFound(format!("player {player_id}")))?;

        let aggregate = self.load(player.room_id).await?;
        self.require_host(&aggregate, requesting_user_id)?;

        if player.role == PlayerRole::Host {
            return Err(RoomError::HostImmutable);
        }
        if player.user_id.is_none() {
            return Err(RoomError::NotUserLinked(player_id));
        }

        self.store
            .players
            .update_role(player_id, PlayerRole::Admin)
            .await?;

        Ok(Player {
            role: PlayerRole::Admin,
            ..player
        })
    }

    /// Claim an unclaimed seat for a user.
    pub async fn assign_player(&self, player_id: Uuid, user_id: Uuid) -> Result<Player> {
        let player = self
            .store
            .players
            .find(player_id)
            .await?
            .ok_or_else(|| RoomError::NotFound(format!("player {player_id}")))?;

        if player.user_id.is_some() {
            return Err(RoomError::AlreadySeated);
        }
        let user = self
            .store
            .users
            .find(user_id)
            .await?
            .ok_or_else(|| RoomError::NotFound(format!("user {user_id}")))?;

        self.store.players.assign_user(player_id, user.id).await?;

        Ok(Player {
            user_id: Some(user.id),
            ..player
        })
    }

    async fn load(&self, room_id: Uuid) -> Result<RoomAggregate> {
        self.store
            .rooms
            .load_aggregate(room_id)
            .await?
            .ok_or_else(|| RoomError::NotFound(format!("room {room_id}")))
    }

    fn require_host(&self, aggregate: &RoomAggregate, user_id: Uuid) -> Result<()> {
        let is_host = aggregate
            .host()
            .is_some_and(|seat| seat.player.user_id == Some(user_id));
        if !is_host {
            return Err(RoomError::Forbidden(
                "only the host may do this".to_string(),
            ));
        }
        Ok(())
    }
}

fn is_valid_room_key(key: &str) -> bool {
    key.len() == 4 && key.bytes().all(|b| b.is_ascii_digit())
}

fn generate_access_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
