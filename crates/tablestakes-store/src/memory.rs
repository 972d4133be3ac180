//! In-memory store
//!
//! A single [`MemoryStore`] implements every repository trait behind
//! one `RwLock`, giving the same atomicity the PostgreSQL repos get
//! from row locks. Used by unit tests throughout the workspace and by
//! the server's demo mode.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use tablestakes_types::{
    Exchange, ExchangeDirection, Money, NewExchange, Player, PlayerRole, Room, RoomAggregate,
    RoomStatus, Seat, User,
};

use crate::repos::{ExchangeStore, PlayerStore, RoomStore, UserStore};
use crate::{StoreError, StoreResult};

#[derive(Default)]
struct Inner {
    rooms: HashMap<Uuid, Room>,
    players: HashMap<Uuid, Player>,
    /// Append-only, insertion-ordered ledger.
    exchanges: Vec<Exchange>,
    users: HashMap<Uuid, User>,
}

impl Inner {
    fn aggregate(&self, room_id: Uuid) -> Option<RoomAggregate> {
        let room = self.rooms.get(&room_id)?.clone();

        let mut players: Vec<&Player> = self
            .players
            .values()
            .filter(|p| p.room_id == room_id)
            .collect();
        players.sort_by_key(|p| (p.created_at, p.id));

        let seats = players
            .into_iter()
            .map(|player| Seat {
                user: player.user_id.and_then(|id| self.users.get(&id).cloned()),
                exchanges: self
                    .exchanges
                    .iter()
                    .filter(|e| e.player_id == player.id)
                    .cloned()
                    .collect(),
                player: player.clone(),
            })
            .collect();

        Some(RoomAggregate { room, seats })
    }

    fn push_exchange(&mut self, entry: &NewExchange) -> Exchange {
        let exchange = Exchange {
            id: Uuid::new_v4(),
            player_id: entry.player_id,
            direction: entry.direction,
            chip_amount: entry.chip_amount,
            cash_amount: entry.cash_amount,
            created_at: Utc::now(),
        };
        self.exchanges.push(exchange.clone());
        exchange
    }
}

/// Thread-safe in-memory implementation of all store traits.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoomStore for MemoryStore {
    async fn insert(&self, room: &Room) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner.rooms.insert(room.id, room.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> StoreResult<Option<Room>> {
        Ok(self.inner.read().await.rooms.get(&id).cloned())
    }

    async fn list_for_user(&self, user_id: Option<Uuid>) -> StoreResult<Vec<Room>> {
        let inner = self.inner.read().await;
        let mut rooms: Vec<Room> = inner
            .rooms
            .values()
            .filter(|room| {
                room.is_visible
                    || user_id.is_some_and(|uid| {
                        inner
                            .players
                            .values()
                            .any(|p| p.room_id == room.id && p.user_id == Some(uid))
                    })
            })
            .cloned()
            .collect();
        rooms.sort_by_key(|r| (r.created_at, r.id));
        Ok(rooms)
    }

    async fn load_aggregate(&self, id: Uuid) -> StoreResult<Option<RoomAggregate>> {
        Ok(self.inner.read().await.aggregate(id))
    }

    async fn update_access_token(&self, id: Uuid, token: &str) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let room = inner
            .rooms
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("room {id}")))?;
        room.access_token = token.to_string();
        Ok(())
    }

    async fn settle_and_close(
        &self,
        id: Uuid,
        expected_version: i64,
        entries: &[NewExchange],
    ) -> StoreResult<RoomAggregate> {
        let mut inner = self.inner.write().await;

        let room = inner
            .rooms
            .get(&id)
            .ok_or_else(|| StoreError::NotFound(format!("room {id}")))?;
        if room.status == RoomStatus::Closed {
            return Err(StoreError::RoomClosed(id));
        }
        if room.version != expected_version {
            return Err(StoreError::Conflict(format!(
                "room {id} changed during settlement (version {} != {expected_version})",
                room.version
            )));
        }

        for entry in entries {
            if !inner.players.contains_key(&entry.player_id) {
                tracing::error!(
                    room_id = %id,
                    player_id = %entry.player_id,
                    "settlement entry references unknown player, aborting close"
                );
                return Err(StoreError::NotFound(format!("player {}", entry.player_id)));
            }
        }
        for entry in entries {
            inner.push_exchange(entry);
        }

        let room = inner.rooms.get_mut(&id).expect("room checked above");
        room.status = RoomStatus::Closed;
        room.version += 1;

        Ok(inner.aggregate(id).expect("room exists"))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner.rooms.remove(&id);
        let player_ids: Vec<Uuid> = inner
            .players
            .values()
            .filter(|p| p.room_id == id)
            .map(|p| p.id)
            .collect();
        inner.players.retain(|_, p| p.room_id != id);
        inner
            .exchanges
            .retain(|e| !player_ids.contains(&e.player_id));
        Ok(())
    }
}

#[async_trait]
impl PlayerStore for MemoryStore {
    async fn insert(&self, player: &Player) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if let Some(user_id) = player.user_id {
            let taken = inner
                .players
                .values()
                .any(|p| p.room_id == player.room_id && p.user_id == Some(user_id));
            if taken {
                return Err(StoreError::Duplicate(
                    "player seat for user in room".to_string(),
                ));
            }
        }
        inner.players.insert(player.id, player.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> StoreResult<Option<Player>> {
        Ok(self.inner.read().await.players.get(&id).cloned())
    }

    async fn list_by_room(&self, room_id: Uuid) -> StoreResult<Vec<Player>> {
        let inner = self.inner.read().await;
        let mut players: Vec<Player> = inner
            .players
            .values()
            .filter(|p| p.room_id == room_id)
            .cloned()
            .collect();
        players.sort_by_key(|p| (p.created_at, p.id));
        Ok(players)
    }

    async fn update_role(&self, id: Uuid, role: PlayerRole) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let player = inner
            .players
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("player {id}")))?;
        player.role = role;
        Ok(())
    }

    async fn assign_user(&self, id: Uuid, user_id: Uuid) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let room_id = inner
            .players
            .get(&id)
            .ok_or_else(|| StoreError::NotFound(format!("player {id}")))?
            .room_id;

        let taken = inner
            .players
            .values()
            .any(|p| p.room_id == room_id && p.user_id == Some(user_id));
        if taken {
            return Err(StoreError::Duplicate(
                "player seat for user in room".to_string(),
            ));
        }

        let player = inner.players.get_mut(&id).expect("player checked above");
        player.user_id = Some(user_id);
        Ok(())
    }
}

#[async_trait]
impl ExchangeStore for MemoryStore {
    async fn append(&self, room_id: Uuid, entry: &NewExchange) -> StoreResult<Exchange> {
        let mut inner = self.inner.write().await;

        let room = inner
            .rooms
            .get(&room_id)
            .ok_or_else(|| StoreError::NotFound(format!("room {room_id}")))?;
        if room.status == RoomStatus::Closed {
            return Err(StoreError::RoomClosed(room_id));
        }

        // Balance is folded under the same write guard that admits
        // the entry, so concurrent cash-outs cannot both pass.
        if entry.direction == ExchangeDirection::CashOut {
            let available = Money::from_minor(
                inner
                    .exchanges
                    .iter()
                    .filter(|e| e.player_id == entry.player_id)
                    .map(|e| match e.direction {
                        ExchangeDirection::BuyIn => e.chip_amount.minor(),
                        ExchangeDirection::CashOut => -e.chip_amount.minor(),
                    })
                    .sum(),
            );
            if entry.chip_amount > available {
                return Err(StoreError::InsufficientChips {
                    requested: entry.chip_amount,
                    available,
                });
            }
        }

        let exchange = inner.push_exchange(entry);
        let room = inner.rooms.get_mut(&room_id).expect("room checked above");
        room.version += 1;

        Ok(exchange)
    }

    async fn list_by_player(&self, player_id: Uuid) -> StoreResult<Vec<Exchange>> {
        let inner = self.inner.read().await;
        Ok(inner
            .exchanges
            .iter()
            .filter(|e| e.player_id == player_id)
            .cloned()
            .collect())
    }

    async fn list_by_room(&self, room_id: Uuid) -> StoreResult<Vec<Exchange>> {
        let inner = self.inner.read().await;
        Ok(inner
            .exchanges
            .iter()
            .filter(|e| {
                inner
                    .players
                    .get(&e.player_id)
                    .is_some_and(|p| p.room_id == room_id)
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, user: &User) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate("username".to_string()));
        }
        inner.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablestakes_types::Currency;

    fn room(status: RoomStatus) -> Room {
        Room {
            id: Uuid::new_v4(),
            name: "test".into(),
            status,
            exchange_rate: Money::from_major(100),
            currency: Currency::Usd,
            base_buy_in: Money::from_major(50),
            is_visible: true,
            room_key: None,
            access_token: "token".into(),
            version: 0,
            created_at: Utc::now(),
        }
    }

    fn player(room_id: Uuid, user_id: Option<Uuid>) -> Player {
        Player {
            id: Uuid::new_v4(),
            room_id,
            user_id,
            name: "p".into(),
            role: PlayerRole::Player,
            created_at: Utc::now(),
        }
    }

    fn buy_in(player_id: Uuid, chips: i64) -> NewExchange {
        NewExchange {
            player_id,
            direction: ExchangeDirection::BuyIn,
            chip_amount: Money::from_major(chips),
            cash_amount: Money::from_major(chips / 100),
        }
    }

    fn cash_out(player_id: Uuid, chips: i64) -> NewExchange {
        NewExchange {
            player_id,
            direction: ExchangeDirection::CashOut,
            chip_amount: Money::from_major(chips),
            cash_amount: Money::from_major(chips / 100),
        }
    }

    #[tokio::test]
    async fn append_bumps_room_version() {
        let store = MemoryStore::new();
        let r = room(RoomStatus::Opened);
        let p = player(r.id, None);
        RoomStore::insert(&store, &r).await.unwrap();
        PlayerStore::insert(&store, &p).await.unwrap();

        ExchangeStore::append(&store, r.id, &buy_in(p.id, 1000))
            .await
            .unwrap();

        let reloaded = RoomStore::find(&store, r.id).await.unwrap().unwrap();
        assert_eq!(reloaded.version, 1);
    }

    #[tokio::test]
    async fn append_checks_cash_out_against_current_balance() {
        let store = MemoryStore::new();
        let r = room(RoomStatus::Opened);
        let p = player(r.id, None);
        RoomStore::insert(&store, &r).await.unwrap();
        PlayerStore::insert(&store, &p).await.unwrap();

        ExchangeStore::append(&store, r.id, &buy_in(p.id, 1000))
            .await
            .unwrap();
        ExchangeStore::append(&store, r.id, &cash_out(p.id, 800))
            .await
            .unwrap();

        // Each cash-out alone fits the opening balance; the second
        // must see the first and be refused, never go negative.
        let err = ExchangeStore::append(&store, r.id, &cash_out(p.id, 800))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InsufficientChips { .. }));

        let history = ExchangeStore::list_by_player(&store, p.id).await.unwrap();
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn append_rejects_closed_room() {
        let store = MemoryStore::new();
        let r = room(RoomStatus::Closed);
        let p = player(r.id, None);
        RoomStore::insert(&store, &r).await.unwrap();
        PlayerStore::insert(&store, &p).await.unwrap();

        let err = ExchangeStore::append(&store, r.id, &buy_in(p.id, 1000))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::RoomClosed(_)));
        assert!(ExchangeStore::list_by_player(&store, p.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn settle_and_close_rejects_stale_version() {
        let store = MemoryStore::new();
        let r = room(RoomStatus::Opened);
        let p = player(r.id, None);
        RoomStore::insert(&store, &r).await.unwrap();
        PlayerStore::insert(&store, &p).await.unwrap();

        // A concurrent append moved the version past the snapshot.
        ExchangeStore::append(&store, r.id, &buy_in(p.id, 1000))
            .await
            .unwrap();

        let err = RoomStore::settle_and_close(&store, r.id, 0, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let reloaded = RoomStore::find(&store, r.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, RoomStatus::Opened);
    }

    #[tokio::test]
    async fn settle_and_close_is_all_or_nothing() {
        let store = MemoryStore::new();
        let r = room(RoomStatus::Opened);
        let p = player(r.id, None);
        RoomStore::insert(&store, &r).await.unwrap();
        PlayerStore::insert(&store, &p).await.unwrap();

        // Second entry references a player that does not exist.
        let entries = vec![buy_in(p.id, 1000), buy_in(Uuid::new_v4(), 500)];
        let err = RoomStore::settle_and_close(&store, r.id, 0, &entries)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        let reloaded = RoomStore::find(&store, r.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, RoomStatus::Opened);
        assert!(ExchangeStore::list_by_room(&store, r.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn duplicate_seat_rejected() {
        let store = MemoryStore::new();
        let r = room(RoomStatus::Opened);
        let user_id = Uuid::new_v4();
        RoomStore::insert(&store, &r).await.unwrap();
        PlayerStore::insert(&store, &player(r.id, Some(user_id)))
            .await
            .unwrap();

        let err = PlayerStore::insert(&store, &player(r.id, Some(user_id)))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[tokio::test]
    async fn ledger_preserves_insertion_order() {
        let store = MemoryStore::new();
        let r = room(RoomStatus::Opened);
        let p = player(r.id, None);
        RoomStore::insert(&store, &r).await.unwrap();
        PlayerStore::insert(&store, &p).await.unwrap();

        for chips in [100, 200, 300] {
            ExchangeStore::append(&store, r.id, &buy_in(p.id, chips))
                .await
                .unwrap();
        }

        let history = ExchangeStore::list_by_player(&store, p.id).await.unwrap();
        let chips: Vec<i64> = history.iter().map(|e| e.chip_amount.minor()).collect();
        assert_eq!(chips, vec![10_000, 20_000, 30_000]);
    }
}
