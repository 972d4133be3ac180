//! Repository traits and their PostgreSQL implementations
//!
//! Each domain entity gets a narrow trait; the domain crates depend on
//! the traits only, so tests run against [`crate::memory::MemoryStore`]
//! and production runs against the `Pg*` repos backed by sqlx.

mod exchange;
mod player;
mod room;
mod user;

pub use exchange::PgExchangeRepo;
pub use player::PgPlayerRepo;
pub use room::PgRoomRepo;
pub use user::PgUserRepo;

use async_trait::async_trait;
use uuid::Uuid;

use tablestakes_types::{Exchange, NewExchange, Player, PlayerRole, Room, RoomAggregate, User};

use crate::StoreResult;

#[async_trait]
pub trait RoomStore: Send + Sync {
    async fn insert(&self, room: &Room) -> StoreResult<()>;

    async fn find(&self, id: Uuid) -> StoreResult<Option<Room>>;

    /// Visible rooms, plus (when `user_id` is given) rooms where that
    /// user holds a seat.
    async fn list_for_user(&self, user_id: Option<Uuid>) -> StoreResult<Vec<Room>>;

    /// The room with all players, linked users and exchange histories.
    async fn load_aggregate(&self, id: Uuid) -> StoreResult<Option<RoomAggregate>>;

    async fn update_access_token(&self, id: Uuid, token: &str) -> StoreResult<()>;

    /// Atomically append the settlement entries and flip the room to
    /// Closed. The room row is locked for the duration; the write is
    /// rejected if the room is already closed or `expected_version` no
    /// longer matches (a concurrent exchange or close got in between).
    /// Either every entry lands and the room closes, or nothing does.
    async fn settle_and_close(
        &self,
        id: Uuid,
        expected_version: i64,
        entries: &[NewExchange],
    ) -> StoreResult<RoomAggregate>;

    /// Cascades to players and exchanges. Used to compensate a failed
    /// room creation.
    async fn delete(&self, id: Uuid) -> StoreResult<()>;
}

#[async_trait]
pub trait PlayerStore: Send + Sync {
    async fn insert(&self, player: &Player) -> StoreResult<()>;

    async fn find(&self, id: Uuid) -> StoreResult<Option<Player>>;

    async fn list_by_room(&self, room_id: Uuid) -> StoreResult<Vec<Player>>;

    async fn update_role(&self, id: Uuid, role: PlayerRole) -> StoreResult<()>;

    async fn assign_user(&self, id: Uuid, user_id: Uuid) -> StoreResult<()>;
}

#[async_trait]
pub trait ExchangeStore: Send + Sync {
    /// Append one immutable ledger entry. The owning room's row is
    /// locked, its status re-checked, a cash-out verified against the
    /// player's chip balance and the room version bumped in the same
    /// transaction, so an append can never interleave with a close
    /// that already validated its books, and racing cash-outs cannot
    /// drive a balance negative.
    async fn append(&self, room_id: Uuid, entry: &NewExchange) -> StoreResult<Exchange>;

    /// Full history for one player, in insertion order.
    async fn list_by_player(&self, player_id: Uuid) -> StoreResult<Vec<Exchange>>;

    /// Every entry of every player in the room, in insertion order.
    async fn list_by_room(&self, room_id: Uuid) -> StoreResult<Vec<Exchange>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: &User) -> StoreResult<()>;

    async fn find(&self, id: Uuid) -> StoreResult<Option<User>>;
}
