//! Tablestakes persistence layer
//!
//! PostgreSQL repositories behind trait objects, plus an in-memory
//! implementation of the same traits for tests and demo mode.
//!
//! All money columns hold minor units as `BIGINT`; conversion to and
//! from [`tablestakes_types::Money`] happens at the row-mapping edge.
//! Writes that must observe room state (ledger appends, settlement)
//! run in transactions that lock the room row and bump its `version`
//! counter, so a close validated against a stale snapshot fails with
//! [`StoreError::Conflict`] instead of committing.

pub mod config;
pub mod error;
pub mod memory;
pub mod models;
pub mod repos;

use std::sync::Arc;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

pub use config::DatabaseConfig;
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use repos::{
    ExchangeStore, PgExchangeRepo, PgPlayerRepo, PgRoomRepo, PgUserRepo, PlayerStore, RoomStore,
    UserStore,
};

/// Database connection pool
pub struct Database {
    pub pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        info!("Connecting to PostgreSQL: {}", config.postgres_url_masked());

        let pool = PgPoolOptions::new()
            .max_connections(config.pg_max_connections)
            .min_connections(config.pg_min_connections)
            .acquire_timeout(std::time::Duration::from_secs(
                config.pg_acquire_timeout_secs,
            ))
            .connect(&config.postgres_url)
            .await
            .map_err(|e| StoreError::Connection(format!("PostgreSQL: {e}")))?;

        info!("Connected to PostgreSQL");

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn migrate(&self) -> StoreResult<()> {
        info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Migration(e.to_string()))?;
        info!("Migrations complete");
        Ok(())
    }

    /// Health check
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }
}

/// Repository handles for every domain, behind trait objects.
#[derive(Clone)]
pub struct Store {
    pub rooms: Arc<dyn RoomStore>,
    pub players: Arc<dyn PlayerStore>,
    pub exchanges: Arc<dyn ExchangeStore>,
    pub users: Arc<dyn UserStore>,
}

impl Store {
    /// Repositories backed by a PostgreSQL pool.
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            rooms: Arc::new(PgRoomRepo::new(pool.clone())),
            players: Arc::new(PgPlayerRepo::new(pool.clone())),
            exchanges: Arc::new(PgExchangeRepo::new(pool.clone())),
            users: Arc::new(PgUserRepo::new(pool)),
        }
    }

    /// A fully in-memory store sharing one state across all handles.
    pub fn memory() -> Self {
        let store = MemoryStore::new();
        Self {
            rooms: Arc::new(store.clone()),
            players: Arc::new(store.clone()),
            exchanges: Arc::new(store.clone()),
            users: Arc::new(store),
        }
    }
}
