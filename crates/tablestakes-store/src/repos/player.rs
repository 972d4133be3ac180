//! Player repository

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use tablestakes_types::{Player, PlayerRole};

use crate::models::DbPlayer;
use crate::repos::PlayerStore;
use crate::{StoreError, StoreResult};

const PLAYER_COLUMNS: &str = "id, room_id, user_id, name, role, created_at";

pub struct PgPlayerRepo {
    pool: PgPool,
}

impl PgPlayerRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlayerStore for PgPlayerRepo {
    async fn insert(&self, player: &Player) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO players (id, room_id, user_id, name, role)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(player.id)
        .bind(player.room_id)
        .bind(player.user_id)
        .bind(&player.name)
        .bind(player.role.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::from_insert(e, "player seat for user in room"))?;

        Ok(())
    }

    async fn find(&self, id: Uuid) -> StoreResult<Option<Player>> {
        let row = sqlx::query_as::<_, DbPlayer>(&format!(
            "SELECT {PLAYER_COLUMNS} FROM players WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Player::try_from).transpose()
    }

    async fn list_by_room(&self, room_id: Uuid) -> StoreResult<Vec<Player>> {
        let rows = sqlx::query_as::<_, DbPlayer>(&format!(
            "SELECT {PLAYER_COLUMNS} FROM players WHERE room_id = $1 ORDER BY created_at, id"
        ))
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Player::try_from).collect()
    }

    async fn update_role(&self, id: Uuid, role: PlayerRole) -> StoreResult<()> {
        let result = sqlx::query("UPDATE players SET role = $2 WHERE id = $1")
            .bind(id)
            .bind(role.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("player {id}")));
        }
        Ok(())
    }

    async fn assign_user(&self, id: Uuid, user_id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("UPDATE players SET user_id = $2 WHERE id = $1")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::from_insert(e, "player seat for user in room"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("player {id}")));
        }
        Ok(())
    }
}
