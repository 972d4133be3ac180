//! User repository

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use tablestakes_types::User;

use crate::models::DbUser;
use crate::repos::UserStore;
use crate::{StoreError, StoreResult};

pub struct PgUserRepo {
    pool: PgPool,
}

impl PgUserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserRepo {
    async fn insert(&self, user: &User) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO users (id, username, password_hash) VALUES ($1, $2, $3)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::from_insert(e, "username"))?;

        Ok(())
    }

    async fn find(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, DbUser>(
            "SELECT id, username, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }
}
