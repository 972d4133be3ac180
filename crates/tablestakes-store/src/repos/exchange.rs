//! Exchange ledger repository
//!
//! Appends run inside a transaction that locks the owning room's row,
//! re-checks its status, verifies cash-outs against the chip balance
//! and bumps the room version. A close that validated its books
//! against version N will therefore refuse to commit once any append
//! has moved the room to N+1, and two cash-outs racing for the same
//! chips serialize on the room row.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use tablestakes_types::{Exchange, ExchangeDirection, Money, NewExchange};

use crate::models::DbExchange;
use crate::repos::ExchangeStore;
use crate::{StoreError, StoreResult};

pub struct PgExchangeRepo {
    pool: PgPool,
}

impl PgExchangeRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExchangeStore for PgExchangeRepo {
    async fn append(&self, room_id: Uuid, entry: &NewExchange) -> StoreResult<Exchange> {
        let mut tx = self.pool.begin().await?;

        let room = sqlx::query_as::<_, (String,)>(
            "SELECT status FROM rooms WHERE id = $1 FOR UPDATE",
        )
        .bind(room_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("room {room_id}")))?;

        if room.0 == "closed" {
            return Err(StoreError::RoomClosed(room_id));
        }

        if entry.direction == ExchangeDirection::CashOut {
            let (balance_minor,): (i64,) = sqlx::query_as(
                r#"
                SELECT COALESCE(SUM(
                    CASE WHEN direction = 'buyin' THEN chip_amount_minor
                         ELSE -chip_amount_minor END), 0)::BIGINT
                FROM exchanges
                WHERE player_id = $1
                "#,
            )
            .bind(entry.player_id)
            .fetch_one(&mut *tx)
            .await?;

            let available = Money::from_minor(balance_minor);
            if entry.chip_amount > available {
                return Err(StoreError::InsufficientChips {
                    requested: entry.chip_amount,
                    available,
                });
            }
        }

        let row = sqlx::query_as::<_, DbExchange>(
            r#"
            INSERT INTO exchanges
                (id, player_id, direction, chip_amount_minor, cash_amount_minor)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, player_id, direction, chip_amount_minor, cash_amount_minor, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry.player_id)
        .bind(entry.direction.as_str())
        .bind(entry.chip_amount.minor())
        .bind(entry.cash_amount.minor())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE rooms SET version = version + 1 WHERE id = $1")
            .bind(room_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        row.try_into()
    }

    async fn list_by_player(&self, player_id: Uuid) -> StoreResult<Vec<Exchange>> {
        let rows = sqlx::query_as::<_, DbExchange>(
            r#"
            SELECT id, player_id, direction, chip_amount_minor, cash_amount_minor, created_at
            FROM exchanges
            WHERE player_id = $1
            ORDER BY seq
            "#,
        )
        .bind(player_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Exchange::try_from).collect()
    }

    async fn list_by_room(&self, room_id: Uuid) -> StoreResult<Vec<Exchange>> {
        let rows = sqlx::query_as::<_, DbExchange>(
            r#"
            SELECT e.id, e.player_id, e.direction,
                   e.chip_amount_minor, e.cash_amount_minor, e.created_at
            FROM exchanges e
            JOIN players p ON p.id = e.player_id
            WHERE p.room_id = $1
            ORDER BY e.seq
            "#,
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Exchange::try_from).collect()
    }
}
