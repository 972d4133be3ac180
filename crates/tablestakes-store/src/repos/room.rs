//! Room repository

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use tablestakes_types::{Exchange, NewExchange, Room, RoomAggregate, RoomStatus, Seat};

use crate::models::{DbExchange, DbRoom, DbSeatRow};
use crate::repos::RoomStore;
use crate::{StoreError, StoreResult};

const ROOM_COLUMNS: &str = "id, name, status, exchange_rate_minor, currency, \
     base_buy_in_minor, is_visible, room_key, access_token, version, created_at";

pub struct PgRoomRepo {
    pool: PgPool,
}

impl PgRoomRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_seats(&self, room_id: Uuid) -> StoreResult<Vec<Seat>> {
        let seat_rows = sqlx::query_as::<_, DbSeatRow>(
            r#"
            SELECT p.id, p.room_id, p.user_id, p.name, p.role, p.created_at,
                   u.username AS u_username,
                   u.password_hash AS u_password_hash,
                   u.created_at AS u_created_at
            FROM players p
            LEFT JOIN users u ON u.id = p.user_id
            WHERE p.room_id = $1
            ORDER BY p.created_at, p.id
            "#,
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;

        let exchange_rows = sqlx::query_as::<_, DbExchange>(
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

        let mut by_player: HashMap<Uuid, Vec<Exchange>> = HashMap::new();
        for row in exchange_rows {
            let exchange: Exchange = row.try_into()?;
            by_player.entry(exchange.player_id).or_default().push(exchange);
        }

        let mut seats = Vec::with_capacity(seat_rows.len());
        for row in seat_rows {
            let (player, user) = row.into_parts()?;
            let exchanges = by_player.remove(&player.id).unwrap_or_default();
            seats.push(Seat {
                player,
                user,
                exchanges,
            });
        }
        Ok(seats)
    }
}

#[async_trait]
impl RoomStore for PgRoomRepo {
    async fn insert(&self, room: &Room) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO rooms
                (id, name, status, exchange_rate_minor, currency,
                 base_buy_in_minor, is_visible, room_key, access_token, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(room.id)
        .bind(&room.name)
        .bind(room.status.as_str())
        .bind(room.exchange_rate.minor())
        .bind(room.currency.code())
        .bind(room.base_buy_in.minor())
        .bind(room.is_visible)
        .bind(&room.room_key)
        .bind(&room.access_token)
        .bind(room.version)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::from_insert(e, "room"))?;

        Ok(())
    }

    async fn find(&self, id: Uuid) -> StoreResult<Option<Room>> {
        let row = sqlx::query_as::<_, DbRoom>(&format!(
            "SELECT {ROOM_COLUMNS} FROM rooms WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Room::try_from).transpose()
    }

    async fn list_for_user(&self, user_id: Option<Uuid>) -> StoreResult<Vec<Room>> {
        let rows = match user_id {
            Some(user_id) => {
                sqlx::query_as::<_, DbRoom>(&format!(
                    r#"
                    SELECT DISTINCT r.{}
                    FROM rooms r
                    LEFT JOIN players p ON p.room_id = r.id
                    WHERE r.is_visible = TRUE OR p.user_id = $1
                    ORDER BY r.created_at
                    "#,
                    ROOM_COLUMNS.replace(", ", ", r.")
                ))
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, DbRoom>(&format!(
                    "SELECT {ROOM_COLUMNS} FROM rooms WHERE is_visible = TRUE ORDER BY created_at"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(Room::try_from).collect()
    }

    async fn load_aggregate(&self, id: Uuid) -> StoreResult<Option<RoomAggregate>> {
        let Some(room) = self.find(id).await? else {
            return Ok(None);
        };
        let seats = self.load_seats(id).await?;
        Ok(Some(RoomAggregate { room, seats }))
    }

    async fn update_access_token(&self, id: Uuid, token: &str) -> StoreResult<()> {
        let result = sqlx::query("UPDATE rooms SET access_token = $2 WHERE id = $1")
            .bind(id)
            .bind(token)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("room {id}")));
        }
        Ok(())
    }

    async fn settle_and_close(
        &self,
        id: Uuid,
        expected_version: i64,
        entries: &[NewExchange],
    ) -> StoreResult<RoomAggregate> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, DbRoom>(&format!(
            "SELECT {ROOM_COLUMNS} FROM rooms WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("room {id}")))?;

        let room: Room = row.try_into()?;
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
            let inserted = sqlx::query(
                r#"
                INSERT INTO exchanges
                    (id, player_id, direction, chip_amount_minor, cash_amount_minor)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(entry.player_id)
            .bind(entry.direction.as_str())
            .bind(entry.chip_amount.minor())
            .bind(entry.cash_amount.minor())
            .execute(&mut *tx)
            .await;

            if let Err(err) = inserted {
                tracing::error!(
                    room_id = %id,
                    player_id = %entry.player_id,
                    error = %err,
                    "settlement entry failed, rolling back close"
                );
                return Err(StoreError::Query(err));
            }
        }

        sqlx::query("UPDATE rooms SET status = 'closed', version = version + 1 WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.load_aggregate(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("room {id}")))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM rooms WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
