//! Room settlement
//!
//! Closing a room turns each player's declared net result into a
//! final cash-out row and flips the room to closed, in one store
//! transaction. The books must reconcile first: declared profits and
//! losses have to account for every chip still on the table.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tablestakes_ledger::{cash_balance, chip_balance};
use tablestakes_store::Store;
use tablestakes_types::{ExchangeDirection, Money, NewExchange, RoomAggregate};

use crate::error::{Result, RoomError};

/// One player's declared net profit or loss, in the room's cash
/// currency. Negative income is a loss.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclaredResult {
    pub player_id: Uuid,
    pub income: Money,
}

/// Room settlement service.
#[derive(Clone)]
pub struct SettlementEngine {
    store: Store,
}

impl SettlementEngine {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Close a room against the declared results.
    ///
    /// Only the host or an admin may close. The declared incomes must
    /// reconcile with the ledger before anything is written; the
    /// store then re-verifies the room is still open and unchanged
    /// under its row lock, so a concurrent exchange or close surfaces
    /// as [`RoomError::ConcurrentUpdate`] instead of corrupting the
    /// books.
    pub async fn close_room(
        &self,
        room_id: Uuid,
        results: &[DeclaredResult],
        requesting_user_id: Uuid,
    ) -> Result<RoomAggregate> {
        let aggregate = self
            .store
            .rooms
            .load_aggregate(room_id)
            .await?
            .ok_or_else(|| RoomError::NotFound(format!("room {room_id}")))?;

        if !aggregate.can_manage(requesting_user_id) {
            return Err(RoomError::Forbidden(
                "only the host or an admin may close a room".to_string(),
            ));
        }
        if aggregate.room.is_closed() {
            return Err(RoomError::AlreadyClosed(room_id));
        }
        if results.is_empty() {
            return Err(RoomError::EmptyResults);
        }
        for result in results {
            if aggregate.seat_for_player(result.player_id).is_none() {
                return Err(RoomError::NotFound(format!(
                    "player {} in room {room_id}",
                    result.player_id
                )));
            }
        }

        let residual = self.reconcile(&aggregate, results)?;
        if residual.abs() > Money::RECONCILE_TOLERANCE {
            tracing::warn!(
                room_id = %room_id,
                residual = %residual,
                "declared results do not reconcile"
            );
            return Err(RoomError::Unreconciled { residual });
        }

        let entries = settlement_entries(&aggregate, results)?;
        let closed = self
            .store
            .rooms
            .settle_and_close(room_id, aggregate.room.version, &entries)
            .await?;

        tracing::info!(
            room_id = %room_id,
            players = results.len(),
            payouts = entries.len(),
            "room closed"
        );
        Ok(closed)
    }

    /// Residual of the money-conservation check.
    ///
    /// Declared totals must cover the cash value of chips still in
    /// play net of the cash the bank holds. With exact conversions
    /// those two quantities cancel and the residual is simply the sum
    /// of declared incomes.
    fn reconcile(&self, aggregate: &RoomAggregate, results: &[DeclaredResult]) -> Result<Money> {
        let total_declared = Money::total(results.iter().map(|r| r.income))?;

        let mut all_exchanges = Vec::new();
        let mut outstanding = Money::ZERO;
        for seat in &aggregate.seats {
            let chips = chip_balance(&seat.exchanges)?;
            let cash_value = if chips.is_zero() {
                Money::ZERO
            } else {
                chips.to_cash(aggregate.room.exchange_rate)?
            };
            outstanding = outstanding.checked_add(cash_value)?;
            all_exchanges.extend(seat.exchanges.iter().cloned());
        }
        let total_historical = cash_balance(&all_exchanges)?;

        let unaccounted = outstanding.checked_sub(total_historical)?;
        Ok(total_declared.checked_sub(unaccounted)?)
    }
}

/// Materialize declared results as final cash-out rows. Zero incomes
/// produce no row; a non-zero income the rate cannot express as chips
/// refuses the close.
fn settlement_entries(
    aggregate: &RoomAggregate,
    results: &[DeclaredResult],
) -> Result<Vec<NewExchange>> {
    let mut entries = Vec::new();
    for result in results {
        if result.income.is_zero() {
            continue;
        }
        let cash_amount = result.income.abs();
        let chip_amount = cash_amount.to_chips(aggregate.room.exchange_rate)?;
        // At rates below 0.05 chips per unit of cash a small income
        // can round to zero chips. Writing that row would violate the
        // positive-amount invariant and dropping it would lose real
        // declared cash, so the close is refused.
        if chip_amount.is_zero() {
            return Err(RoomError::IncomeTooSmall {
                player_id: result.player_id,
                income: result.income,
            });
        }
        entries.push(NewExchange {
            player_id: result.player_id,
            direction: ExchangeDirection::CashOut,
            chip_amount,
            cash_amount,
        });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{NewRoom, RoomLifecycle};
    use chrono::Utc;
    use tablestakes_ledger::ExchangeLedger;
    use tablestakes_types::{Currency, PlayerRole, RoomStatus, User};

    struct Fixture {
        store: Store,
        engine: SettlementEngine,
        ledger: ExchangeLedger,
        room_id: Uuid,
        host_user: Uuid,
        host_player: Uuid,
        guest_player: Uuid,
    }

    async fn fixture() -> Fixture {
        let store = Store::memory();
        let host = User {
            id: Uuid::new_v4(),
            username: "host".to_string(),
            password_hash: "hash".to_string(),
            created_at: Utc::now(),
        };
        store.users.insert(&host).await.unwrap();

        let lifecycle = RoomLifecycle::new(store.clone());
        let aggregate = lifecycle
            .create_room(
                NewRoom {
                    name: "friday".to_string(),
                    exchange_rate: Money::from_major(100),
                    currency: Currency::Usd,
                    base_buy_in: None,
                    is_visible: true,
                    room_key: None,
                    host_name: None,
                },
                host.id,
            )
            .await
            .unwrap();
        let room_id = aggregate.room.id;
        let host_player = aggregate.host().unwrap().player.id;

        let guest = lifecycle
            .join_room(room_id, None, "guest".to_string())
            .await
            .unwrap();

        Fixture {
            engine: SettlementEngine::new(store.clone()),
            ledger: ExchangeLedger::new(store.clone()),
            store,
            room_id,
            host_user: host.id,
            host_player,
            guest_player: guest.id,
        }
    }

    fn results(fx: &Fixture, host_income: i64, guest_income: i64) -> Vec<DeclaredResult> {
        vec![
            DeclaredResult {
                player_id: fx.host_player,
                income: Money::from_major(host_income),
            },
            DeclaredResult {
                player_id: fx.guest_player,
                income: Money::from_major(guest_income),
            },
        ]
    }

    #[tokio::test]
    async fn balanced_results_close_the_room() {
        let fx = fixture().await;

        let closed = fx
            .engine
            .close_room(fx.room_id, &results(&fx, 50, -50), fx.host_user)
            .await
            .unwrap();

        assert_eq!(closed.room.status, RoomStatus::Closed);

        // Each non-zero income became one final cash-out.
        let host_seat = closed.seat_for_player(fx.host_player).unwrap();
        let payout = host_seat.exchanges.last().unwrap();
        assert_eq!(payout.direction, ExchangeDirection::CashOut);
        assert_eq!(payout.cash_amount, Money::from_major(50));
        assert_eq!(payout.chip_amount, Money::from_major(5000));
    }

    #[tokio::test]
    async fn unbalanced_results_are_rejected() {
        let fx = fixture().await;

        let err = fx
            .engine
            .close_room(fx.room_id, &results(&fx, 100, -50), fx.host_user)
            .await
            .unwrap_err();

        assert!(matches!(err, RoomError::Unreconciled { .. }));
        let room = fx.store.rooms.find(fx.room_id).await.unwrap().unwrap();
        assert_eq!(room.status, RoomStatus::Opened);
    }

    #[tokio::test]
    async fn reconciliation_accounts_for_recorded_exchanges() {
        let fx = fixture().await;

        // Both players buy in for 50 and cash their chips back out,
        // so the table is flat and [+50, -50] still reconciles.
        for player in [fx.host_player, fx.guest_player] {
            fx.ledger
                .record_exchange(
                    fx.room_id,
                    player,
                    Money::from_major(50),
                    ExchangeDirection::BuyIn,
                )
                .await
                .unwrap();
            fx.ledger
                .record_exchange(
                    fx.room_id,
                    player,
                    Money::from_major(5000),
                    ExchangeDirection::CashOut,
                )
                .await
                .unwrap();
        }

        fx.engine
            .close_room(fx.room_id, &results(&fx, 50, -50), fx.host_user)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn only_host_or_admin_may_close() {
        let fx = fixture().await;
        let stranger = Uuid::new_v4();

        let err = fx
            .engine
            .close_room(fx.room_id, &results(&fx, 50, -50), stranger)
            .await
            .unwrap_err();
        assert!(matches!(err, RoomError::Forbidden(_)));
    }

    #[tokio::test]
    async fn admin_may_close() {
        let fx = fixture().await;

        // Promote the guest seat to admin via a linked user.
        let admin_user = User {
            id: Uuid::new_v4(),
            username: "admin".to_string(),
            password_hash: "hash".to_string(),
            created_at: Utc::now(),
        };
        fx.store.users.insert(&admin_user).await.unwrap();
        fx.store
            .players
            .assign_user(fx.guest_player, admin_user.id)
            .await
            .unwrap();
        fx.store
            .players
            .update_role(fx.guest_player, PlayerRole::Admin)
            .await
            .unwrap();

        fx.engine
            .close_room(fx.room_id, &results(&fx, 50, -50), admin_user.id)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn closing_twice_fails() {
        let fx = fixture().await;

        fx.engine
            .close_room(fx.room_id, &results(&fx, 50, -50), fx.host_user)
            .await
            .unwrap();
        let err = fx
            .engine
            .close_room(fx.room_id, &results(&fx, 0, 0), fx.host_user)
            .await
            .unwrap_err();
        assert!(matches!(err, RoomError::AlreadyClosed(_)));
    }

    #[tokio::test]
    async fn empty_results_are_rejected() {
        let fx = fixture().await;
        let err = fx
            .engine
            .close_room(fx.room_id, &[], fx.host_user)
            .await
            .unwrap_err();
        assert!(matches!(err, RoomError::EmptyResults));
    }

    #[tokio::test]
    async fn unknown_declared_player_is_rejected() {
        let fx = fixture().await;
        let ghost = vec![DeclaredResult {
            player_id: Uuid::new_v4(),
            income: Money::ZERO,
        }];
        let err = fx
            .engine
            .close_room(fx.room_id, &ghost, fx.host_user)
            .await
            .unwrap_err();
        assert!(matches!(err, RoomError::NotFound(_)));
    }

    #[tokio::test]
    async fn concurrent_exchange_forces_retry() {
        let fx = fixture().await;

        // Snapshot the aggregate, then move the room version from
        // under the close by recording an exchange.
        let aggregate = fx
            .store
            .rooms
            .load_aggregate(fx.room_id)
            .await
            .unwrap()
            .unwrap();
        fx.ledger
            .record_exchange(
                fx.room_id,
                fx.host_player,
                Money::from_major(10),
                ExchangeDirection::BuyIn,
            )
            .await
            .unwrap();

        let entries = settlement_entries(&aggregate, &results(&fx, 50, -50)).unwrap();
        let err = fx
            .store
            .rooms
            .settle_and_close(fx.room_id, aggregate.room.version, &entries)
            .await
            .unwrap_err();
        let err: RoomError = err.into();
        assert!(matches!(err, RoomError::ConcurrentUpdate(_)));
    }

    #[tokio::test]
    async fn zero_income_creates_no_row() {
        let fx = fixture().await;

        let closed = fx
            .engine
            .close_room(fx.room_id, &results(&fx, 0, 0), fx.host_user)
            .await
            .unwrap();

        assert_eq!(closed.room.status, RoomStatus::Closed);
        for seat in &closed.seats {
            assert!(seat.exchanges.is_empty());
        }
    }

    #[tokio::test]
    async fn income_below_rate_resolution_rejects_the_close() {
        // 0.01 chips per unit of cash: an income of 0.40 converts to
        // 0.004 chips, which rounds to nothing.
        let store = Store::memory();
        let host = User {
            id: Uuid::new_v4(),
            username: "host".to_string(),
            password_hash: "hash".to_string(),
            created_at: Utc::now(),
        };
        store.users.insert(&host).await.unwrap();

        let lifecycle = RoomLifecycle::new(store.clone());
        let aggregate = lifecycle
            .create_room(
                NewRoom {
                    name: "penny game".to_string(),
                    exchange_rate: Money::from_minor(1),
                    currency: Currency::Usd,
                    base_buy_in: None,
                    is_visible: true,
                    room_key: None,
                    host_name: None,
                },
                host.id,
            )
            .await
            .unwrap();
        let room_id = aggregate.room.id;
        let host_player = aggregate.host().unwrap().player.id;
        let guest = lifecycle
            .join_room(room_id, None, "guest".to_string())
            .await
            .unwrap();

        let engine = SettlementEngine::new(store.clone());
        let results = vec![
            DeclaredResult {
                player_id: host_player,
                income: Money::from_minor(40),
            },
            DeclaredResult {
                player_id: guest.id,
                income: Money::from_minor(-40),
            },
        ];
        let err = engine
            .close_room(room_id, &results, host.id)
            .await
            .unwrap_err();
        assert!(matches!(err, RoomError::IncomeTooSmall { .. }));

        let room = store.rooms.find(room_id).await.unwrap().unwrap();
        assert_eq!(room.status, RoomStatus::Opened);
    }

    #[tokio::test]
    async fn small_residual_within_tolerance_closes() {
        let fx = fixture().await;

        let results = vec![
            DeclaredResult {
                player_id: fx.host_player,
                income: Money::from_minor(5000),
            },
            DeclaredResult {
                player_id: fx.guest_player,
                income: Money::from_minor(-4999),
            },
        ];
        fx.engine
            .close_room(fx.room_id, &results, fx.host_user)
            .await
            .unwrap();
    }
}
