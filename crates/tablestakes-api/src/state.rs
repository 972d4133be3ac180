//! Application state shared across handlers

use tablestakes_ledger::ExchangeLedger;
use tablestakes_rooms::{RoomLifecycle, SettlementEngine};
use tablestakes_store::Store;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub ledger: ExchangeLedger,
    pub lifecycle: RoomLifecycle,
    pub settlement: SettlementEngine,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        Self {
            ledger: ExchangeLedger::new(store.clone()),
            lifecycle: RoomLifecycle::new(store.clone()),
            settlement: SettlementEngine::new(store.clone()),
            store,
        }
    }

    /// State backed entirely by the in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Store::memory())
    }
}
