//! Tablestakes room services
//!
//! Lifecycle (create, join, seats, access tokens) and settlement
//! (reconcile declared results and close) over the shared store.

pub mod error;
pub mod lifecycle;
pub mod settlement;

pub use error::{Result, RoomError};
pub use lifecycle::{NewRoom, RoomLifecycle};
pub use settlement::{DeclaredResult, SettlementEngine};
