//! Tablestakes core types
//!
//! Shared vocabulary for the poker session ledger: the fixed-point
//! [`Money`] type, cash currencies, and the plain immutable records
//! for rooms, players, exchanges and users. Persistence lives behind
//! repository traits in `tablestakes-store`; nothing here touches a
//! database.

pub mod currency;
pub mod exchange;
pub mod money;
pub mod player;
pub mod room;
pub mod user;

pub use currency::Currency;
pub use exchange::{Exchange, ExchangeDirection, NewExchange};
pub use money::{Money, MoneyError};
pub use player::{Player, PlayerRole};
pub use room::{Room, RoomAggregate, RoomStatus, Seat};
pub use user::User;
