//! Request and response bodies

pub mod exchange;
pub mod player;
pub mod room;
pub mod user;
