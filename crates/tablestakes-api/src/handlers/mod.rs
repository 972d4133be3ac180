//! Request handlers

pub mod exchange;
pub mod health;
pub mod player;
pub mod room;
pub mod user;
