//! API routes

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::handlers;
use crate::state::AppState;

/// Create API v1 routes
pub fn api_v1_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/users", user_routes())
        .nest("/rooms", room_routes())
        .nest("/players", player_routes())
        .route("/exchanges", post(handlers::exchange::create_exchange))
}

fn user_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(handlers::user::create_user))
        .route("/{id}", get(handlers::user::get_user))
}

fn room_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::room::list_rooms))
        .route("/", post(handlers::room::create_room))
        .route("/{id}", get(handlers::room::get_room))
        .route(
            "/{id}/access-token",
            post(handlers::room::regenerate_access_token),
        )
        .route(
            "/{id}/validate-key",
            post(handlers::room::validate_room_key),
        )
        .route("/close/{id}", put(handlers::room::close_room))
}

fn player_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(handlers::player::create_player))
        .route("/{id}", get(handlers::player::get_player))
        .route("/{id}/balance", get(handlers::player::get_balance))
        .route("/{id}/admin", put(handlers::player::promote_to_admin))
        .route("/{id}/assign", put(handlers::player::assign_player))
}
