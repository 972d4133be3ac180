//! Tablestakes REST API
//!
//! ```text
//! /api/v1/
//! ├── /users         - Registration and lookup
//! ├── /rooms         - Room lifecycle, access tokens, settlement
//! ├── /players       - Seats, balances, roles
//! └── /exchanges     - Chip/cash exchange ledger
//! ```
//!
//! Session resolution is an upstream concern; handlers trust the
//! `x-user-id` header the proxy forwards after authenticating.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod routes;
pub mod state;

use axum::http::HeaderName;
use axum::Router;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// Create the main API router with all middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    let x_request_id = HeaderName::from_static("x-request-id");

    Router::new()
        .nest("/api/v1", routes::api_v1_routes())
        .route(
            "/health",
            axum::routing::get(handlers::health::health_check),
        )
        .with_state(state)
        .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
        .layer(PropagateRequestIdLayer::new(x_request_id))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");

                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(CorsLayer::permissive())
}

/// Create a minimal router for testing
pub fn create_test_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_v1_routes())
        .route(
            "/health",
            axum::routing::get(handlers::health::health_check),
        )
        .with_state(state)
}
