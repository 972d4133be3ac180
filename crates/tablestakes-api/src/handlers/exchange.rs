//! Exchange handlers

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use crate::dto::exchange::{CreateExchangeRequest, ExchangeResponse};
use crate::error::ApiResult;
use crate::extractors::CurrentUser;
use crate::state::AppState;

pub async fn create_exchange(
    State(state): State<Arc<AppState>>,
    CurrentUser(_user_id): CurrentUser,
    Json(req): Json<CreateExchangeRequest>,
) -> ApiResult<(StatusCode, Json<ExchangeResponse>)> {
    let exchange = state
        .ledger
        .record_exchange(req.room_id, req.player_id, req.amount, req.direction)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ExchangeResponse::from_exchange(exchange, req.room_id)),
    ))
}
