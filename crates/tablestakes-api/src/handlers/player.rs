//! Player handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::player::{BalanceResponse, CreatePlayerRequest, PlayerResponse};
use crate::error::{ApiError, ApiResult};
use crate::extractors::CurrentUser;
use crate::state::AppState;

pub async fn create_player(
    State(state): State<Arc<AppState>>,
    CurrentUser(_user_id): CurrentUser,
    Json(req): Json<CreatePlayerRequest>,
) -> ApiResult<(StatusCode, Json<PlayerResponse>)> {
    req.validate()?;

    let player = state
        .lifecycle
        .join_room(req.room_id, req.user_id, req.name)
        .await?;
    Ok((StatusCode::CREATED, Json(player.into())))
}

pub async fn get_player(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PlayerResponse>> {
    let player = state
        .store
        .players
        .find(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("player {id}")))?;
    Ok(Json(player.into()))
}

/// Current chip balance folded from the player's exchange history.
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<BalanceResponse>> {
    // Unknown ids fold to zero in the ledger; surface 404 instead.
    state
        .store
        .players
        .find(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("player {id}")))?;

    let balance = state
        .ledger
        .player_chip_balance(id)
        .await
        .map_err(ApiError::from)?;
    Ok(Json(BalanceResponse { balance }))
}

pub async fn promote_to_admin(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<PlayerResponse>> {
    let player = state.lifecycle.promote_to_admin(id, user_id).await?;
    Ok(Json(player.into()))
}

/// Claim an unclaimed seat for the calling user.
pub async fn assign_player(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<PlayerResponse>> {
    let player = state.lifecycle.assign_player(id, user_id).await?;
    Ok(Json(player.into()))
}
