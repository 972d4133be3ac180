//! Room handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use tablestakes_rooms::{DeclaredResult, NewRoom};

use crate::dto::room::{
    AccessTokenResponse, CreateRoomRequest, RoomQuery, RoomResponse, RoomSummary,
    ValidateKeyRequest, ValidateKeyResponse,
};
use crate::error::ApiResult;
use crate::extractors::{CurrentUser, MaybeUser};
use crate::state::AppState;

pub async fn list_rooms(
    State(state): State<Arc<AppState>>,
    MaybeUser(user_id): MaybeUser,
) -> ApiResult<Json<Vec<RoomSummary>>> {
    let rooms = state.lifecycle.list_rooms(user_id).await?;
    Ok(Json(rooms.into_iter().map(RoomSummary::from).collect()))
}

pub async fn create_room(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<CreateRoomRequest>,
) -> ApiResult<(StatusCode, Json<RoomResponse>)> {
    req.validate()?;

    let aggregate = state
        .lifecycle
        .create_room(
            NewRoom {
                name: req.name,
                exchange_rate: req.exchange_rate,
                currency: req.currency,
                base_buy_in: req.base_buy_in,
                is_visible: req.is_visible,
                room_key: req.room_key,
                host_name: req.host_name,
            },
            user_id,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(aggregate.into())))
}

pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<RoomQuery>,
    MaybeUser(user_id): MaybeUser,
) -> ApiResult<Json<RoomResponse>> {
    let aggregate = state
        .lifecycle
        .find_room(id, query.access_token.as_deref(), user_id)
        .await?;
    Ok(Json(aggregate.into()))
}

pub async fn regenerate_access_token(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<AccessTokenResponse>> {
    let access_token = state.lifecycle.regenerate_access_token(id, user_id).await?;
    Ok(Json(AccessTokenResponse { access_token }))
}

pub async fn validate_room_key(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    MaybeUser(user_id): MaybeUser,
    Json(req): Json<ValidateKeyRequest>,
) -> ApiResult<Json<ValidateKeyResponse>> {
    let valid = state
        .lifecycle
        .validate_room_key(id, &req.room_key, user_id)
        .await?;
    Ok(Json(ValidateKeyResponse { valid }))
}

pub async fn close_room(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    CurrentUser(user_id): CurrentUser,
    Json(results): Json<Vec<DeclaredResult>>,
) -> ApiResult<Json<RoomResponse>> {
    let aggregate = state.settlement.close_room(id, &results, user_id).await?;
    Ok(Json(aggregate.into()))
}
