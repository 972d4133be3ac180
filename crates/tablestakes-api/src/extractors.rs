//! Custom Axum extractors
//!
//! Session resolution happens upstream; the proxy forwards the
//! resolved user id in the `x-user-id` header.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::error::ApiError;

const USER_ID_HEADER: &str = "x-user-id";

fn user_id_from_parts(parts: &Parts) -> Option<Uuid> {
    parts
        .headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
}

/// Authenticated caller. Rejects with 401 when the header is absent
/// or malformed.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Uuid);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        user_id_from_parts(parts)
            .map(CurrentUser)
            .ok_or_else(|| ApiError::Unauthorized.into_response())
    }
}

/// Optional caller identity for public endpoints.
#[derive(Debug, Clone, Copy)]
pub struct MaybeUser(pub Option<Uuid>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(user_id_from_parts(parts)))
    }
}
