//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tablestakes_ledger::LedgerError;
use tablestakes_rooms::RoomError;
use tablestakes_store::StoreError;

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => Self::NotFound(what),
            StoreError::Duplicate(what) => Self::Conflict(format!("{what} already exists")),
            StoreError::Conflict(msg) => Self::Conflict(msg),
            StoreError::RoomClosed(id) => Self::BadRequest(format!("room {id} is closed")),
            other => {
                tracing::error!(error = %other, "store error");
                Self::Internal
            }
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::RoomNotFound(id) => Self::NotFound(format!("room {id}")),
            LedgerError::PlayerNotFound(id) => Self::NotFound(format!("player {id}")),
            LedgerError::Store(store) => store.into(),
            other @ (LedgerError::WrongRoom { .. }
            | LedgerError::RoomClosed(_)
            | LedgerError::NonPositiveAmount(_)
            | LedgerError::InsufficientChips { .. }
            | LedgerError::Money(_)) => Self::BadRequest(other.to_string()),
        }
    }
}

impl From<RoomError> for ApiError {
    fn from(err: RoomError) -> Self {
        match err {
            RoomError::NotFound(what) => Self::NotFound(what),
            RoomError::Forbidden(msg) => Self::Forbidden(msg),
            RoomError::ConcurrentUpdate(msg) => Self::Conflict(msg),
            RoomError::Ledger(ledger) => ledger.into(),
            RoomError::Store(store) => {
                tracing::error!(error = %store, "store error during room operation");
                Self::Internal
            }
            other @ (RoomError::HostNotFound(_)
            | RoomError::AlreadyClosed(_)
            | RoomError::EmptyResults
            | RoomError::Unreconciled { .. }
            | RoomError::IncomeTooSmall { .. }
            | RoomError::InvalidExchangeRate(_)
            | RoomError::InvalidRoomKey
            | RoomError::HostImmutable
            | RoomError::NotUserLinked(_)
            | RoomError::AlreadySeated
            | RoomError::Money(_)) => Self::BadRequest(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = err
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    format!(
                        "{field}: {}",
                        e.message.as_ref().map(|m| m.as_ref()).unwrap_or("invalid")
                    )
                })
            })
            .collect();
        Self::Validation(messages.join(", "))
    }
}
