//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Database unavailable: {0}")]
    DbUnavailable(String),

    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, "validation_error", m.as_str()),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, "unauthorized", m.as_str()),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m.as_str()),
            AppError::Upstream(m) => (StatusCode::BAD_GATEWAY, "upstream_error", m.as_str()),
            AppError::DbUnavailable(m) => {
                (StatusCode::SERVICE_UNAVAILABLE, "db_unavailable", m.as_str())
            }
            AppError::Internal(detail) => {
                error!(detail = %detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                )
            }
        };
        let body = Json(ErrorResponse {
            error: error.to_string(),
            message: message.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                AppError::DbUnavailable(e.to_string())
            }
            _ => AppError::Internal(e.to_string()),
        }
    }
}

impl From<peachy_core::session::SessionError> for AppError {
    fn from(e: peachy_core::session::SessionError) -> Self {
        match e {
            peachy_core::session::SessionError::DbError(e) => AppError::from(e),
            peachy_core::session::SessionError::UserNotFound(id) => {
                AppError::NotFound(format!("user {id}"))
            }
            peachy_core::session::SessionError::Data(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<peachy_core::discord::DiscordError> for AppError {
    fn from(e: peachy_core::discord::DiscordError) -> Self {
        use peachy_core::discord::DiscordError;
        match e {
            DiscordError::Http { status: 401, .. } => {
                AppError::Unauthorized("Discord rejected the access token".into())
            }
            DiscordError::Http {
                endpoint, status, ..
            } => AppError::Upstream(format!("Discord {endpoint} returned HTTP {status}")),
            DiscordError::Request(_) | DiscordError::Parse(_) => {
                AppError::Upstream("Discord request failed".into())
            }
            DiscordError::Url(e) => AppError::Internal(e.to_string()),
        }
    }
}
