//! API error types and HTTP response mapping.

use accounts_core::error::{DomainError, ErrorKind};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Application-level errors for startup and infrastructure.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration error.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Server startup error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON error response body.
#[derive(Serialize)]
pub struct ErrorBody {
    /// Error kind, e.g. `"not_found"`.
    pub error: &'static str,
    /// Human-readable message.
    pub message: String,
}

/// Wrapper that maps `DomainError` to HTTP responses.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InputInvalid => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Duplicate | ErrorKind::ConcurrencyConflict | ErrorKind::MaxRetriesExceeded => {
            StatusCode::CONFLICT
        }
        ErrorKind::DomainConstraintsViolation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::InvalidCredentials => StatusCode::UNAUTHORIZED,
        ErrorKind::MarshalingFailed | ErrorKind::UnmarshalingFailed | ErrorKind::Technical => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = status_for(kind);

        // Internal details stay in the log.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self.0, "request failed");
            "internal server error".to_owned()
        } else {
            self.0.to_string()
        };

        let body = ErrorBody {
            error: kind.as_str(),
            message,
        };

        (status, Json(body)).into_response()
    }
}
