/// Error types for the Sociogram API
///
/// Every handler returns [`Result`]; `AppError` implements `ResponseError`, so
/// actix renders all failures through the same envelope as successful
/// responses. Server-side faults are logged here and reach the caller only as
/// a generic message.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

use crate::response::ApiResponse;

/// Result type for sociogram-api operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Message returned for every 5xx so internals never leak to clients.
pub const GENERIC_SERVER_ERROR: &str = "An unexpected error occurred";

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or out-of-range input
    #[error("{0}")]
    Validation(String),

    /// Missing, invalid or expired credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated caller acting on someone else's resource
    #[error("{0}")]
    Forbidden(String),

    /// Unknown resource; the payload is the resource name ("Post", "User")
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Duplicate resource
    #[error("{0}")]
    Conflict(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Anything else that is our fault
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn is_server_error(&self) -> bool {
        matches!(self, AppError::Database(_) | AppError::Internal(_))
    }

    /// Message exposed to API clients.
    pub fn public_message(&self) -> String {
        if self.is_server_error() {
            GENERIC_SERVER_ERROR.to_string()
        } else {
            self.to_string()
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        if self.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }

        HttpResponse::build(status).json(ApiResponse::<()>::failure(self.public_message()))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => format!("{}: {}", field, message),
                    None => format!("{}: invalid value ({})", field, e.code),
                })
            })
            .collect();
        messages.sort();

        if messages.is_empty() {
            AppError::Validation("Validation failed".to_string())
        } else {
            AppError::Validation(messages.join("; "))
        }
    }
}

impl From<crypto_core::TokenError> for AppError {
    fn from(err: crypto_core::TokenError) -> Self {
        match err {
            crypto_core::TokenError::Invalid => {
                AppError::Unauthorized("Invalid or expired token".to_string())
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}
