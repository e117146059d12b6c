//! Domain error types for the model cloud server.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.

use actix_web::{HttpResponse, ResponseError};
use std::fmt;

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),

    /// Invalid input data (missing or malformed field)
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Resource already exists
    #[error("Duplicate: {0}")]
    Duplicate(String),

    /// Authentication failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller lacks the required role or ownership
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Artifact store returned a non-success status.
    /// Carries the remote status code and response body verbatim.
    #[error("Artifact store error (status {status}): {body}")]
    Remote { status: u16, body: String },

    /// Remote content could not be decoded (invalid base64 or UTF-8)
    #[error("Decode error: {0}")]
    Decode(String),
}

impl AppError {
    /// Build a `Remote` error from a Gitea response.
    pub fn remote(status: u16, body: impl Into<String>) -> Self {
        AppError::Remote {
            status,
            body: body.into(),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status, error_code, response_message) = match self {
            AppError::Database(err_str) => {
                tracing::error!("Database error: {}", err_str);
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "An internal database error occurred".to_string(),
                )
            }
            AppError::NotFound(_) => (
                actix_web::http::StatusCode::NOT_FOUND,
                "NOT_FOUND",
                self.to_string(),
            ),
            AppError::Validation(_) => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "INVALID_INPUT",
                self.to_string(),
            ),
            AppError::Duplicate(_) => (
                actix_web::http::StatusCode::CONFLICT,
                "DUPLICATE",
                self.to_string(),
            ),
            AppError::Unauthorized(_) => (
                actix_web::http::StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                self.to_string(),
            ),
            AppError::PermissionDenied(_) => (
                actix_web::http::StatusCode::FORBIDDEN,
                "FORBIDDEN",
                self.to_string(),
            ),
            AppError::Remote { .. } => (
                actix_web::http::StatusCode::BAD_GATEWAY,
                "ARTIFACT_STORE_ERROR",
                self.to_string(),
            ),
            AppError::Decode(_) => (
                actix_web::http::StatusCode::BAD_GATEWAY,
                "DECODE_ERROR",
                self.to_string(),
            ),
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: error_code.to_string(),
            message: response_message,
        })
    }
}

/// Error response body matching the OpenAPI schema.
#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

// Conversion implementations for common error types

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("JSON parsing error: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        // Network-level failure talking to the artifact store; no HTTP status.
        AppError::Remote {
            status: 0,
            body: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_carries_status_and_body() {
        let err = AppError::remote(409, "repository already exists");
        assert_eq!(
            err.to_string(),
            "Artifact store error (status 409): repository already exists"
        );
    }

    #[test]
    fn not_found_display() {
        let err = AppError::NotFound("Model 42".to_string());
        assert_eq!(err.to_string(), "Model 42 not found");
    }
}
