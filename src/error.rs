//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::auth::{AuthError, UnauthorizedReason};
use crate::store::StoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Student not found: {0}")]
    StudentNotFound(String),

    #[error("Duplicate value for unique field: {0}")]
    DuplicateKey(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(UnauthorizedReason),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email already registered")]
    EmailTaken,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Concurrent modification: student changed while the payment was applied")]
    ConcurrentModification,

    // Domain errors
    #[error(transparent)]
    Domain(#[from] crate::domain::DomainError),

    // Server errors (5xx)
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey(field) => AppError::DuplicateKey(field),
            StoreError::Unavailable(reason) => AppError::StoreUnavailable(reason),
            StoreError::Database(e) => AppError::Database(e),
            StoreError::Serialization(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthorized(reason) => AppError::Unauthorized(reason),
            AuthError::InvalidCredentials => AppError::InvalidCredentials,
            AuthError::EmailTaken => AppError::EmailTaken,
            AuthError::InvalidRegistration(msg) => AppError::InvalidRequest(msg),
            AuthError::TokenEncoding(msg) | AuthError::PasswordHash(msg) => {
                AppError::Internal(msg)
            }
            AuthError::Store(e) => e.into(),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = match &self {
            // 400 Bad Request
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", Some(msg.clone()))
            }

            // 401 Unauthorized
            AppError::Unauthorized(reason) => {
                (StatusCode::UNAUTHORIZED, reason.error_code(), None)
            }
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "invalid_credentials", None)
            }

            // 403 Forbidden
            AppError::Forbidden(msg) => {
                (StatusCode::FORBIDDEN, "forbidden", Some(msg.clone()))
            }

            // 404 Not Found
            AppError::StudentNotFound(key) => {
                (StatusCode::NOT_FOUND, "student_not_found", Some(key.clone()))
            }

            // 409 Conflict
            AppError::DuplicateKey(field) => {
                (StatusCode::CONFLICT, "duplicate_key", Some(field.clone()))
            }
            AppError::EmailTaken => {
                (StatusCode::CONFLICT, "email_taken", None)
            }
            AppError::ConcurrentModification => {
                (StatusCode::CONFLICT, "concurrent_modification", None)
            }

            // Domain errors - map to appropriate HTTP status
            AppError::Domain(ref domain_err) => {
                use crate::domain::DomainError;
                match domain_err {
                    DomainError::UnknownPlan(plan) => {
                        (StatusCode::BAD_REQUEST, "unknown_plan", Some(plan.clone()))
                    }
                    DomainError::OverpaymentRejected { balance, .. } => {
                        (StatusCode::UNPROCESSABLE_ENTITY, "overpayment_rejected", Some(balance.to_string()))
                    }
                    DomainError::InvalidAmount(msg) => {
                        (StatusCode::BAD_REQUEST, "invalid_amount", Some(msg.clone()))
                    }
                    DomainError::InvalidInput { field, reason } => {
                        (StatusCode::BAD_REQUEST, "invalid_input", Some(format!("{}: {}", field, reason)))
                    }
                    DomainError::CorruptRecord { .. } => {
                        tracing::error!("Corrupt record: {}", domain_err);
                        (StatusCode::INTERNAL_SERVER_ERROR, "corrupt_record", None)
                    }
                }
            }

            // 503 Service Unavailable
            AppError::StoreUnavailable(reason) => {
                tracing::error!("Store unavailable: {}", reason);
                (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", None)
            }

            // 500 Internal Server Error
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
            AppError::Config(e) => {
                tracing::error!("Config error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "config_error", None)
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
