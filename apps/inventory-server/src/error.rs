//! Error types for the inventory server.
//!
//! ```text
//! CoreError ─┐
//! DbError ───┼──► ServiceError ──► kind() / code() / public_message() ──► Envelope
//! auth ──────┘
//! ```
//!
//! Store and internal faults keep their cause for the log; the envelope
//! only ever sees the redacted public message.

use axum::http::StatusCode;
use ferreteria_core::{CoreError, ValidationError, ValidationErrors};
use ferreteria_db::DbError;
use serde::Serialize;

/// Error class reported in the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Auth,
    Forbidden,
    StoreError,
    Internal,
}

impl ErrorKind {
    /// Only auth failures leave HTTP 200.
    pub fn http_status(&self) -> StatusCode {
        match self {
            ErrorKind::Auth => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            _ => StatusCode::OK,
        }
    }
}

/// Inventory server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Malformed request or argument (wrong type, missing, unparsable body).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Authentication required")]
    AuthRequired,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("User '{username}' is not allowed to perform {operation}")]
    Forbidden { username: String, operation: String },

    #[error("Store error: {0}")]
    Store(#[from] DbError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ValidationErrors> for ServiceError {
    fn from(err: ValidationErrors) -> Self {
        ServiceError::Domain(CoreError::Validation(err))
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Domain(err.into())
    }
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Domain(CoreError::ItemNotFound(_)) => ErrorKind::NotFound,
            ServiceError::Domain(_) | ServiceError::InvalidArgument(_) => ErrorKind::Validation,
            ServiceError::AuthRequired | ServiceError::InvalidCredentials => ErrorKind::Auth,
            ServiceError::Forbidden { .. } => ErrorKind::Forbidden,
            ServiceError::Store(_) => ErrorKind::StoreError,
            ServiceError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Domain(err) => match err {
                CoreError::Validation(_) | CoreError::ItemRetired(_) => "VALIDATION_ERROR",
                CoreError::DuplicateCode(_) => "DUPLICATE_CODE",
                CoreError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
                CoreError::ZeroDelta => "INVALID_ARGUMENT",
                CoreError::ItemNotFound(_) => "ITEM_NOT_FOUND",
            },
            ServiceError::InvalidArgument(_) => "INVALID_ARGUMENT",
            ServiceError::AuthRequired => "AUTH_REQUIRED",
            ServiceError::InvalidCredentials => "INVALID_CREDENTIALS",
            ServiceError::Forbidden { .. } => "FORBIDDEN",
            ServiceError::Store(err) => match err {
                DbError::PoolExhausted => "DB_TIMEOUT",
                DbError::ConnectionFailed(_) => "DB_CONNECTION_ERROR",
                _ => "DB_ERROR",
            },
            ServiceError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to put on the wire.
    pub fn public_message(&self) -> String {
        match self {
            ServiceError::Store(DbError::PoolExhausted) => {
                "Timed out waiting for a database connection".to_string()
            }
            ServiceError::Store(DbError::ConnectionFailed(_)) => {
                "Database connection unavailable".to_string()
            }
            ServiceError::Store(_) => "A database error occurred".to_string(),
            ServiceError::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        }
    }

    /// Store and internal faults are logged with their cause.
    pub fn is_fault(&self) -> bool {
        matches!(self.kind(), ErrorKind::StoreError | ErrorKind::Internal)
    }
}

/// Result type for service and facade operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
