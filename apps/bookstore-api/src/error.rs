//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Back-Office API                    │
//! │                                                                         │
//! │  Client                      Rust Backend                               │
//! │  ──────                      ────────────                               │
//! │                                                                         │
//! │  POST /orders                                                           │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Handler                                                         │  │
//! │  │  Result<Json<T>, ApiError>                                       │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  DbError::InUse ──────────────────────┐                          │  │
//! │  │  CoreError::InsufficientStock ────────┼──► ApiError ───────────►│  │
//! │  │  ValidationError::Required ───────────┘   (code, message)       │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  HTTP 422                                                               │
//! │  { "code": "INSUFFICIENT_STOCK",                                        │
//! │    "message": "Insufficient stock for Dune: available 2, requested 5" } │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

use bookstore_core::{CoreError, ValidationError};
use bookstore_db::DbError;

/// Error body returned by every failing handler.
///
/// ```json
/// {
///   "code": "IN_USE",
///   "message": "Cannot delete customer: they have associated orders"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Not enough copies on the shelf (422)
    InsufficientStock,

    /// Row still referenced by others (409)
    InUse,

    /// Primary key sequence out of step with the data (409)
    SequenceConflict,

    /// Unique value already taken (409)
    Duplicate,

    /// Missing, invalid or signed-out session (401)
    Unauthorized,

    /// Database unreachable (503)
    Unavailable,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::InsufficientStock => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::InUse | ErrorCode::SequenceConflict | ErrorCode::Duplicate => {
                StatusCode::CONFLICT
            }
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    /// Creates an internal error. The detail is logged, the client gets a
    /// generic message.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        error!(%detail, "Internal error");
        ApiError::new(ErrorCode::Internal, "An internal error occurred")
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::Domain(core) => ApiError::from(core),
            err @ DbError::InUse { .. } => ApiError::new(ErrorCode::InUse, err.to_string()),
            err @ DbError::SequenceConflict { .. } => {
                warn!(error = %err, "Primary key sequence conflict");
                ApiError::new(ErrorCode::SequenceConflict, err.to_string())
            }
            err @ DbError::UniqueViolation { .. } => {
                ApiError::new(ErrorCode::Duplicate, err.to_string())
            }
            DbError::ForeignKeyViolation { message } => {
                warn!(%message, "Foreign key violation");
                ApiError::validation("Invalid reference: the related record does not exist")
            }
            DbError::CheckViolation { message } => {
                warn!(%message, "Check constraint violation");
                ApiError::validation("Value out of range")
            }
            DbError::ConnectionFailed(e) => {
                error!(error = %e, "Database connection failed");
                ApiError::new(ErrorCode::Unavailable, "Database unavailable")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::Unavailable, "Database busy, try again")
            }
            err @ (DbError::MigrationFailed(_)
            | DbError::QueryFailed(_)
            | DbError::TransactionFailed(_)
            | DbError::Internal(_)) => ApiError::internal(err),
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::BookNotFound(id) => ApiError::not_found("Book", &id.to_string()),
            err @ CoreError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, err.to_string())
            }
            err @ CoreError::NoValidPurchaseLines => ApiError::validation(err.to_string()),
            CoreError::Validation(v) => ApiError::from(v),
        }
    }
}

/// Converts validation errors to API errors.
impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;
