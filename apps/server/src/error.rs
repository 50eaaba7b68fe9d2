//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Resto POS                              │
//! │                                                                         │
//! │  Dashboard                   Rust Backend                               │
//! │  ─────────                   ────────────                               │
//! │                                                                         │
//! │  fetch('/api/sales', POST)                                              │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Handler  -> Result<Json<T>, ApiError>                           │  │
//! │  │         │                                                        │  │
//! │  │  DbError::NotFound ─────────────────────┐                        │  │
//! │  │  CoreError::InsufficientStock ──────────┼──► ApiError ──► status │  │
//! │  │  ValidationError ───────────────────────┘          + JSON body   │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  { "code": "INSUFFICIENT_STOCK",                                        │
//! │    "message": "Insufficient stock for PRIMUS-72: ..." }                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use resto_core::locale::translate;
use resto_core::CoreError;
use resto_db::DbError;

/// Error body returned by every failing endpoint.
///
/// ```json
/// { "code": "NOT_FOUND", "message": "Product not found: 3f2c..." }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

/// Machine-readable codes; the dashboard switches on these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// 404
    NotFound,
    /// 400
    ValidationError,
    /// 409
    Conflict,
    /// 401
    Unauthenticated,
    /// 403
    Forbidden,
    /// 429
    TooManyAttempts,
    /// 422
    InsufficientStock,
    /// 422
    PaymentError,
    /// 402
    SubscriptionLimit,
    /// 500
    DatabaseError,
    /// 500
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::InsufficientStock | ErrorCode::PaymentError => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ErrorCode::SubscriptionLimit => StatusCode::PAYMENT_REQUIRED,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// 401 with the localized "please log in" message.
    pub fn unauthenticated() -> Self {
        ApiError::new(ErrorCode::Unauthenticated, translate("unauthenticated"))
    }

    /// 403 with the localized message.
    pub fn forbidden() -> Self {
        ApiError::new(ErrorCode::Forbidden, translate("forbidden"))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::Core(e) => ApiError::from(e),
            DbError::ConnectionFailed(_) | DbError::Busy => {
                ApiError::new(ErrorCode::DatabaseError, "Database unavailable")
            }
            DbError::MigrationFailed(e) | DbError::QueryFailed(e) | DbError::Internal(e) => {
                // log the cause, return a generic message
                tracing::error!("Database operation failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", &id),
            CoreError::SaleNotFound(id) => ApiError::not_found("Sale", &id),
            CoreError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, message)
            }
            CoreError::InsufficientPayment { .. } | CoreError::InvalidPaymentAmount { .. } => {
                ApiError::new(ErrorCode::PaymentError, message)
            }
            CoreError::QuantityTooLarge { .. } => ApiError::validation(message),
            CoreError::SubscriptionLimit { .. } => {
                ApiError::new(ErrorCode::SubscriptionLimit, message)
            }
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

impl From<resto_core::ValidationError> for ApiError {
    fn from(err: resto_core::ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status();
        if status.is_server_error() {
            tracing::error!(code = ?self.code, message = %self.message, "Request failed");
        } else {
            tracing::debug!(code = ?self.code, message = %self.message, "Request rejected");
        }

        (status, Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

pub type ApiResult<T> = Result<T, ApiError>;
