//! # Database Error Types
//!
//! ```text
//! sqlx::Error ───────────┐
//! MigrateError ──────────┼──► DbError ──► ApiError (apps/server)
//! CoreError (stock,      │
//!  payment, limits) ─────┘
//! ```
//!
//! Business rules checked inside a transaction (stock while recording a
//! sale) surface as `DbError::Core` so callers keep the original
//! `CoreError`.

use resto_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// Unknown id, or an `UPDATE`/`DELETE` that touched no row.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Product code, printer name or user email already taken.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// A sale line or session pointing at a row that does not exist.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// SQLite rejected the statement for another reason (CHECK, syntax...).
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Every pooled connection stayed busy past the acquire timeout.
    #[error("Database busy")]
    Busy,

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// `"UNIQUE constraint failed: products.code"` → `"code"`.
fn unique_column(message: &str) -> Option<&str> {
    let columns = message.strip_prefix("UNIQUE constraint failed: ")?;
    let first = columns.split(',').next()?.trim();
    Some(first.rsplit('.').next().unwrap_or(first))
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::Database(db_err) => {
                let message = db_err.message();
                if let Some(column) = unique_column(message) {
                    // value filled in by the repository that knows it
                    DbError::duplicate(column, "unknown")
                } else if message.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: message.to_string(),
                    }
                } else {
                    DbError::QueryFailed(message.to_string())
                }
            }
            sqlx::Error::PoolTimedOut => DbError::Busy,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;
