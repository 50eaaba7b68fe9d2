//! # Printer Repository
//!
//! Receipt printer configuration.
//!
//! Printers are keyed by their unique name: saving a printer whose name
//! already exists updates that row. At most one printer is the default;
//! the schema enforces it with a partial unique index and
//! [`set_default`](PrinterRepository::set_default) moves the flag in one
//! transaction.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use resto_core::validation::{
    validate_paper_width, validate_printer_name, validate_restaurant_name,
};
use resto_core::{ConnectionType, CoreError, Printer};

const PRINTER_COLUMNS: &str = "id, name, connection_type, connection, is_default, paper_width, \
    header, footer, restaurant_name, restaurant_address, restaurant_phone, restaurant_message, \
    created_at, updated_at";

/// Printer fields written on create or update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinterInput {
    pub name: String,
    #[serde(default)]
    pub connection_type: ConnectionType,
    #[serde(default)]
    pub connection: Option<String>,
    #[serde(default = "default_paper_width")]
    pub paper_width: i64,
    #[serde(default)]
    pub header: Option<String>,
    #[serde(default)]
    pub footer: Option<String>,
    pub restaurant_name: String,
    #[serde(default)]
    pub restaurant_address: Option<String>,
    #[serde(default)]
    pub restaurant_phone: Option<String>,
    #[serde(default)]
    pub restaurant_message: Option<String>,
}

fn default_paper_width() -> i64 {
    80
}

impl PrinterInput {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_printer_name(&self.name)?;
        validate_restaurant_name(&self.restaurant_name)?;
        validate_paper_width(self.paper_width)?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct PrinterRepository {
    pool: SqlitePool,
}

impl PrinterRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PrinterRepository { pool }
    }

    /// Creates the printer, or updates the one with the same name.
    ///
    /// Calling it twice with the same input leaves a single row with the
    /// same id; `is_default` is never touched here.
    pub async fn upsert_by_name(&self, input: &PrinterInput) -> DbResult<Printer> {
        input.validate()?;

        let name = input.name.trim();
        let now = Utc::now();

        debug!(name = %name, "Upserting printer");

        sqlx::query(
            r#"
            INSERT INTO printers (
                id, name, connection_type, connection, is_default, paper_width,
                header, footer, restaurant_name, restaurant_address,
                restaurant_phone, restaurant_message, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
            ON CONFLICT(name) DO UPDATE SET
                connection_type = excluded.connection_type,
                connection = excluded.connection,
                paper_width = excluded.paper_width,
                header = excluded.header,
                footer = excluded.footer,
                restaurant_name = excluded.restaurant_name,
                restaurant_address = excluded.restaurant_address,
                restaurant_phone = excluded.restaurant_phone,
                restaurant_message = excluded.restaurant_message,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(name)
        .bind(input.connection_type)
        .bind(&input.connection)
        .bind(input.paper_width)
        .bind(&input.header)
        .bind(&input.footer)
        .bind(input.restaurant_name.trim())
        .bind(&input.restaurant_address)
        .bind(&input.restaurant_phone)
        .bind(&input.restaurant_message)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get_by_name(name)
            .await?
            .ok_or_else(|| DbError::not_found("Printer", name))
    }

    /// Updates the printer `id` with new values, including its name.
    pub async fn update(&self, id: &str, input: &PrinterInput) -> DbResult<Printer> {
        input.validate()?;

        let result = sqlx::query(
            r#"
            UPDATE printers SET
                name = ?2, connection_type = ?3, connection = ?4, paper_width = ?5,
                header = ?6, footer = ?7, restaurant_name = ?8, restaurant_address = ?9,
                restaurant_phone = ?10, restaurant_message = ?11, updated_at = ?12
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(input.connection_type)
        .bind(&input.connection)
        .bind(input.paper_width)
        .bind(&input.header)
        .bind(&input.footer)
        .bind(input.restaurant_name.trim())
        .bind(&input.restaurant_address)
        .bind(&input.restaurant_phone)
        .bind(&input.restaurant_message)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: input.name.trim().to_string(),
            },
            other => other,
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Printer", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Printer", id))
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Printer>> {
        let sql = format!("SELECT {PRINTER_COLUMNS} FROM printers WHERE id = ?1");

        Ok(sqlx::query_as::<_, Printer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Printer>> {
        let sql = format!("SELECT {PRINTER_COLUMNS} FROM printers WHERE name = ?1");

        Ok(sqlx::query_as::<_, Printer>(&sql)
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Default printer first, then by name.
    pub async fn list(&self) -> DbResult<Vec<Printer>> {
        let sql = format!("SELECT {PRINTER_COLUMNS} FROM printers ORDER BY is_default DESC, name");

        Ok(sqlx::query_as::<_, Printer>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn get_default(&self) -> DbResult<Option<Printer>> {
        let sql = format!("SELECT {PRINTER_COLUMNS} FROM printers WHERE is_default = 1");

        Ok(sqlx::query_as::<_, Printer>(&sql)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Makes `id` the only default printer.
    pub async fn set_default(&self, id: &str) -> DbResult<Printer> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE printers SET is_default = 0 WHERE is_default = 1 AND id <> ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("UPDATE printers SET is_default = 1, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Printer", id));
        }

        tx.commit().await?;
        info!(id = %id, "Default printer set");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Printer", id))
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting printer");

        let result = sqlx::query("DELETE FROM printers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Printer", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
