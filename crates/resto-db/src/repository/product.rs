//! # Product Repository
//!
//! Database operations for products and their stock.
//!
//! ## Key Operations
//! - LIKE search over name, code and category
//! - CRUD with soft delete
//! - Stock adjustments per granularity (crate / bottle / glass)
//! - Low-stock listing in bottle equivalents
//!
//! ## Stock Adjustment
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  adjust_stock(id, delta { crates: +2, bottles: -3, glasses: 0 })    │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  BEGIN ── read row ── apply delta ── any count < 0 ? ── ROLLBACK    │
//! │                                          │                          │
//! │                                          ▼ no                       │
//! │                                  UPDATE ... COMMIT                  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use resto_core::validation::validate_stock;
use resto_core::{CoreError, Product, StockLevels, ValidationError};

pub(crate) const PRODUCT_COLUMNS: &str = "id, name, code, category, unit_of_measure, \
    bottles_per_crate, glasses_per_bottle, stock_crates, stock_bottles, stock_glasses, \
    min_stock, price_crate_fc, price_bottle_fc, price_glass_fc, is_active, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let results = repo.search("primus", 20).await?;
/// let product = repo.get_by_code("PRIMUS-72").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Searches active products by name, code or category.
    ///
    /// An empty query lists active products by name.
    pub async fn search(&self, query: &str, limit: i64) -> DbResult<Vec<Product>> {
        let query = query.trim();

        debug!(query = %query, limit = limit, "Searching products");

        if query.is_empty() {
            return self.list(limit, 0).await;
        }

        let pattern = format!("%{}%", escape_like(query));
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE is_active = 1 \
             AND (name LIKE ?1 ESCAPE '\\' OR code LIKE ?1 ESCAPE '\\' OR category LIKE ?1 ESCAPE '\\') \
             ORDER BY name LIMIT ?2"
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(&pattern)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Lists active products ordered by name.
    pub async fn list(&self, limit: i64, offset: i64) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1 \
             ORDER BY name LIMIT ?1 OFFSET ?2"
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Gets a product by ID, including soft-deleted ones.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE code = ?1");

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(code.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - code already exists
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(code = %product.code, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, code, category, unit_of_measure,
                bottles_per_crate, glasses_per_bottle,
                stock_crates, stock_bottles, stock_glasses, min_stock,
                price_crate_fc, price_bottle_fc, price_glass_fc,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.code)
        .bind(&product.category)
        .bind(&product.unit_of_measure)
        .bind(product.bottles_per_crate)
        .bind(product.glasses_per_bottle)
        .bind(product.stock_crates)
        .bind(product.stock_bottles)
        .bind(product.stock_glasses)
        .bind(product.min_stock)
        .bind(product.price_crate_fc)
        .bind(product.price_bottle_fc)
        .bind(product.price_glass_fc)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: product.code.clone(),
            },
            other => other,
        })?;

        Ok(product.clone())
    }

    /// Updates descriptive fields, packaging and prices. Stock goes through
    /// [`adjust_stock`](Self::adjust_stock).
    pub async fn update(&self, product: &Product) -> DbResult<Product> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                code = ?3,
                category = ?4,
                unit_of_measure = ?5,
                bottles_per_crate = ?6,
                glasses_per_bottle = ?7,
                min_stock = ?8,
                price_crate_fc = ?9,
                price_bottle_fc = ?10,
                price_glass_fc = ?11,
                is_active = ?12,
                updated_at = ?13
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.code)
        .bind(&product.category)
        .bind(&product.unit_of_measure)
        .bind(product.bottles_per_crate)
        .bind(product.glasses_per_bottle)
        .bind(product.min_stock)
        .bind(product.price_crate_fc)
        .bind(product.price_bottle_fc)
        .bind(product.price_glass_fc)
        .bind(product.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        self.get_by_id(&product.id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", &product.id))
    }

    /// Adds `delta` to each stock count (negative values remove stock).
    ///
    /// Fails without writing if any count would drop below zero.
    pub async fn adjust_stock(&self, id: &str, delta: StockLevels) -> DbResult<Product> {
        debug!(
            id = %id,
            crates = delta.crates,
            bottles = delta.bottles,
            glasses = delta.glasses,
            "Adjusting stock"
        );

        let mut tx = self.pool.begin().await?;

        let product = fetch_for_update(&mut tx, id).await?;
        let current = product.stock();
        let next = StockLevels {
            crates: adjusted("stock_crates", current.crates, delta.crates)?,
            bottles: adjusted("stock_bottles", current.bottles, delta.bottles)?,
            glasses: adjusted("stock_glasses", current.glasses, delta.glasses)?,
        };

        write_stock(&mut tx, id, next).await?;
        tx.commit().await?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Soft-deletes a product; past sales keep referencing it.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Number of active products (checked against the plan limit).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Active products whose stock, in bottle equivalents, is at or below
    /// `min_stock`.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE is_active = 1 \
             AND (stock_crates * bottles_per_crate + stock_bottles + stock_glasses / glasses_per_bottle) <= min_stock \
             ORDER BY name"
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Low stock products");
        Ok(products)
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

/// `count + delta`, rejected when negative or out of the `i64` range.
fn adjusted(field: &str, count: i64, delta: i64) -> DbResult<i64> {
    let next = count.checked_add(delta).ok_or_else(|| {
        CoreError::from(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        })
    })?;
    validate_stock(field, next).map_err(CoreError::from)?;
    Ok(next)
}

/// Reads a product inside an open transaction.
pub(crate) async fn fetch_for_update(conn: &mut SqliteConnection, id: &str) -> DbResult<Product> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");

    sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Product", id))
}

pub(crate) async fn write_stock(
    conn: &mut SqliteConnection,
    id: &str,
    levels: StockLevels,
) -> DbResult<()> {
    sqlx::query(
        "UPDATE products SET stock_crates = ?2, stock_bottles = ?3, stock_glasses = ?4, \
         updated_at = ?5 WHERE id = ?1",
    )
    .bind(id)
    .bind(levels.crates)
    .bind(levels.bottles)
    .bind(levels.glasses)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use resto_core::factory::fake_product;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn product(code: &str) -> Product {
        let mut p = fake_product(&mut StdRng::seed_from_u64(code.len() as u64));
        p.code = code.to_string();
        p.name = format!("Produit {}", code);
        p.category = "Bières".to_string();
        p.bottles_per_crate = 24;
        p.glasses_per_bottle = 4;
        p.stock_crates = 1;
        p.stock_bottles = 2;
        p.stock_glasses = 3;
        p.min_stock = 10;
        p
    }

    #[tokio::test]
    async fn test_insert_and_get_by_code() {
        let db = db().await;
        let p = product("PRIMUS-72");
        db.products().insert(&p).await.unwrap();

        let found = db.products().get_by_code("PRIMUS-72").await.unwrap().unwrap();
        assert_eq!(found.id, p.id);
        assert_eq!(found.price_bottle_fc, p.price_bottle_fc);
        assert_eq!(db.products().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_code_is_rejected() {
        let db = db().await;
        db.products().insert(&product("SIMBA")).await.unwrap();

        let mut dup = product("SIMBA");
        dup.id = "other-id".to_string();
        let err = db.products().insert(&dup).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref value, .. } if value == "SIMBA"));
    }

    #[tokio::test]
    async fn test_search_matches_name_code_and_category() {
        let db = db().await;
        let mut fanta = product("FANTA-33");
        fanta.id = "fanta".to_string();
        fanta.category = "Sucrés".to_string();
        db.products().insert(&product("PRIMUS-72")).await.unwrap();
        db.products().insert(&fanta).await.unwrap();

        assert_eq!(db.products().search("primus", 10).await.unwrap().len(), 1);
        assert_eq!(db.products().search("Sucrés", 10).await.unwrap().len(), 1);
        assert_eq!(db.products().search("", 10).await.unwrap().len(), 2);
        assert!(db.products().search("100%", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_adjust_stock_rejects_negative() {
        let db = db().await;
        let p = product("TEMBO");
        db.products().insert(&p).await.unwrap();

        let updated = db
            .products()
            .adjust_stock(&p.id, StockLevels { crates: 2, bottles: -2, glasses: 0 })
            .await
            .unwrap();
        assert_eq!(updated.stock(), StockLevels { crates: 3, bottles: 0, glasses: 3 });

        let err = db
            .products()
            .adjust_stock(&p.id, StockLevels { crates: 0, bottles: -1, glasses: 0 })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));

        let unchanged = db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(unchanged.stock_crates, 3);
    }

    #[tokio::test]
    async fn test_adjust_stock_rejects_overflow() {
        let db = db().await;
        let p = product("NKOYI");
        db.products().insert(&p).await.unwrap();

        let err = db
            .products()
            .adjust_stock(&p.id, StockLevels { crates: i64::MAX, bottles: 0, glasses: 0 })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));

        let unchanged = db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(unchanged.stock(), p.stock());
    }

    #[tokio::test]
    async fn test_low_stock_and_soft_delete() {
        let db = db().await;
        let mut low = product("LOW");
        low.stock_crates = 0;
        low.stock_bottles = 9;
        low.stock_glasses = 7; // one more bottle: 10 <= 10
        let mut ok = product("OK");
        ok.id = "ok".to_string();
        db.products().insert(&low).await.unwrap();
        db.products().insert(&ok).await.unwrap();

        let flagged = db.products().low_stock().await.unwrap();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].code, "LOW");
        assert!(flagged[0].is_low_stock());

        db.products().soft_delete(&low.id).await.unwrap();
        assert!(db.products().low_stock().await.unwrap().is_empty());
        assert_eq!(db.products().count().await.unwrap(), 1);
        assert!(db.products().soft_delete("missing").await.is_err());
    }
}
