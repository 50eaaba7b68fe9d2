//! # Sale Repository
//!
//! Records sales with their lines and stock movements.
//!
//! ## Recording a Sale
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record(user, lines, tender, mode, rate)                               │
//! │       │                                                                 │
//! │       ▼  BEGIN IMMEDIATE (write lock before any read)                   │
//! │  load each product ──► price_lines ──► settle (FC + USD snapshot)      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  take stock line by line (opening crates / bottles as needed)          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  next receipt number for today ──► INSERT sale, items, UPDATE stock    │
//! │       │                                                                 │
//! │       ▼  COMMIT (any failure runs ROLLBACK)                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::product::{fetch_for_update, write_stock};
use resto_core::pricing::{price_lines, settle, total_of, SaleLine, Tender};
use resto_core::{ExchangeRate, PaymentMode, Product, Sale, SaleItem, StockLevels};

const SALE_COLUMNS: &str = "id, receipt_number, user_id, buyer_name, \
    montant_total_fc, montant_paye_fc, rendu_fc, \
    montant_total_usd, montant_paye_usd, rendu_usd, \
    payment_mode, exchange_rate, is_printed, is_synced, created_at";

const ITEM_COLUMNS: &str =
    "id, sale_id, product_id, name_snapshot, unit, quantity, unit_price_fc, line_total_fc";

/// Totals for one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub date: NaiveDate,
    pub sale_count: i64,
    pub total_fc: i64,
    /// Cents, summed from each sale's snapshot.
    pub total_usd: i64,
}

/// A sale to record.
#[derive(Debug, Clone)]
pub struct NewSale {
    pub user_id: String,
    pub buyer_name: Option<String>,
    pub lines: Vec<SaleLine>,
    pub tender: Tender,
    pub payment_mode: PaymentMode,
    pub exchange_rate: ExchangeRate,
}

#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Records a sale, its items and the stock it consumes in one
    /// transaction.
    ///
    /// ## Errors
    /// * `DbError::Core(InsufficientStock)` - a product runs out
    /// * `DbError::Core(InsufficientPayment)` - tender below total
    /// * `DbError::Core(ProductNotFound)` - unknown or inactive product
    pub async fn record(&self, new_sale: &NewSale) -> DbResult<(Sale, Vec<SaleItem>)> {
        debug!(
            user_id = %new_sale.user_id,
            lines = new_sale.lines.len(),
            mode = ?new_sale.payment_mode,
            "Recording sale"
        );

        // detached so a dropped request never leaves the connection
        // inside an open transaction
        let pool = self.pool.clone();
        let new_sale = new_sale.clone();
        let (sale, items) = tokio::spawn(async move { record_immediate(&pool, &new_sale).await })
            .await
            .map_err(|e| DbError::Internal(format!("sale task failed: {}", e)))??;

        info!(
            id = %sale.id,
            receipt_number = %sale.receipt_number,
            total_fc = sale.montant_total_fc,
            rendu_fc = sale.rendu_fc,
            "Sale recorded"
        );

        Ok((sale, items))
    }

    /// Inserts an already settled sale without items or stock movement
    /// (seed data).
    pub async fn insert(&self, sale: &Sale) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        insert_sale(&mut conn, sale).await
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");

        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    pub async fn items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY rowid");

        let items = sqlx::query_as::<_, SaleItem>(&sql)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Most recent sales first.
    pub async fn list_recent(&self, limit: i64, offset: i64) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {SALE_COLUMNS} FROM sales ORDER BY created_at DESC, rowid DESC LIMIT ?1 OFFSET ?2"
        );

        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    pub async fn mark_printed(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Marking sale printed");

        let result = sqlx::query("UPDATE sales SET is_printed = 1 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", id));
        }

        Ok(())
    }

    /// Flags sales as exported; returns how many changed.
    pub async fn mark_synced(&self, ids: &[String]) -> DbResult<u64> {
        let mut tx = self.pool.begin().await?;
        let mut changed = 0;

        for id in ids {
            changed += sqlx::query("UPDATE sales SET is_synced = 1 WHERE id = ?1 AND is_synced = 0")
                .bind(id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }

        tx.commit().await?;
        debug!(changed = changed, "Sales marked synced");
        Ok(changed)
    }

    /// Oldest unsynced sales first.
    pub async fn list_unsynced(&self, limit: i64) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE is_synced = 0 ORDER BY created_at, rowid LIMIT ?1"
        );

        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    pub async fn daily_summary(&self, date: NaiveDate) -> DbResult<DailySummary> {
        let (start, end) = day_bounds(date);

        let (sale_count, total_fc, total_usd): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(montant_total_fc), 0),
                   COALESCE(SUM(montant_total_usd), 0)
            FROM sales
            WHERE created_at >= ?1 AND created_at < ?2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(DailySummary {
            date,
            sale_count,
            total_fc,
            total_usd,
        })
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Runs [`write_sale`] under `BEGIN IMMEDIATE`: the write lock is taken
/// before the stock and receipt counter are read, so concurrent checkouts
/// queue on `busy_timeout` instead of reading the same values.
async fn record_immediate(pool: &SqlitePool, new_sale: &NewSale) -> DbResult<(Sale, Vec<SaleItem>)> {
    let mut conn = pool.acquire().await?;
    sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

    let result = match write_sale(&mut conn, new_sale).await {
        Ok(recorded) => sqlx::query("COMMIT")
            .execute(&mut *conn)
            .await
            .map(|_| recorded)
            .map_err(DbError::from),
        Err(e) => Err(e),
    };

    if result.is_err() {
        if let Err(e) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
            warn!(error = %e, "Rollback after failed sale did not run");
        }
    }

    result
}

/// Prices, settles and writes a sale on a connection that already holds
/// the write lock.
async fn write_sale(
    conn: &mut SqliteConnection,
    new_sale: &NewSale,
) -> DbResult<(Sale, Vec<SaleItem>)> {
    let mut products: Vec<Product> = Vec::new();
    for line in &new_sale.lines {
        if products.iter().all(|p| p.id != line.product_id) {
            match fetch_for_update(conn, &line.product_id).await {
                Ok(p) => products.push(p),
                Err(DbError::NotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }
    }

    let priced = price_lines(&new_sale.lines, &products)?;
    let settlement = settle(
        total_of(&priced),
        new_sale.tender,
        new_sale.payment_mode,
        new_sale.exchange_rate,
    )?;

    // lines for the same product draw from the same running stock
    let mut stock: HashMap<&str, StockLevels> = HashMap::new();
    for line in &priced {
        let product = products
            .iter()
            .find(|p| p.id == line.product_id)
            .ok_or_else(|| DbError::not_found("Product", &line.product_id))?;
        let current = stock
            .get(product.id.as_str())
            .copied()
            .unwrap_or_else(|| product.stock());
        let next = current.take(line.unit, line.quantity, product.packaging(), &product.code)?;
        stock.insert(product.id.as_str(), next);
    }

    let now = Utc::now();
    let receipt_number = next_receipt_number(conn, now).await?;
    let sale = settlement.into_sale(
        Uuid::new_v4().to_string(),
        receipt_number,
        new_sale.user_id.clone(),
        new_sale
            .buyer_name
            .as_ref()
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty()),
        now,
    );

    insert_sale(conn, &sale).await?;

    let mut items = Vec::with_capacity(priced.len());
    for line in priced {
        let item = SaleItem {
            id: Uuid::new_v4().to_string(),
            sale_id: sale.id.clone(),
            product_id: line.product_id,
            name_snapshot: line.name,
            unit: line.unit,
            quantity: line.quantity,
            unit_price_fc: line.unit_price.francs(),
            line_total_fc: line.line_total.francs(),
        };

        sqlx::query(
            r#"
            INSERT INTO sale_items (
                id, sale_id, product_id, name_snapshot, unit,
                quantity, unit_price_fc, line_total_fc
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&item.id)
        .bind(&item.sale_id)
        .bind(&item.product_id)
        .bind(&item.name_snapshot)
        .bind(item.unit)
        .bind(item.quantity)
        .bind(item.unit_price_fc)
        .bind(item.line_total_fc)
        .execute(&mut *conn)
        .await?;

        items.push(item);
    }

    for (product_id, levels) in &stock {
        write_stock(conn, product_id, *levels).await?;
    }

    Ok((sale, items))
}


async fn insert_sale(conn: &mut sqlx::SqliteConnection, sale: &Sale) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sales (
            id, receipt_number, user_id, buyer_name,
            montant_total_fc, montant_paye_fc, rendu_fc,
            montant_total_usd, montant_paye_usd, rendu_usd,
            payment_mode, exchange_rate, is_printed, is_synced, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.receipt_number)
    .bind(&sale.user_id)
    .bind(&sale.buyer_name)
    .bind(sale.montant_total_fc)
    .bind(sale.montant_paye_fc)
    .bind(sale.rendu_fc)
    .bind(sale.montant_total_usd)
    .bind(sale.montant_paye_usd)
    .bind(sale.rendu_usd)
    .bind(sale.payment_mode)
    .bind(sale.exchange_rate)
    .bind(sale.is_printed)
    .bind(sale.is_synced)
    .bind(sale.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// `YYYYMMDD-NNNN`, NNNN counting the day's receipts from 1.
async fn next_receipt_number(
    conn: &mut sqlx::SqliteConnection,
    now: DateTime<Utc>,
) -> DbResult<String> {
    let date = now.date_naive();
    let prefix = format!("{}-%", date.format("%Y%m%d"));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE receipt_number LIKE ?1")
        .bind(prefix)
        .fetch_one(&mut *conn)
        .await?;

    Ok(Sale::receipt_number_for(date, count + 1))
}

fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(chrono::NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
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
    use resto_core::factory::{fake_product, fake_user};
    use resto_core::{CoreError, Fc, Role, StockUnit, Usd};

    async fn setup() -> (Database, String, Product) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let mut user = fake_user(&mut rng, Role::Caissier);
        user.password_hash = "x".to_string();
        db.users().insert(&user).await.unwrap();

        let mut product = fake_product(&mut rng);
        product.bottles_per_crate = 12;
        product.glasses_per_bottle = 4;
        product.stock_crates = 1;
        product.stock_bottles = 2;
        product.stock_glasses = 0;
        product.price_crate_fc = 30_000;
        product.price_bottle_fc = 2_500;
        product.price_glass_fc = 1_000;
        db.products().insert(&product).await.unwrap();

        (db, user.id, product)
    }

    fn new_sale(user_id: &str, lines: Vec<SaleLine>, paid_fc: i64) -> NewSale {
        NewSale {
            user_id: user_id.to_string(),
            buyer_name: Some("  Table 4 ".to_string()),
            lines,
            tender: Tender {
                paid_fc: Fc::new(paid_fc),
                paid_usd: Usd::zero(),
            },
            payment_mode: PaymentMode::Fc,
            exchange_rate: ExchangeRate::DEFAULT,
        }
    }

    fn line(product_id: &str, unit: StockUnit, quantity: i64) -> SaleLine {
        SaleLine {
            product_id: product_id.to_string(),
            unit,
            quantity,
        }
    }

    #[tokio::test]
    async fn test_record_sale_updates_stock_and_amounts() {
        let (db, user_id, product) = setup().await;

        let (sale, items) = db
            .sales()
            .record(&new_sale(
                &user_id,
                vec![
                    line(&product.id, StockUnit::Bouteille, 3),
                    line(&product.id, StockUnit::Verre, 2),
                ],
                10_000,
            ))
            .await
            .unwrap();

        assert_eq!(sale.montant_total_fc, 9_500);
        assert_eq!(sale.rendu_fc, 500);
        assert_eq!(sale.montant_total_usd, 380);
        assert_eq!(sale.montant_paye_usd, 400);
        assert_eq!(sale.rendu_usd, 20);
        assert_eq!(sale.exchange_rate, 2500);
        assert_eq!(sale.buyer_name.as_deref(), Some("Table 4"));
        assert!(sale.receipt_number.ends_with("-0001"));
        assert_eq!(items.len(), 2);

        // 1 crate + 2 bottles, minus 3 bottles, minus 2 glasses
        let after = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(after.stock(), StockLevels { crates: 0, bottles: 10, glasses: 2 });

        let stored = db.sales().items(&sale.id).await.unwrap();
        assert_eq!(stored[0].name_snapshot, product.name);
        assert_eq!(stored[1].unit, StockUnit::Verre);
    }

    #[tokio::test]
    async fn test_oversell_rolls_back() {
        let (db, user_id, product) = setup().await;

        let err = db
            .sales()
            .record(&new_sale(
                &user_id,
                vec![
                    line(&product.id, StockUnit::Bouteille, 10),
                    line(&product.id, StockUnit::Bouteille, 10),
                ],
                100_000,
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::InsufficientStock { .. })));

        let after = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(after.stock(), product.stock());
        assert!(db.sales().list_recent(10, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_underpayment_is_rejected() {
        let (db, user_id, product) = setup().await;

        let err = db
            .sales()
            .record(&new_sale(&user_id, vec![line(&product.id, StockUnit::Casier, 1)], 20_000))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::InsufficientPayment { .. })));
    }

    #[tokio::test]
    async fn test_receipt_numbers_increment_and_flags() {
        let (db, user_id, product) = setup().await;
        let sale = |q| new_sale(&user_id, vec![line(&product.id, StockUnit::Verre, q)], 5_000);

        let (first, _) = db.sales().record(&sale(1)).await.unwrap();
        let (second, _) = db.sales().record(&sale(1)).await.unwrap();
        assert!(second.receipt_number.ends_with("-0002"));

        db.sales().mark_printed(&first.id).await.unwrap();
        assert!(db.sales().get_by_id(&first.id).await.unwrap().unwrap().is_printed);
        assert!(db.sales().mark_printed("missing").await.is_err());

        assert_eq!(db.sales().list_unsynced(10).await.unwrap().len(), 2);
        assert_eq!(db.sales().mark_synced(&[first.id.clone()]).await.unwrap(), 1);
        let unsynced = db.sales().list_unsynced(10).await.unwrap();
        assert_eq!(unsynced.len(), 1);
        assert_eq!(unsynced[0].id, second.id);
    }

    #[tokio::test]
    async fn test_daily_summary() {
        let (db, user_id, product) = setup().await;
        db.sales()
            .record(&new_sale(&user_id, vec![line(&product.id, StockUnit::Verre, 2)], 2_000))
            .await
            .unwrap();
        db.sales()
            .record(&new_sale(&user_id, vec![line(&product.id, StockUnit::Bouteille, 1)], 2_500))
            .await
            .unwrap();

        let today = db.sales().daily_summary(Utc::now().date_naive()).await.unwrap();
        assert_eq!(today.sale_count, 2);
        assert_eq!(today.total_fc, 4_500);
        assert_eq!(today.total_usd, 180);

        let yesterday = Utc::now().date_naive() - Duration::days(1);
        assert_eq!(db.sales().daily_summary(yesterday).await.unwrap().sale_count, 0);
    }

    #[tokio::test]
    async fn test_concurrent_checkouts_get_distinct_receipts() {
        let path = std::env::temp_dir().join(format!("resto-sales-{}.db", Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path).max_connections(4)).await.unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        let mut user = fake_user(&mut rng, Role::Caissier);
        user.password_hash = "x".to_string();
        db.users().insert(&user).await.unwrap();

        let mut product = fake_product(&mut rng);
        product.bottles_per_crate = 12;
        product.stock_crates = 0;
        product.stock_bottles = 20;
        product.stock_glasses = 0;
        product.price_bottle_fc = 2_500;
        db.products().insert(&product).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let db = db.clone();
            let sale = new_sale(&user.id, vec![line(&product.id, StockUnit::Bouteille, 1)], 2_500);
            handles.push(tokio::spawn(async move { db.sales().record(&sale).await }));
        }

        let mut receipts = Vec::new();
        for handle in handles {
            let (sale, _) = handle.await.unwrap().unwrap();
            receipts.push(sale.receipt_number);
        }
        receipts.sort();
        receipts.dedup();
        assert_eq!(receipts.len(), 8);

        let stored = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock_bottles, 12);

        db.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }
}
