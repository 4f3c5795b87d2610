//! # Sale Repository
//!
//! Database operations for sales and sale items.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  Requested ──validate──► Validated ──commit──► Committed (immutable)   │
//! │      │                       │                                          │
//! │      └───────────────────────┴──────────────► Rejected (nothing stored)│
//! │                                                                         │
//! │  Commit transaction (SaleService):                                     │
//! │     per line: conditional decrement + OUT movement "Sale <id>"         │
//! │     insert_in() → sales row + sale_items rows                          │
//! │                                                                         │
//! │  There is no update or delete: a committed sale never changes.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use stockroom_core::report::DateRange;
use stockroom_core::{Sale, SaleItem};

const SALE_COLUMNS: &str = "sale_id, customer_name, customer_phone, customer_address, \
     subtotal_cents, tax_cents, total_cents, total_profit_cents, created_at";

const ITEM_COLUMNS: &str = "sale_id, product_id, name_snapshot, barcode_snapshot, quantity, \
     cost_price_cents, selling_price_cents, profit_cents";

#[derive(sqlx::FromRow)]
struct SaleItemRow {
    sale_id: String,
    #[sqlx(flatten)]
    item: SaleItem,
}

/// Count, revenue and profit over a set of sales.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct SaleTotals {
    pub count: i64,
    pub revenue_cents: i64,
    pub profit_cents: i64,
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Whether a sale id is already taken.
    pub async fn exists(&self, sale_id: &str) -> DbResult<bool> {
        let exists: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM sales WHERE sale_id = ?1)")
            .bind(sale_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists != 0)
    }

    /// Inserts the sale header and its items on the caller's transaction.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - sale id already used
    pub async fn insert_in(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        debug!(sale_id = %sale.sale_id, items = sale.items.len(), "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                sale_id, customer_name, customer_phone, customer_address,
                subtotal_cents, tax_cents, total_cents, total_profit_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&sale.sale_id)
        .bind(&sale.customer_name)
        .bind(&sale.customer_phone)
        .bind(&sale.customer_address)
        .bind(sale.subtotal_cents)
        .bind(sale.tax_cents)
        .bind(sale.total_cents)
        .bind(sale.total_profit_cents)
        .bind(sale.created_at)
        .execute(&mut *conn)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("sale_id", &sale.sale_id),
            other => other,
        })?;

        for (line_no, item) in sale.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, line_no, product_id, name_snapshot, barcode_snapshot,
                    quantity, cost_price_cents, selling_price_cents, profit_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&sale.sale_id)
            .bind(line_no as i64)
            .bind(&item.product_id)
            .bind(&item.name_snapshot)
            .bind(&item.barcode_snapshot)
            .bind(item.quantity)
            .bind(item.cost_price_cents)
            .bind(item.selling_price_cents)
            .bind(item.profit_cents)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    /// Gets a sale with its items, in line order.
    pub async fn get_by_id(&self, sale_id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {} FROM sales WHERE sale_id = ?1",
            SALE_COLUMNS
        ))
        .bind(sale_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(mut sale) = sale else {
            return Ok(None);
        };

        sale.items = self.get_items(sale_id).await?;
        Ok(Some(sale))
    }

    /// Gets the items of one sale, in line order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let rows = sqlx::query_as::<_, SaleItemRow>(&format!(
            "SELECT {} FROM sale_items WHERE sale_id = ?1 ORDER BY line_no",
            ITEM_COLUMNS
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.item).collect())
    }

    /// Sales inside `range` (all sales when `None`), newest first, with items.
    pub async fn list(&self, range: Option<&DateRange>) -> DbResult<Vec<Sale>> {
        let from = range.map(|r| r.from);
        let to = range.map(|r| r.to);

        debug!(?from, ?to, "Listing sales");

        let mut sales = sqlx::query_as::<_, Sale>(&format!(
            r#"
            SELECT {}
            FROM sales
            WHERE (?1 IS NULL OR created_at >= ?1)
              AND (?2 IS NULL OR created_at <= ?2)
            ORDER BY created_at DESC, rowid DESC
            "#,
            SALE_COLUMNS
        ))
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        if sales.is_empty() {
            return Ok(sales);
        }

        // One pass over the items of every listed sale
        let rows = sqlx::query_as::<_, SaleItemRow>(&format!(
            r#"
            SELECT {}
            FROM sale_items
            WHERE sale_id IN (
                SELECT sale_id FROM sales
                WHERE (?1 IS NULL OR created_at >= ?1)
                  AND (?2 IS NULL OR created_at <= ?2)
            )
            ORDER BY sale_id, line_no
            "#,
            ITEM_COLUMNS
        ))
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        let mut items: HashMap<String, Vec<SaleItem>> = HashMap::new();
        for row in rows {
            items.entry(row.sale_id).or_default().push(row.item);
        }

        for sale in &mut sales {
            sale.items = items.remove(&sale.sale_id).unwrap_or_default();
        }

        Ok(sales)
    }

    /// Count, revenue and profit of sales created at or after `since`
    /// (all sales when `None`).
    pub async fn totals(&self, since: Option<chrono::DateTime<chrono::Utc>>) -> DbResult<SaleTotals> {
        let totals = sqlx::query_as::<_, SaleTotals>(
            r#"
            SELECT
                COUNT(*) AS count,
                COALESCE(SUM(total_cents), 0) AS revenue_cents,
                COALESCE(SUM(total_profit_cents), 0) AS profit_cents
            FROM sales
            WHERE (?1 IS NULL OR created_at >= ?1)
            "#,
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(totals)
    }

    /// Number of sale lines that reference a product.
    pub async fn count_items_for_product(&self, product_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sale_items WHERE product_id = ?1")
            .bind(product_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
