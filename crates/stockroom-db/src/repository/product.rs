//! # Product Repository
//!
//! Database operations for the product catalog.
//!
//! ## Key Operations
//! - Lookup by id / barcode, filtered listing
//! - Catalog CRUD that never touches `stock_quantity`
//! - [`adjust_quantity_in`](ProductRepository::adjust_quantity_in), the one
//!   statement that changes on-hand stock
//!
//! ## Conditional Adjust
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How Stock Changes                                    │
//! │                                                                         │
//! │  ❌ WRONG: read, check in Rust, write back                             │
//! │     SELECT stock_quantity ...        (sees 5)                          │
//! │     UPDATE ... SET stock_quantity = 1 (another request sold 3 between) │
//! │                                                                         │
//! │  ✅ CORRECT: check and write in one statement                          │
//! │     UPDATE products                                                    │
//! │        SET stock_quantity = stock_quantity + :delta                    │
//! │      WHERE id = :id AND stock_quantity + :delta >= 0                   │
//! │     RETURNING ...                                                      │
//! │                                                                         │
//! │  0 rows → product missing, or the delta would go negative              │
//! │  1 row  → adjusted; the returned row is the post-image                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use stockroom_core::{Product, ProductFilter, ProductUpdate};

pub(crate) const PRODUCT_COLUMNS: &str = "id, name, barcode, category_id, cost_price_cents, \
     selling_price_cents, stock_quantity, stock_status_override, description, image, \
     created_at, updated_at";

/// Outcome of a conditional quantity adjustment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantityAdjustment {
    /// Applied; carries the updated product.
    Adjusted(Product),
    /// No product with that id.
    NotFound,
    /// Refused; nothing written.
    WouldGoNegative { available: i64 },
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let product = repo.get_by_barcode("5449000000996").await?;
/// let drinks = repo.list(&ProductFilter { category_id: Some(id), ..Default::default() }).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        Self::get_by_id_in(&mut conn, id).await
    }

    /// Same as [`get_by_id`](Self::get_by_id) on an open connection or transaction.
    pub async fn get_by_id_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE id = ?1",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(product)
    }

    /// Gets a product by its barcode.
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE barcode = ?1",
            PRODUCT_COLUMNS
        ))
        .bind(barcode.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists products matching `filter`, newest first.
    ///
    /// `search` is a case-insensitive substring match over name and barcode.
    pub async fn list(&self, filter: &ProductFilter) -> DbResult<Vec<Product>> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s.to_lowercase()));

        debug!(?filter, "Listing products");

        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {}
            FROM products
            WHERE (?1 IS NULL OR category_id = ?1)
              AND (?2 IS NULL OR barcode = ?2)
              AND (?3 IS NULL OR lower(name) LIKE ?3 OR lower(barcode) LIKE ?3)
            ORDER BY created_at DESC, rowid DESC
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(filter.category_id.as_deref())
        .bind(filter.barcode.as_deref().map(str::trim))
        .bind(search)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Whether any product already carries `barcode`.
    pub async fn barcode_exists(&self, barcode: &str) -> DbResult<bool> {
        let exists: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE barcode = ?1)")
                .bind(barcode)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists != 0)
    }

    /// Inserts a new product row inside the caller's transaction.
    ///
    /// The row is written with the quantity it carries; creation goes through
    /// the catalog service, which inserts at zero and records initial stock
    /// as a movement.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Barcode already exists
    pub async fn insert_in(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, barcode = %product.barcode, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, barcode, category_id,
                cost_price_cents, selling_price_cents, stock_quantity,
                stock_status_override, description, image,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.barcode)
        .bind(&product.category_id)
        .bind(product.cost_price_cents)
        .bind(product.selling_price_cents)
        .bind(product.stock_quantity)
        .bind(product.stock_status_override)
        .bind(&product.description)
        .bind(&product.image)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(conn)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("barcode", &product.barcode),
            other => other,
        })?;

        Ok(())
    }

    /// Updates catalog fields. `stock_quantity` is left as stored.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Post-update row
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    /// * `Err(DbError::UniqueViolation)` - Barcode taken by another product
    pub async fn update(&self, id: &str, update: &ProductUpdate) -> DbResult<Product> {
        debug!(id = %id, "Updating product");

        let barcode = update.barcode.trim();

        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products SET
                name = ?2,
                barcode = ?3,
                category_id = ?4,
                cost_price_cents = ?5,
                selling_price_cents = ?6,
                stock_status_override = ?7,
                description = ?8,
                image = COALESCE(?9, image),
                updated_at = ?10
            WHERE id = ?1
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .bind(update.name.trim())
        .bind(barcode)
        .bind(&update.category_id)
        .bind(update.cost_price_cents)
        .bind(update.selling_price_cents)
        .bind(update.stock_status_override)
        .bind(&update.description)
        .bind(&update.image)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("barcode", barcode),
            other => other,
        })?;

        product.ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Deletes a product row.
    ///
    /// The foreign keys from the ledger and sale items refuse deletion of a
    /// product with history.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Adds `delta` to the product's quantity unless that would go below zero.
    ///
    /// Runs on the caller's transaction. Issued as the first statement of a
    /// write transaction it takes SQLite's write lock, so concurrent
    /// adjustments of the same product serialize on it.
    pub async fn adjust_quantity_in(
        conn: &mut SqliteConnection,
        id: &str,
        delta: i64,
    ) -> DbResult<QuantityAdjustment> {
        debug!(id = %id, delta = %delta, "Adjusting stock");

        let updated = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET stock_quantity = stock_quantity + ?2,
                updated_at = ?3
            WHERE id = ?1 AND stock_quantity + ?2 >= 0
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .bind(delta)
        .bind(Utc::now())
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(product) = updated {
            return Ok(QuantityAdjustment::Adjusted(product));
        }

        let available: Option<i64> =
            sqlx::query_scalar("SELECT stock_quantity FROM products WHERE id = ?1")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;

        Ok(match available {
            Some(available) => QuantityAdjustment::WouldGoNegative { available },
            None => QuantityAdjustment::NotFound,
        })
    }

    /// Counts all products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
