//! # Stock Movement Repository
//!
//! The append-only stock ledger.
//!
//! Rows are written once, inside the same transaction as the quantity
//! change they describe, and never updated or deleted (the schema enforces
//! this with triggers).

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use stockroom_core::{MovementFilter, MovementType, StockMovement};

const MOVEMENT_COLUMNS: &str = "id, product_id, movement_type, quantity, cost_price_cents, \
     selling_price_cents, notes, created_at";

/// A ledger entry about to be written.
#[derive(Debug, Clone)]
pub struct NewMovement<'a> {
    pub product_id: &'a str,
    pub movement_type: MovementType,
    pub quantity: i64,
    pub cost_price_cents: Option<i64>,
    pub selling_price_cents: Option<i64>,
    pub notes: &'a str,
}

/// Repository for the stock ledger.
#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
}

impl MovementRepository {
    /// Creates a new MovementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MovementRepository { pool }
    }

    /// Appends a movement on the caller's transaction.
    ///
    /// ## Returns
    /// The stored movement, including its generated id and timestamp.
    pub async fn append_in(
        conn: &mut SqliteConnection,
        movement: &NewMovement<'_>,
    ) -> DbResult<StockMovement> {
        let stored = StockMovement {
            id: Uuid::new_v4().to_string(),
            product_id: movement.product_id.to_string(),
            movement_type: movement.movement_type,
            quantity: movement.quantity,
            cost_price_cents: movement.cost_price_cents,
            selling_price_cents: movement.selling_price_cents,
            notes: movement.notes.to_string(),
            created_at: Utc::now(),
        };

        debug!(
            id = %stored.id,
            product_id = %stored.product_id,
            movement_type = stored.movement_type.as_str(),
            quantity = stored.quantity,
            "Appending stock movement"
        );

        sqlx::query(
            r#"
            INSERT INTO stock_movements (
                id, product_id, movement_type, quantity,
                cost_price_cents, selling_price_cents, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&stored.id)
        .bind(&stored.product_id)
        .bind(stored.movement_type)
        .bind(stored.quantity)
        .bind(stored.cost_price_cents)
        .bind(stored.selling_price_cents)
        .bind(&stored.notes)
        .bind(stored.created_at)
        .execute(conn)
        .await?;

        Ok(stored)
    }

    /// Movements matching `filter`, newest first. Date bounds are inclusive.
    pub async fn query(&self, filter: &MovementFilter) -> DbResult<Vec<StockMovement>> {
        debug!(?filter, "Querying stock movements");

        let movements = sqlx::query_as::<_, StockMovement>(&format!(
            r#"
            SELECT {}
            FROM stock_movements
            WHERE (?1 IS NULL OR product_id = ?1)
              AND (?2 IS NULL OR movement_type = ?2)
              AND (?3 IS NULL OR created_at >= ?3)
              AND (?4 IS NULL OR created_at <= ?4)
            ORDER BY created_at DESC, rowid DESC
            "#,
            MOVEMENT_COLUMNS
        ))
        .bind(filter.product_id.as_deref())
        .bind(filter.movement_type)
        .bind(filter.from)
        .bind(filter.to)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Movements carrying exactly `notes` (e.g. every OUT of one sale).
    pub async fn with_notes(&self, notes: &str) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(&format!(
            "SELECT {} FROM stock_movements WHERE notes = ?1 ORDER BY rowid",
            MOVEMENT_COLUMNS
        ))
        .bind(notes)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Signed sum of a product's ledger (IN and RETURN add, OUT subtracts).
    pub async fn net_quantity(&self, product_id: &str) -> DbResult<i64> {
        let net: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(CASE movement_type WHEN 'OUT' THEN -quantity ELSE quantity END), 0)
            FROM stock_movements
            WHERE product_id = ?1
            "#,
        )
        .bind(product_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(net)
    }

    /// Number of ledger entries for a product.
    pub async fn count_for_product(&self, product_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM stock_movements WHERE product_id = ?1")
                .bind(product_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
