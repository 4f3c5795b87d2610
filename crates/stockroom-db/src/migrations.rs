//! # Database Migrations
//!
//! Embedded SQL migrations for Stockroom.
//!
//! ## How Migrations Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Migration Process                                  │
//! │                                                                         │
//! │  Database::new(config)                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Check _sqlx_migrations table (create if missing)                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Compare embedded migrations vs applied                                │
//! │       │                                                                 │
//! │       └── 001_initial_schema.sql   categories, products,               │
//! │                                    stock_movements (append-only),      │
//! │                                    sales, sale_items                   │
//! │       └── 002_invoices.sql         invoices (items as JSON)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Run pending migrations in order, record in _sqlx_migrations           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Adding New Migrations
//!
//! 1. Create a new file in `migrations/sqlite/` with the next sequence number
//! 2. Name format: `NNN_description.sql`
//! 3. **NEVER** modify existing migrations, always add new ones

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Embedded migrations from the workspace `migrations/sqlite` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending database migrations.
///
/// Idempotent; each migration runs in its own transaction.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Returns `(total_migrations, applied_migrations)`.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    // Missing table means nothing applied yet
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((total, applied as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_all_migrations_applied() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (total, applied) = migration_status(db.pool()).await.unwrap();

        assert!(total >= 2);
        assert_eq!(total, applied);

        let invoices: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'invoices'",
        )
        .fetch_one(db.pool())
        .await
        .unwrap();
        assert_eq!(invoices, 1);
    }

    #[tokio::test]
    async fn test_ledger_is_append_only() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = chrono::Utc::now();

        sqlx::query("INSERT INTO categories (id, name, created_at) VALUES ('c', 'Drinks', ?1)")
            .bind(now)
            .execute(db.pool())
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO products (id, name, barcode, category_id, cost_price_cents, \
             selling_price_cents, stock_quantity, created_at, updated_at) \
             VALUES ('p', 'Cola', '1000001', 'c', 500, 800, 0, ?1, ?1)",
        )
        .bind(now)
        .execute(db.pool())
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO stock_movements (id, product_id, movement_type, quantity, created_at) \
             VALUES ('m', 'p', 'IN', 5, ?1)",
        )
        .bind(now)
        .execute(db.pool())
        .await
        .unwrap();

        let update = sqlx::query("UPDATE stock_movements SET quantity = 50 WHERE id = 'm'")
            .execute(db.pool())
            .await;
        assert!(update.is_err());

        let delete = sqlx::query("DELETE FROM stock_movements WHERE id = 'm'")
            .execute(db.pool())
            .await;
        assert!(delete.is_err());
    }

    #[tokio::test]
    async fn test_negative_stock_rejected_by_schema() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = chrono::Utc::now();

        sqlx::query("INSERT INTO categories (id, name, created_at) VALUES ('c', 'Drinks', ?1)")
            .bind(now)
            .execute(db.pool())
            .await
            .unwrap();
        let result = sqlx::query(
            "INSERT INTO products (id, name, barcode, category_id, cost_price_cents, \
             selling_price_cents, stock_quantity, created_at, updated_at) \
             VALUES ('p', 'Cola', '1000001', 'c', 500, 800, -1, ?1, ?1)",
        )
        .bind(now)
        .execute(db.pool())
        .await;

        assert!(matches!(
            result.map_err(crate::error::DbError::from),
            Err(crate::error::DbError::CheckViolation { .. })
        ));
    }
}
