//! # Invoice Repository
//!
//! Database operations for saved invoices.
//!
//! ## Storage
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  invoices row                                                           │
//! │  ├── id (caller-chosen, unique)                                         │
//! │  ├── customer_name / phone / address                                    │
//! │  ├── date, subtotal / tax / total cents                                 │
//! │  └── items  TEXT  ← serde_json array of InvoiceItem                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Invoices are independent of the ledger: nothing here touches products.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use stockroom_core::{Invoice, InvoiceItem};

const INVOICE_COLUMNS: &str = "id, customer_name, customer_phone, customer_address, date, \
     items, subtotal_cents, tax_cents, total_cents, created_at";

#[derive(sqlx::FromRow)]
struct InvoiceRow {
    id: String,
    customer_name: String,
    customer_phone: String,
    customer_address: String,
    date: DateTime<Utc>,
    items: String,
    subtotal_cents: i64,
    tax_cents: i64,
    total_cents: i64,
    created_at: DateTime<Utc>,
}

impl InvoiceRow {
    fn into_invoice(self) -> DbResult<Invoice> {
        let items: Vec<InvoiceItem> = serde_json::from_str(&self.items).map_err(|e| {
            DbError::Internal(format!("invoice {} has unreadable items: {}", self.id, e))
        })?;

        Ok(Invoice {
            id: self.id,
            customer_name: self.customer_name,
            customer_phone: self.customer_phone,
            customer_address: self.customer_address,
            date: self.date,
            items,
            subtotal_cents: self.subtotal_cents,
            tax_cents: self.tax_cents,
            total_cents: self.total_cents,
            created_at: self.created_at,
        })
    }
}

/// Repository for invoice database operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Stores an invoice.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - invoice id already used
    pub async fn insert(&self, invoice: &Invoice) -> DbResult<()> {
        debug!(id = %invoice.id, items = invoice.items.len(), "Inserting invoice");

        let items = serde_json::to_string(&invoice.items)
            .map_err(|e| DbError::Internal(format!("cannot encode invoice items: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, customer_name, customer_phone, customer_address, date,
                items, subtotal_cents, tax_cents, total_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&invoice.id)
        .bind(&invoice.customer_name)
        .bind(&invoice.customer_phone)
        .bind(&invoice.customer_address)
        .bind(invoice.date)
        .bind(items)
        .bind(invoice.subtotal_cents)
        .bind(invoice.tax_cents)
        .bind(invoice.total_cents)
        .bind(invoice.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("invoice id", &invoice.id),
            other => other,
        })?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Invoice>> {
        let row = sqlx::query_as::<_, InvoiceRow>(&format!(
            "SELECT {} FROM invoices WHERE id = ?1",
            INVOICE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(InvoiceRow::into_invoice).transpose()
    }

    /// All invoices, latest invoice date first.
    pub async fn list(&self) -> DbResult<Vec<Invoice>> {
        let rows = sqlx::query_as::<_, InvoiceRow>(&format!(
            "SELECT {} FROM invoices ORDER BY date DESC, created_at DESC",
            INVOICE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(InvoiceRow::into_invoice).collect()
    }

    /// Deletes an invoice.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - no invoice with that id
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting invoice");

        let result = sqlx::query("DELETE FROM invoices WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Invoice", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Duration;

    fn invoice(id: &str, date: DateTime<Utc>) -> Invoice {
        Invoice {
            id: id.to_string(),
            customer_name: "Ada".to_string(),
            customer_phone: String::new(),
            customer_address: "12 Mill Road".to_string(),
            date,
            items: vec![InvoiceItem {
                product_id: Some("p-1".to_string()),
                name: "Cola".to_string(),
                barcode: Some("1000001".to_string()),
                quantity: 2,
                unit_price_cents: 250,
            }],
            subtotal_cents: 500,
            tax_cents: 50,
            total_cents: 550,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_get_and_list_by_date() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.invoices();
        let now = Utc::now();

        repo.insert(&invoice("INV-1", now - Duration::days(2))).await.unwrap();
        repo.insert(&invoice("INV-2", now)).await.unwrap();

        let stored = repo.get_by_id("INV-1").await.unwrap().unwrap();
        assert_eq!(stored.items, invoice("INV-1", now).items);
        assert_eq!(stored.customer_address, "12 Mill Road");

        let ids: Vec<String> = repo.list().await.unwrap().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["INV-2", "INV-1"]);
        assert!(repo.get_by_id("INV-3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_id_and_delete() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.invoices();

        repo.insert(&invoice("INV-1", Utc::now())).await.unwrap();
        let err = repo.insert(&invoice("INV-1", Utc::now())).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "invoice id"));

        repo.delete("INV-1").await.unwrap();
        assert!(matches!(
            repo.delete("INV-1").await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_unreadable_items_surface_as_error() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.invoices();
        repo.insert(&invoice("INV-1", Utc::now())).await.unwrap();

        sqlx::query("UPDATE invoices SET items = 'not json' WHERE id = 'INV-1'")
            .execute(db.pool())
            .await
            .unwrap();

        assert!(matches!(repo.get_by_id("INV-1").await, Err(DbError::Internal(_))));
    }
}
