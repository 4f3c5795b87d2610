//! # Invoice Service
//!
//! Saved invoices built on the invoice screen. An invoice is a document
//! only: creating or deleting one never changes stock, and its lines are
//! copies rather than references into the catalog.

use chrono::Utc;
use tracing::info;

use crate::error::{StockError, StockResult};
use crate::pool::Database;
use stockroom_core::validation::validate_invoice;
use stockroom_core::{Invoice, NewInvoice};

/// Invoice CRUD.
#[derive(Debug, Clone)]
pub struct InvoiceService {
    db: Database,
}

impl InvoiceService {
    pub fn new(db: Database) -> Self {
        InvoiceService { db }
    }

    /// Validates and stores an invoice.
    ///
    /// ## Errors
    /// * `InvalidInput` - missing id, customer name or items, or bad amounts
    /// * `DuplicateIdentifier` - the invoice id is already used
    pub async fn create_invoice(&self, input: &NewInvoice) -> StockResult<Invoice> {
        validate_invoice(input)?;

        let customer = &input.customer;
        let invoice = Invoice {
            id: input.id.trim().to_string(),
            customer_name: trimmed(customer.name.as_deref()),
            customer_phone: trimmed(customer.phone.as_deref()),
            customer_address: trimmed(customer.address.as_deref()),
            date: input.date,
            items: input
                .items
                .iter()
                .cloned()
                .map(|mut item| {
                    item.name = item.name.trim().to_string();
                    item
                })
                .collect(),
            subtotal_cents: input.subtotal_cents,
            tax_cents: input.tax_cents,
            total_cents: input.total_cents,
            created_at: Utc::now(),
        };

        self.db.invoices().insert(&invoice).await?;
        info!(
            id = %invoice.id,
            lines = invoice.items.len(),
            total = %invoice.total(),
            "Invoice created"
        );
        Ok(invoice)
    }

    pub async fn get_invoice(&self, id: &str) -> StockResult<Invoice> {
        self.db
            .invoices()
            .get_by_id(id)
            .await?
            .ok_or_else(|| StockError::not_found("Invoice", id))
    }

    /// All invoices, latest invoice date first.
    pub async fn list_invoices(&self) -> StockResult<Vec<Invoice>> {
        Ok(self.db.invoices().list().await?)
    }

    pub async fn delete_invoice(&self, id: &str) -> StockResult<()> {
        self.db.invoices().delete(id).await?;
        info!(id = %id, "Invoice deleted");
        Ok(())
    }
}

fn trimmed(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DbConfig;
    use chrono::Duration;
    use stockroom_core::{CategoryInput, CustomerInfo, InvoiceItem, NewProduct};

    fn new_invoice(id: &str) -> NewInvoice {
        NewInvoice {
            id: id.to_string(),
            customer: CustomerInfo {
                name: Some(" Ada ".to_string()),
                phone: Some("0300 1234567".to_string()),
                address: None,
            },
            date: Utc::now(),
            items: vec![
                InvoiceItem {
                    product_id: None,
                    name: " Cola ".to_string(),
                    barcode: Some("1000001".to_string()),
                    quantity: 2,
                    unit_price_cents: 250,
                },
                InvoiceItem {
                    product_id: None,
                    name: "Delivery".to_string(),
                    barcode: None,
                    quantity: 1,
                    unit_price_cents: 300,
                },
            ],
            subtotal_cents: 800,
            tax_cents: 80,
            total_cents: 880,
        }
    }

    #[tokio::test]
    async fn test_create_get_list_delete() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let invoices = db.invoicing();

        let created = invoices.create_invoice(&new_invoice("INV-1")).await.unwrap();
        assert_eq!(created.customer_name, "Ada");
        assert_eq!(created.customer_address, "");
        assert_eq!(created.items[0].name, "Cola");

        let mut older = new_invoice("INV-0");
        older.date = Utc::now() - Duration::days(3);
        invoices.create_invoice(&older).await.unwrap();

        let fetched = invoices.get_invoice("INV-1").await.unwrap();
        assert_eq!(fetched.items, created.items);
        assert_eq!(fetched.total_cents, 880);

        let ids: Vec<String> = invoices
            .list_invoices()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec!["INV-1", "INV-0"]);

        invoices.delete_invoice("INV-1").await.unwrap();
        assert!(matches!(
            invoices.get_invoice("INV-1").await,
            Err(StockError::NotFound { .. })
        ));
        assert!(matches!(
            invoices.delete_invoice("INV-1").await,
            Err(StockError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_duplicate_id_is_refused() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let invoices = db.invoicing();

        invoices.create_invoice(&new_invoice("INV-7")).await.unwrap();
        let err = invoices.create_invoice(&new_invoice(" INV-7 ")).await.unwrap_err();

        assert!(matches!(
            err,
            StockError::DuplicateIdentifier { ref field, ref value } if field == "invoice id" && value == "INV-7"
        ));
        assert_eq!(invoices.list_invoices().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_fields_are_refused() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let invoices = db.invoicing();

        let mut no_customer = new_invoice("INV-1");
        no_customer.customer.name = None;
        assert!(matches!(
            invoices.create_invoice(&no_customer).await,
            Err(StockError::InvalidInput(_))
        ));

        let mut no_items = new_invoice("INV-2");
        no_items.items.clear();
        assert!(matches!(
            invoices.create_invoice(&no_items).await,
            Err(StockError::InvalidInput(_))
        ));

        assert!(invoices.list_invoices().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invoices_leave_stock_alone() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let category = db
            .catalog()
            .create_category(&CategoryInput {
                name: "Drinks".to_string(),
                description: None,
            })
            .await
            .unwrap();
        let product = db
            .catalog()
            .create_product(&NewProduct {
                name: "Cola".to_string(),
                category_id: category.id,
                cost_price_cents: 150,
                selling_price_cents: 250,
                initial_quantity: 5,
                ..Default::default()
            })
            .await
            .unwrap();

        let mut input = new_invoice("INV-9");
        input.items[0].product_id = Some(product.id.clone());
        input.items[0].quantity = 50;
        db.invoicing().create_invoice(&input).await.unwrap();
        db.invoicing().delete_invoice("INV-9").await.unwrap();

        let stored = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock_quantity, 5);
        assert_eq!(db.movements().count_for_product(&product.id).await.unwrap(), 1);
    }
}
