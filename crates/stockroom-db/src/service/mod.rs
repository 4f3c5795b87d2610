//! # Services
//!
//! Operations that span several repositories and own their transactions.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Service          Mutates stock?   Entry points                         │
//! │  ──────────────   ──────────────   ──────────────────────────────────── │
//! │  StockService     yes              record_movement                      │
//! │  SaleService      yes              complete_sale                        │
//! │  CatalogService   initial only     create/update/delete product, cats  │
//! │  ReportService    no               sales/stock reports, dashboard,     │
//! │                                    ledger audit                        │
//! │  InvoiceService   no               create/get/list/delete invoice      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every stock change goes through
//! [`ProductRepository::adjust_quantity_in`](crate::repository::product::ProductRepository::adjust_quantity_in)
//! and appends its ledger entry in the same transaction.

pub mod catalog;
pub mod invoice;
pub mod report;
pub mod sale;
pub mod stock;

use crate::error::StockError;
use crate::repository::product::{ProductRepository, QuantityAdjustment};
use sqlx::SqliteConnection;
use stockroom_core::Product;

/// Applies `delta` to a product on the caller's transaction, mapping a
/// refused adjustment to its typed error.
///
/// `requested` is what the error reports as asked-for units.
pub(crate) async fn adjust_or_reject(
    conn: &mut SqliteConnection,
    product_id: &str,
    delta: i64,
    requested: i64,
) -> Result<Product, StockError> {
    match ProductRepository::adjust_quantity_in(&mut *conn, product_id, delta).await? {
        QuantityAdjustment::Adjusted(product) => Ok(product),
        QuantityAdjustment::NotFound => Err(StockError::ProductNotFound(product_id.to_string())),
        QuantityAdjustment::WouldGoNegative { available } => {
            let name = ProductRepository::get_by_id_in(&mut *conn, product_id)
                .await?
                .map(|p| p.name)
                .unwrap_or_default();
            Err(StockError::InsufficientStock {
                product_id: product_id.to_string(),
                name,
                available,
                requested,
            })
        }
    }
}
