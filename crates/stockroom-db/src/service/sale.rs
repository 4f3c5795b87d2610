//! # Sale Transaction Service
//!
//! Completes a multi-line sale as one unit: every line's stock decrement and
//! OUT movement, plus the immutable sale record, commit together or not at all.
//!
//! ## Two Passes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  complete_sale(S-1, [P × 4 @ 8.00])                                    │
//! │                                                                         │
//! │  1. VALIDATE (no writes)                                               │
//! │     ├── sale id present, lines non-empty, quantities > 0               │
//! │     ├── sale id not used yet                           → Duplicate     │
//! │     └── per product (repeated lines summed):                           │
//! │           exists?                                      → NotFound      │
//! │           stock ≥ requested?                           → Insufficient  │
//! │                                                                         │
//! │  2. COMMIT (one transaction)                                           │
//! │     ├── per line:                                                      │
//! │     │     UPDATE ... stock_quantity - 4 WHERE ... >= 0 (re-checks)     │
//! │     │     cost snapshot from the RETURNING row                         │
//! │     │     INSERT OUT movement, note "Sale S-1"                         │
//! │     ├── INSERT sales + sale_items                                      │
//! │     └── COMMIT                                                         │
//! │                                                                         │
//! │  A request racing between pass 1 and pass 2 is caught by the          │
//! │  conditional UPDATE; the transaction is dropped and nothing persists.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use tracing::{info, warn};

use crate::error::{StockError, StockResult};
use crate::pool::Database;
use crate::repository::movement::{MovementRepository, NewMovement};
use crate::repository::sale::SaleRepository;
use crate::service::adjust_or_reject;
use stockroom_core::report::DateRange;
use stockroom_core::stock::{check_sale_request, line_profit, requested_quantities, total_profit};
use stockroom_core::{sale_movement_note, Money, MovementType, Sale, SaleItem, SaleRequest};

/// Completes and reads sales.
#[derive(Debug, Clone)]
pub struct SaleService {
    db: Database,
}

impl SaleService {
    pub fn new(db: Database) -> Self {
        SaleService { db }
    }

    /// Validates and commits a sale.
    ///
    /// ## Errors
    /// * `InvalidInput` - empty sale id or lines, non-positive quantity
    /// * `DuplicateIdentifier` - sale id already used
    /// * `ProductNotFound` - a line references an unknown product
    /// * `InsufficientStock` - a product cannot cover its requested total
    /// * `StorageFailure` - nothing was committed
    pub async fn complete_sale(&self, request: &SaleRequest) -> StockResult<Sale> {
        if let Err(e) = self.validate(request).await {
            warn!(sale_id = %request.sale_id, error = %e, "Sale rejected");
            return Err(e);
        }

        match self.commit(request).await {
            Ok(sale) => {
                info!(
                    sale_id = %sale.sale_id,
                    lines = sale.items.len(),
                    total = %sale.total(),
                    profit = %sale.total_profit(),
                    "Sale completed"
                );
                Ok(sale)
            }
            Err(e) => {
                warn!(sale_id = %request.sale_id, error = %e, "Sale rolled back");
                Err(e)
            }
        }
    }

    /// Pass 1: everything that can be refused without writing.
    async fn validate(&self, request: &SaleRequest) -> StockResult<()> {
        check_sale_request(request)?;

        let sale_id = request.sale_id.trim();
        if self.db.sales().exists(sale_id).await? {
            return Err(StockError::duplicate("sale_id", sale_id));
        }

        let products = self.db.products();
        for (product_id, requested) in requested_quantities(request) {
            let product = products
                .get_by_id(&product_id)
                .await?
                .ok_or_else(|| StockError::ProductNotFound(product_id.clone()))?;

            if !product.can_fulfill(requested) {
                return Err(StockError::InsufficientStock {
                    product_id,
                    name: product.name,
                    available: product.stock_quantity,
                    requested,
                });
            }
        }

        Ok(())
    }

    /// Pass 2: one transaction; dropping `tx` on any error rolls back.
    async fn commit(&self, request: &SaleRequest) -> StockResult<Sale> {
        let sale_id = request.sale_id.trim();
        let note = sale_movement_note(sale_id);
        let mut items = Vec::with_capacity(request.lines.len());

        let mut tx = self.db.pool().begin().await?;

        for line in &request.lines {
            let product =
                adjust_or_reject(&mut tx, &line.product_id, -line.quantity, line.quantity).await?;

            MovementRepository::append_in(
                &mut tx,
                &NewMovement {
                    product_id: &product.id,
                    movement_type: MovementType::Out,
                    quantity: line.quantity,
                    cost_price_cents: Some(product.cost_price_cents),
                    selling_price_cents: Some(line.selling_price_cents),
                    notes: &note,
                },
            )
            .await?;

            let profit = line_profit(
                Money::from_cents(line.selling_price_cents),
                product.cost_price(),
                line.quantity,
            );

            items.push(SaleItem {
                product_id: product.id,
                name_snapshot: product.name,
                barcode_snapshot: product.barcode,
                quantity: line.quantity,
                cost_price_cents: product.cost_price_cents,
                selling_price_cents: line.selling_price_cents,
                profit_cents: profit.cents(),
            });
        }

        let customer = &request.customer;
        let sale = Sale {
            sale_id: sale_id.to_string(),
            customer_name: trimmed(customer.name.as_deref()),
            customer_phone: trimmed(customer.phone.as_deref()),
            customer_address: trimmed(customer.address.as_deref()),
            total_profit_cents: total_profit(&items).cents(),
            items,
            subtotal_cents: request.subtotal_cents,
            tax_cents: request.tax_cents,
            total_cents: request.total_cents,
            created_at: Utc::now(),
        };

        SaleRepository::insert_in(&mut tx, &sale).await?;
        tx.commit().await?;

        Ok(sale)
    }

    /// Gets a completed sale with its items.
    pub async fn get_sale(&self, sale_id: &str) -> StockResult<Sale> {
        self.db
            .sales()
            .get_by_id(sale_id)
            .await?
            .ok_or_else(|| StockError::not_found("Sale", sale_id))
    }

    /// Sales in `range` (all when `None`), newest first.
    pub async fn list_sales(&self, range: Option<&DateRange>) -> StockResult<Vec<Sale>> {
        Ok(self.db.sales().list(range).await?)
    }
}

fn trimmed(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
