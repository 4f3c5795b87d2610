//! # Stock Mutation Service
//!
//! Records one manual stock movement.
//!
//! ## Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record_movement(IN 20 @ 5.00) on P {qty 6}                            │
//! │                                                                         │
//! │  check_movement()          quantity > 0, IN has cost > 0               │
//! │       │                                                                 │
//! │  BEGIN                                                                  │
//! │  UPDATE products SET stock_quantity = stock_quantity + 20              │
//! │   WHERE id = P AND stock_quantity + 20 >= 0   → qty 26                 │
//! │  INSERT INTO stock_movements (IN, 20, cost 500)                        │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any failure before COMMIT drops the transaction: nothing is stored.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::{info, warn};

use crate::error::{StockError, StockResult};
use crate::pool::Database;
use crate::repository::movement::{MovementRepository, NewMovement};
use crate::service::adjust_or_reject;
use stockroom_core::stock::{check_movement, signed_delta};
use stockroom_core::validation::validate_optional_text;
use stockroom_core::{MovementFilter, MovementRequest, Product, StockMovement};

/// Maximum length of a movement note.
pub const MAX_NOTES_LEN: usize = 500;

/// Applies manual stock movements.
#[derive(Debug, Clone)]
pub struct StockService {
    db: Database,
}

impl StockService {
    pub fn new(db: Database) -> Self {
        StockService { db }
    }

    /// Records a movement and updates the product's quantity atomically.
    ///
    /// ## Errors
    /// * `InvalidMovement` - bad quantity, IN without a positive cost
    /// * `ProductNotFound` - unknown product
    /// * `InsufficientStock` - OUT beyond what is on hand
    /// * `StorageFailure` - nothing was committed
    pub async fn record_movement(
        &self,
        request: &MovementRequest,
    ) -> StockResult<(Product, StockMovement)> {
        if let Err(e) = check_movement(request) {
            warn!(product_id = %request.product_id, error = %e, "Movement rejected");
            return Err(e.into());
        }
        validate_optional_text("notes", request.notes.as_deref(), MAX_NOTES_LEN)
            .map_err(|e| StockError::InvalidMovement(e.to_string()))?;

        let delta = signed_delta(request.movement_type, request.quantity);
        let mut tx = self.db.pool().begin().await?;

        // Conditional update first: the transaction holds the write lock
        // before it reads anything.
        let adjusted = adjust_or_reject(&mut tx, &request.product_id, delta, request.quantity).await;
        let product = match adjusted {
            Ok(product) => product,
            Err(e) => {
                warn!(
                    product_id = %request.product_id,
                    movement_type = request.movement_type.as_str(),
                    quantity = request.quantity,
                    error = %e,
                    "Movement rejected"
                );
                return Err(e);
            }
        };

        let movement = MovementRepository::append_in(
            &mut tx,
            &NewMovement {
                product_id: &request.product_id,
                movement_type: request.movement_type,
                quantity: request.quantity,
                cost_price_cents: request.cost_price_cents,
                selling_price_cents: request.selling_price_cents,
                notes: request.notes.as_deref().unwrap_or_default(),
            },
        )
        .await?;

        tx.commit().await?;

        info!(
            product_id = %product.id,
            movement_id = %movement.id,
            movement_type = movement.movement_type.as_str(),
            quantity = movement.quantity,
            stock_quantity = product.stock_quantity,
            "Stock movement recorded"
        );

        Ok((product, movement))
    }

    /// Ledger entries, newest first.
    pub async fn movements(&self, filter: &MovementFilter) -> StockResult<Vec<StockMovement>> {
        Ok(self.db.movements().query(filter).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DbConfig;
    use stockroom_core::{CategoryInput, MovementType, NewProduct};

    async fn setup(initial_quantity: i64) -> (Database, Product) {
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
                name: "Cola 330ml".to_string(),
                barcode: Some("1000001".to_string()),
                category_id: category.id,
                cost_price_cents: 500,
                selling_price_cents: 800,
                initial_quantity,
                ..Default::default()
            })
            .await
            .unwrap();
        (db, product)
    }

    #[tokio::test]
    async fn test_stock_in_adds_quantity_and_records_cost() {
        let (db, product) = setup(6).await;

        let (updated, movement) = db
            .stock()
            .record_movement(&MovementRequest::stock_in(&product.id, 20, 500))
            .await
            .unwrap();

        assert_eq!(updated.stock_quantity, 26);
        assert_eq!(movement.movement_type, MovementType::In);
        assert_eq!(movement.quantity, 20);
        assert_eq!(movement.cost_price_cents, Some(500));
    }

    #[tokio::test]
    async fn test_out_and_return() {
        let (db, product) = setup(10).await;

        let (after_out, _) = db
            .stock()
            .record_movement(&MovementRequest::stock_out(&product.id, 4).with_notes("damaged"))
            .await
            .unwrap();
        assert_eq!(after_out.stock_quantity, 6);

        let (after_return, movement) = db
            .stock()
            .record_movement(&MovementRequest::stock_return(&product.id, 1))
            .await
            .unwrap();
        assert_eq!(after_return.stock_quantity, 7);
        assert_eq!(movement.notes, "");

        let out = db
            .stock()
            .movements(&MovementFilter {
                movement_type: Some(MovementType::Out),
                ..MovementFilter::for_product(&product.id)
            })
            .await
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].notes, "damaged");
    }

    #[tokio::test]
    async fn test_out_beyond_stock_changes_nothing() {
        let (db, product) = setup(3).await;

        let err = db
            .stock()
            .record_movement(&MovementRequest::stock_out(&product.id, 5))
            .await
            .unwrap_err();

        match err {
            StockError::InsufficientStock {
                product_id,
                name,
                available,
                requested,
            } => {
                assert_eq!(product_id, product.id);
                assert_eq!(name, "Cola 330ml");
                assert_eq!(available, 3);
                assert_eq!(requested, 5);
            }
            other => panic!("unexpected {:?}", other),
        }

        let stored = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock_quantity, 3);
        // Only the initial IN
        assert_eq!(db.movements().count_for_product(&product.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_out_to_exactly_zero() {
        let (db, product) = setup(4).await;

        let (updated, _) = db
            .stock()
            .record_movement(&MovementRequest::stock_out(&product.id, 4))
            .await
            .unwrap();
        assert_eq!(updated.stock_quantity, 0);
        assert_eq!(updated.stock_status(), stockroom_core::StockStatus::OutOfStock);
    }

    #[tokio::test]
    async fn test_invalid_requests() {
        let (db, product) = setup(4).await;

        let err = db
            .stock()
            .record_movement(&MovementRequest::stock_out(&product.id, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, StockError::InvalidMovement(_)));

        let mut no_cost = MovementRequest::stock_in(&product.id, 5, 500);
        no_cost.cost_price_cents = None;
        let err = db.stock().record_movement(&no_cost).await.unwrap_err();
        assert!(matches!(err, StockError::InvalidMovement(_)));

        let err = db
            .stock()
            .record_movement(&MovementRequest::stock_in("missing", 5, 500))
            .await
            .unwrap_err();
        assert!(matches!(err, StockError::ProductNotFound(ref id) if id == "missing"));

        let long_notes = MovementRequest::stock_return(&product.id, 1).with_notes("x".repeat(501));
        assert!(db.stock().record_movement(&long_notes).await.is_err());

        let stored = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock_quantity, 4);
    }

    #[tokio::test]
    async fn test_ledger_reproduces_quantity() {
        let (db, product) = setup(10).await;

        for request in [
            MovementRequest::stock_out(&product.id, 4),
            MovementRequest::stock_in(&product.id, 20, 600),
            MovementRequest::stock_out(&product.id, 26),
            MovementRequest::stock_return(&product.id, 2),
        ] {
            db.stock().record_movement(&request).await.unwrap();
        }

        let stored = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock_quantity, 2);
        assert_eq!(db.movements().net_quantity(&product.id).await.unwrap(), 2);
    }
}
