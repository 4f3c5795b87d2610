//! # Stock Arithmetic
//!
//! Pure rules behind every stock mutation: signed deltas, request checks and
//! per-line profit.
//!
//! ## Movement Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  type     delta        cost_price        selling_price                  │
//! │  ──────   ─────────    ───────────────   ──────────────                 │
//! │  IN       +quantity    required, > 0     ignored                        │
//! │  OUT      -quantity    optional          optional (sale price)          │
//! │  RETURN   +quantity    optional          optional                       │
//! │                                                                         │
//! │  stock_quantity == Σ signed deltas of the product's ledger  (≥ 0)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The non-negative rule itself lives in the database layer's conditional
//! UPDATE; these functions are used for pre-validation.

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{MovementRequest, MovementType, SaleItem, SaleRequest};
use crate::validation::{validate_price_cents, validate_quantity, validate_sale_id};
use crate::{MAX_SALE_AMOUNT_CENTS, MAX_SALE_LINES};

// =============================================================================
// Deltas
// =============================================================================

/// Signed change a movement applies to on-hand stock.
///
/// ## Example
/// ```rust
/// use stockroom_core::stock::signed_delta;
/// use stockroom_core::MovementType;
///
/// assert_eq!(signed_delta(MovementType::In, 20), 20);
/// assert_eq!(signed_delta(MovementType::Out, 4), -4);
/// assert_eq!(signed_delta(MovementType::Return, 1), 1);
/// ```
#[inline]
pub const fn signed_delta(movement_type: MovementType, quantity: i64) -> i64 {
    movement_type.sign() * quantity
}

// =============================================================================
// Movement Rules
// =============================================================================

/// Checks a movement request before anything touches storage.
///
/// ## Rules
/// - quantity within `1..=MAX_MOVEMENT_QUANTITY`
/// - IN needs a positive cost price
/// - any supplied price is non-negative
pub fn check_movement(request: &MovementRequest) -> CoreResult<()> {
    if request.product_id.trim().is_empty() {
        return Err(CoreError::invalid_movement("product is required"));
    }

    validate_quantity(request.quantity)
        .map_err(|e| CoreError::invalid_movement(e.to_string()))?;

    match (request.movement_type, request.cost_price_cents) {
        (MovementType::In, None) => {
            return Err(CoreError::invalid_movement(
                "cost price is required for IN movements",
            ));
        }
        (MovementType::In, Some(cost)) if cost <= 0 => {
            return Err(CoreError::invalid_movement(
                "cost price must be positive for IN movements",
            ));
        }
        (_, Some(cost)) => {
            validate_price_cents(cost).map_err(|e| CoreError::invalid_movement(e.to_string()))?
        }
        _ => {}
    }

    if let Some(price) = request.selling_price_cents {
        validate_price_cents(price).map_err(|e| CoreError::invalid_movement(e.to_string()))?;
    }

    Ok(())
}

// =============================================================================
// Sale Rules
// =============================================================================

/// Profit of one sale line: `(selling - cost) × quantity`.
#[inline]
pub fn line_profit(selling_price: Money, cost_price: Money, quantity: i64) -> Money {
    (selling_price - cost_price).multiply_quantity(quantity)
}

/// Sum of the line profits.
pub fn total_profit(items: &[SaleItem]) -> Money {
    items.iter().map(SaleItem::profit).sum()
}

/// Structural checks on a sale request (no stock lookups).
pub fn check_sale_request(request: &SaleRequest) -> CoreResult<()> {
    validate_sale_id(&request.sale_id)?;

    if request.lines.is_empty() {
        return Err(CoreError::invalid_sale("a sale needs at least one item"));
    }

    if request.lines.len() > MAX_SALE_LINES {
        return Err(CoreError::invalid_sale(format!(
            "a sale cannot have more than {} items",
            MAX_SALE_LINES
        )));
    }

    for (idx, line) in request.lines.iter().enumerate() {
        if line.product_id.trim().is_empty() {
            return Err(CoreError::invalid_sale(format!("line {}: product is required", idx + 1)));
        }
        validate_quantity(line.quantity)
            .map_err(|e| CoreError::invalid_sale(format!("line {}: {}", idx + 1, e)))?;
        validate_price_cents(line.selling_price_cents)
            .map_err(|e| CoreError::invalid_sale(format!("line {}: {}", idx + 1, e)))?;
    }

    for (field, cents) in [
        ("subtotal", request.subtotal_cents),
        ("tax", request.tax_cents),
        ("total", request.total_cents),
    ] {
        if cents < 0 {
            return Err(CoreError::invalid_sale(format!("{} cannot be negative", field)));
        }
        if cents > MAX_SALE_AMOUNT_CENTS {
            return Err(CoreError::invalid_sale(format!(
                "{} cannot exceed {}",
                field,
                Money::from_cents(MAX_SALE_AMOUNT_CENTS)
            )));
        }
    }

    Ok(())
}

/// Total requested units per product, in first-seen order.
///
/// A product listed on two lines must have stock for both together.
pub fn requested_quantities(request: &SaleRequest) -> Vec<(String, i64)> {
    let mut order: Vec<(String, i64)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for line in &request.lines {
        match index.get(line.product_id.as_str()) {
            Some(&pos) => order[pos].1 += line.quantity,
            None => {
                index.insert(line.product_id.as_str(), order.len());
                order.push((line.product_id.clone(), line.quantity));
            }
        }
    }

    order
}

// =============================================================================
// Unit Tests
// =============================================================================
