//! # Validation Module
//!
//! Field-level input validation for Stockroom.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Web client                                                   │
//! │  └── Required fields, immediate feedback                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE + stock rules                                    │
//! │  └── Lengths, ranges, formats                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                       │
//! │  ├── CHECK (stock_quantity >= 0), CHECK (quantity > 0)                 │
//! │  ├── UNIQUE barcode, UNIQUE sale_id                                    │
//! │  └── Foreign keys, append-only ledger triggers                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::NewInvoice;
use crate::{MAX_MOVEMENT_QUANTITY, MAX_PRICE_CENTS, MAX_SALE_AMOUNT_CENTS, MAX_SALE_LINES};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn validate_required_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a product name (1-200 characters).
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Cola 330ml").is_ok());
/// assert!(validate_product_name("").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_required_text("name", name, 200)
}

/// Validates a category name (1-100 characters).
pub fn validate_category_name(name: &str) -> ValidationResult<()> {
    validate_required_text("category name", name, 100)
}

/// Validates a barcode.
///
/// ## Rules
/// - Must not be empty, at most 64 characters
/// - Letters, digits and hyphens only
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_barcode;
///
/// assert!(validate_barcode("5449000000996").is_ok());
/// assert!(validate_barcode("ABC-12").is_ok());
/// assert!(validate_barcode("has space").is_err());
/// ```
pub fn validate_barcode(barcode: &str) -> ValidationResult<()> {
    validate_required_text("barcode", barcode, 64)?;

    if !barcode
        .trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must contain only letters, digits and hyphens".to_string(),
        });
    }

    Ok(())
}

/// Validates a caller-supplied sale identifier (1-100 characters).
pub fn validate_sale_id(sale_id: &str) -> ValidationResult<()> {
    validate_required_text("sale id", sale_id, 100)
}

/// Validates a caller-supplied invoice identifier (1-100 characters).
pub fn validate_invoice_id(id: &str) -> ValidationResult<()> {
    validate_required_text("invoice id", id, 100)
}

/// Validates optional free text (notes, descriptions).
pub fn validate_optional_text(field: &str, value: Option<&str>, max: usize) -> ValidationResult<()> {
    match value {
        Some(v) if v.chars().count() > max => Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a movement or sale line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_MOVEMENT_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_MOVEMENT_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_MOVEMENT_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents. Zero is allowed (free items).
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_price_cents;
/// use stockroom_core::MAX_PRICE_CENTS;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// assert!(validate_price_cents(MAX_PRICE_CENTS + 1).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a document amount (subtotal, tax, total) in cents.
pub fn validate_amount_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_SALE_AMOUNT_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_SALE_AMOUNT_CENTS,
        });
    }

    Ok(())
}

// =============================================================================
// Invoice Validators
// =============================================================================

/// Checks an invoice before it is saved.
///
/// ## Rules
/// - id and customer name are required
/// - 1..=MAX_SALE_LINES items, each named, with a valid quantity and price
/// - subtotal, tax and total within 0..=MAX_SALE_AMOUNT_CENTS
pub fn validate_invoice(invoice: &NewInvoice) -> ValidationResult<()> {
    validate_invoice_id(&invoice.id)?;
    validate_required_text("customer name", invoice.customer.name.as_deref().unwrap_or(""), 200)?;
    validate_optional_text("customer phone", invoice.customer.phone.as_deref(), 50)?;
    validate_optional_text("customer address", invoice.customer.address.as_deref(), 500)?;

    if invoice.items.is_empty() {
        return Err(ValidationError::required("items"));
    }
    if invoice.items.len() > MAX_SALE_LINES {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_SALE_LINES as i64,
        });
    }
    for item in &invoice.items {
        validate_product_name(&item.name)?;
        validate_quantity(item.quantity)?;
        validate_price_cents(item.unit_price_cents)?;
    }

    validate_amount_cents("subtotal", invoice.subtotal_cents)?;
    validate_amount_cents("tax", invoice.tax_cents)?;
    validate_amount_cents("total", invoice.total_cents)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CustomerInfo, InvoiceItem};
    use chrono::Utc;

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Cola 330ml").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name("   ").is_err());
        assert!(validate_product_name(&"A".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_barcode() {
        assert!(validate_barcode("1234567").is_ok());
        assert!(validate_barcode("SKU-9").is_ok());
        assert!(validate_barcode("").is_err());
        assert!(validate_barcode("12 34").is_err());
        assert!(validate_barcode(&"9".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_MOVEMENT_QUANTITY).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(MAX_MOVEMENT_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(1099).is_ok());
        assert!(validate_price_cents(-1).is_err());
        assert!(validate_price_cents(MAX_PRICE_CENTS).is_ok());
        assert!(validate_price_cents(MAX_PRICE_CENTS + 1).is_err());
        assert!(validate_price_cents(i64::MAX).is_err());
    }

    #[test]
    fn test_validate_optional_text() {
        assert!(validate_optional_text("notes", None, 10).is_ok());
        assert!(validate_optional_text("notes", Some("short"), 10).is_ok());
        assert!(validate_optional_text("notes", Some("much too long"), 10).is_err());
    }

    fn invoice() -> NewInvoice {
        NewInvoice {
            id: "INV-1001".to_string(),
            customer: CustomerInfo {
                name: Some("Ada".to_string()),
                ..Default::default()
            },
            date: Utc::now(),
            items: vec![InvoiceItem {
                product_id: None,
                name: "Cola".to_string(),
                barcode: None,
                quantity: 2,
                unit_price_cents: 250,
            }],
            subtotal_cents: 500,
            tax_cents: 0,
            total_cents: 500,
        }
    }

    #[test]
    fn test_validate_invoice() {
        assert!(validate_invoice(&invoice()).is_ok());

        let mut no_customer = invoice();
        no_customer.customer.name = Some("  ".to_string());
        assert_eq!(
            validate_invoice(&no_customer),
            Err(ValidationError::required("customer name"))
        );

        let mut no_items = invoice();
        no_items.items.clear();
        assert_eq!(validate_invoice(&no_items), Err(ValidationError::required("items")));

        let mut zero_quantity = invoice();
        zero_quantity.items[0].quantity = 0;
        assert!(validate_invoice(&zero_quantity).is_err());

        let mut huge_total = invoice();
        huge_total.total_cents = MAX_SALE_AMOUNT_CENTS + 1;
        assert!(validate_invoice(&huge_total).is_err());

        let mut blank_id = invoice();
        blank_id.id = String::new();
        assert!(validate_invoice(&blank_id).is_err());
    }
}
