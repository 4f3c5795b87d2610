//! # Domain Types
//!
//! Core domain types used throughout Stockroom.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Category     │   │    Product      │   │  StockMovement  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  category_id    │◄──│  product_id     │       │
//! │  │  name (unique)  │   │  barcode (uniq) │   │  IN/OUT/RETURN  │       │
//! │  └─────────────────┘   │  stock_quantity │   │  quantity > 0   │       │
//! │                        └────────▲────────┘   │  (append-only)  │       │
//! │                                 │            └─────────────────┘       │
//! │                        ┌────────┴────────┐                              │
//! │                        │  Sale           │   one OUT movement per line, │
//! │                        │  sale_id (uniq) │   linked by note "Sale <id>" │
//! │                        │  items[] snap   │                              │
//! │                        │  total_profit   │                              │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Sale lines copy the product's name, barcode and cost price at commit time
//! so later catalog edits never rewrite history.
//!
//! Invoices are stored documents with their own line copies. Saving or
//! deleting one never touches stock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Stock Status
// =============================================================================

/// Availability label shown next to a product.
///
/// The effective status of a product is its manual override when one is set,
/// otherwise it is derived from the quantity (zero => out of stock).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
pub enum StockStatus {
    #[serde(rename = "In Stock")]
    InStock,
    #[serde(rename = "Out of Stock")]
    OutOfStock,
}

impl StockStatus {
    /// Status implied by an on-hand quantity.
    pub const fn from_quantity(quantity: i64) -> Self {
        if quantity > 0 {
            StockStatus::InStock
        } else {
            StockStatus::OutOfStock
        }
    }

    /// Human-readable label.
    pub const fn label(&self) -> &'static str {
        match self {
            StockStatus::InStock => "In Stock",
            StockStatus::OutOfStock => "Out of Stock",
        }
    }
}

// =============================================================================
// Category
// =============================================================================

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: String,
    /// Unique display name.
    pub name: String,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Input for creating or renaming a category.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CategoryInput {
    pub name: String,
    pub description: Option<String>,
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog with its current on-hand quantity.
///
/// `stock_quantity` is never written by catalog edits; it only moves through
/// ledger movements and sales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Barcode, unique across all products.
    pub barcode: String,

    /// Owning category.
    pub category_id: String,

    /// Unit cost in cents (used for profit at time of sale).
    pub cost_price_cents: i64,

    /// Default unit selling price in cents.
    pub selling_price_cents: i64,

    /// Current on-hand quantity, never negative.
    pub stock_quantity: i64,

    /// Manual availability override set from the catalog screen.
    pub stock_status_override: Option<StockStatus>,

    pub description: Option<String>,

    /// Reference to the product image (stored elsewhere).
    pub image: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the cost price as Money.
    #[inline]
    pub fn cost_price(&self) -> Money {
        Money::from_cents(self.cost_price_cents)
    }

    /// Returns the selling price as Money.
    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_cents(self.selling_price_cents)
    }

    /// Effective availability: override first, quantity otherwise.
    pub fn stock_status(&self) -> StockStatus {
        self.stock_status_override
            .unwrap_or_else(|| StockStatus::from_quantity(self.stock_quantity))
    }

    /// Value of the on-hand stock at cost.
    pub fn stock_value(&self) -> Money {
        self.cost_price().multiply_quantity(self.stock_quantity)
    }

    /// Whether `quantity` units can be taken out right now.
    pub fn can_fulfill(&self, quantity: i64) -> bool {
        self.stock_quantity >= quantity
    }
}

/// Input for creating a product.
///
/// A positive `initial_quantity` is recorded as an IN movement, never written
/// directly into the product row.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    /// Blank or missing means "generate one".
    pub barcode: Option<String>,
    pub category_id: String,
    pub cost_price_cents: i64,
    pub selling_price_cents: i64,
    #[serde(default)]
    pub initial_quantity: i64,
    pub stock_status_override: Option<StockStatus>,
    pub description: Option<String>,
    pub image: Option<String>,
}

/// Input for editing a product. Quantity is not editable here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductUpdate {
    pub name: String,
    pub barcode: String,
    pub category_id: String,
    pub cost_price_cents: i64,
    pub selling_price_cents: i64,
    pub stock_status_override: Option<StockStatus>,
    pub description: Option<String>,
    /// `None` keeps the current image.
    pub image: Option<String>,
}

/// Catalog listing filters. Empty filter lists everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductFilter {
    pub category_id: Option<String>,
    /// Exact barcode match.
    pub barcode: Option<String>,
    /// Case-insensitive substring over name and barcode.
    pub search: Option<String>,
}

// =============================================================================
// Stock Movement
// =============================================================================

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum MovementType {
    /// Goods received (purchase, initial stock).
    In,
    /// Goods leaving (sale, write-off).
    Out,
    /// Goods returned by a customer.
    Return,
}

impl MovementType {
    /// +1 for movements that add stock, -1 for those that remove it.
    #[inline]
    pub const fn sign(&self) -> i64 {
        match self {
            MovementType::In | MovementType::Return => 1,
            MovementType::Out => -1,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "IN",
            MovementType::Out => "OUT",
            MovementType::Return => "RETURN",
        }
    }
}

impl std::str::FromStr for MovementType {
    type Err = crate::error::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IN" => Ok(MovementType::In),
            "OUT" => Ok(MovementType::Out),
            "RETURN" => Ok(MovementType::Return),
            other => Err(crate::error::CoreError::invalid_movement(format!(
                "unknown movement type '{}'",
                other
            ))),
        }
    }
}

/// One immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,
    pub movement_type: MovementType,
    /// Always positive; direction comes from `movement_type`.
    pub quantity: i64,
    /// Unit cost, required for IN.
    pub cost_price_cents: Option<i64>,
    /// Unit selling price, meaningful for OUT.
    pub selling_price_cents: Option<i64>,
    pub notes: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl StockMovement {
    /// Quantity with its direction applied.
    #[inline]
    pub fn signed_quantity(&self) -> i64 {
        self.movement_type.sign() * self.quantity
    }
}

/// Request to record a manual stock movement.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MovementRequest {
    pub product_id: String,
    pub movement_type: MovementType,
    pub quantity: i64,
    pub cost_price_cents: Option<i64>,
    pub selling_price_cents: Option<i64>,
    pub notes: Option<String>,
}

impl MovementRequest {
    /// Shorthand for an IN movement at the given unit cost.
    pub fn stock_in(product_id: impl Into<String>, quantity: i64, cost_price_cents: i64) -> Self {
        MovementRequest {
            product_id: product_id.into(),
            movement_type: MovementType::In,
            quantity,
            cost_price_cents: Some(cost_price_cents),
            selling_price_cents: None,
            notes: None,
        }
    }

    /// Shorthand for an OUT movement.
    pub fn stock_out(product_id: impl Into<String>, quantity: i64) -> Self {
        MovementRequest {
            product_id: product_id.into(),
            movement_type: MovementType::Out,
            quantity,
            cost_price_cents: None,
            selling_price_cents: None,
            notes: None,
        }
    }

    /// Shorthand for a customer RETURN.
    pub fn stock_return(product_id: impl Into<String>, quantity: i64) -> Self {
        MovementRequest {
            product_id: product_id.into(),
            movement_type: MovementType::Return,
            quantity,
            cost_price_cents: None,
            selling_price_cents: None,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_selling_price(mut self, cents: i64) -> Self {
        self.selling_price_cents = Some(cents);
        self
    }
}

/// Ledger query filters. All bounds are inclusive.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MovementFilter {
    pub product_id: Option<String>,
    pub movement_type: Option<MovementType>,
    #[ts(as = "Option<String>")]
    pub from: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub to: Option<DateTime<Utc>>,
}

impl MovementFilter {
    pub fn for_product(product_id: impl Into<String>) -> Self {
        MovementFilter {
            product_id: Some(product_id.into()),
            ..Default::default()
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// Optional customer details attached to a sale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerInfo {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// One requested line of a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleLineRequest {
    pub product_id: String,
    pub quantity: i64,
    /// Price actually charged per unit (may differ from the catalog price).
    pub selling_price_cents: i64,
}

/// Request to complete a sale.
///
/// Subtotal, tax and total come from the checkout screen and are stored as
/// given; profit is always computed server-side.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleRequest {
    pub sale_id: String,
    #[serde(default)]
    pub customer: CustomerInfo,
    pub lines: Vec<SaleLineRequest>,
    pub subtotal_cents: i64,
    #[serde(default)]
    pub tax_cents: i64,
    pub total_cents: i64,
}

/// A completed, immutable sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub sale_id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub items: Vec<SaleItem>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    /// Sum of the line profits.
    pub total_profit_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn total_profit(&self) -> Money {
        Money::from_cents(self.total_profit_cents)
    }

    /// Note carried by every OUT movement this sale produced.
    pub fn movement_note(&self) -> String {
        sale_movement_note(&self.sale_id)
    }
}

/// Note linking a sale's OUT movements back to it.
pub fn sale_movement_note(sale_id: &str) -> String {
    format!("Sale {}", sale_id)
}

/// A line of a completed sale, frozen at commit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Barcode at time of sale (frozen).
    pub barcode_snapshot: String,
    pub quantity: i64,
    /// Product cost at time of sale (frozen, never from the client).
    pub cost_price_cents: i64,
    pub selling_price_cents: i64,
    /// (selling - cost) × quantity
    pub profit_cents: i64,
}

impl SaleItem {
    #[inline]
    pub fn profit(&self) -> Money {
        Money::from_cents(self.profit_cents)
    }

    /// Revenue of this line before tax.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.selling_price_cents).multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Invoice
// =============================================================================

/// One line of an invoice, copied from the builder's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceItem {
    /// Catalog product the line came from, if any.
    #[serde(default)]
    pub product_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub barcode: Option<String>,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

impl InvoiceItem {
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }
}

/// Request to save an invoice under a caller-chosen id.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewInvoice {
    pub id: String,
    pub customer: CustomerInfo,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub items: Vec<InvoiceItem>,
    #[serde(default)]
    pub subtotal_cents: i64,
    #[serde(default)]
    pub tax_cents: i64,
    pub total_cents: i64,
}

/// A saved invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Invoice {
    pub id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub items: Vec<InvoiceItem>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
