//! # stockroom-core: Pure Business Logic for Stockroom
//!
//! This crate holds the domain model of the stock-and-sale subsystem as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            HTTP / PDF / UI collaborators (external)             │   │
//! │  │    record stock movement, complete sale, reports                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ stockroom-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   stock   │  │  report   │  │ validation│  │   │
//! │  │   │  Product  │  │  deltas   │  │  periods  │  │   rules   │  │   │
//! │  │   │  Movement │  │  profit   │  │  summary  │  │  checks   │  │   │
//! │  │   │   Sale    │  │  ledger   │  │           │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              stockroom-db (Database Layer)                      │   │
//! │  │       SQLite, ledger transactions, sale commit, reports         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, StockMovement, Sale, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`stock`] - Signed deltas, quantity checks, profit, ledger balance
//! - [`report`] - Report periods and aggregations
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use stockroom_core::money::Money;
//! use stockroom_core::stock::line_profit;
//!
//! // Sold 4 units at 8.00 that cost 5.00 each
//! let profit = line_profit(Money::from_cents(800), Money::from_cents(500), 4);
//! assert_eq!(profit.cents(), 1200);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod report;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Products with fewer units than this are reported as low stock.
///
/// Can be overridden at runtime through `STOCKROOM_LOW_STOCK_THRESHOLD`.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

/// Number of digits in a generated barcode.
pub const GENERATED_BARCODE_DIGITS: u32 = 7;

/// Upper bound for a single movement or sale line quantity.
///
/// Keeps every signed delta comfortably inside `i64` when summed.
pub const MAX_MOVEMENT_QUANTITY: i64 = 1_000_000;

/// Upper bound for any unit price, in cents.
///
/// `MAX_PRICE_CENTS * MAX_MOVEMENT_QUANTITY * MAX_SALE_LINES` stays below
/// `i64::MAX`, so a line total or a whole sale never overflows.
pub const MAX_PRICE_CENTS: i64 = 10_000_000_000;

/// Upper bound for a sale's or invoice's subtotal, tax and total, in cents.
pub const MAX_SALE_AMOUNT_CENTS: i64 = MAX_PRICE_CENTS * MAX_MOVEMENT_QUANTITY;

/// Maximum number of lines in a single sale.
pub const MAX_SALE_LINES: usize = 200;

/// Note recorded on the initial IN movement of a newly created product.
pub const INITIAL_STOCK_NOTE: &str = "Initial stock";
