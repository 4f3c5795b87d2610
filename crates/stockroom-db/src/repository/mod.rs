//! # Repository Module
//!
//! Table-level access for the stockroom database.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  db.products().get_by_id(id)          pool-backed, one statement        │
//! │  ProductRepository::adjust_quantity_in(&mut tx, id, delta)             │
//! │                                       runs on the caller's transaction │
//! │                                                                         │
//! │  Services own transactions; repositories never BEGIN or COMMIT.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CategoryRepository`](category::CategoryRepository) - Category CRUD
//! - [`ProductRepository`](product::ProductRepository) - Product CRUD and the
//!   conditional quantity update
//! - [`MovementRepository`](movement::MovementRepository) - Append-only stock ledger
//! - [`SaleRepository`](sale::SaleRepository) - Sales and their line items
//! - [`InvoiceRepository`](invoice::InvoiceRepository) - Saved invoices, lines as JSON

pub mod category;
pub mod invoice;
pub mod movement;
pub mod product;
pub mod sale;
