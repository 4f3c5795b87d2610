//! # stockroom-db: Storage and Stock Transactions
//!
//! SQLite storage for the catalog, the stock ledger, sales and invoices,
//! plus the services that change stock.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Data Flow                              │
//! │                                                                         │
//! │  HTTP handler / CLI (outside this repo)                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  stockroom-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Services    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │               │    │               │    │  (embedded)  │  │   │
//! │  │   │ StockService  │───►│ ProductRepo   │    │              │  │   │
//! │  │   │ SaleService   │    │ MovementRepo  │    │ 001_initial  │  │   │
//! │  │   │ CatalogSvc    │    │ SaleRepo      │    │              │  │   │
//! │  │   │ ReportService │    │ CategoryRepo  │    │ 002_invoices │  │   │
//! │  │   │ InvoiceSvc    │    │ InvoiceRepo   │    │              │  │   │
//! │  │   └───────┬───────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │           └────────┬───────────┘                               │   │
//! │  │               Database (pool.rs)                                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (WAL)                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`config`] - Environment-driven store settings
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Storage and service error types
//! - [`repository`] - Table-level access
//! - [`service`] - Stock-changing operations and reports
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockroom_db::{Database, StoreConfig};
//! use stockroom_core::MovementRequest;
//!
//! let config = StoreConfig::load()?;
//! let db = Database::new(config.db_config()).await?;
//!
//! let (product, movement) = db
//!     .stock()
//!     .record_movement(&MovementRequest::stock_in(&product_id, 20, 500))
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, StoreConfig};
pub use error::{DbError, DbResult, ErrorCode, ErrorPayload, StockError, StockResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::category::CategoryRepository;
pub use repository::invoice::InvoiceRepository;
pub use repository::movement::MovementRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;

pub use service::catalog::CatalogService;
pub use service::invoice::InvoiceService;
pub use service::report::ReportService;
pub use service::sale::SaleService;
pub use service::stock::StockService;

use tracing_subscriber::EnvFilter;

/// Installs the global `fmt` subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=stockroom_db=trace` - Trace this crate only
/// - Default: `info,stockroom_db=debug,sqlx=warn`
///
/// Calling it twice is harmless; the second call leaves the first
/// subscriber in place.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,stockroom_db=debug,sqlx=warn"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
