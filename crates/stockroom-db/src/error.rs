//! # Database Error Types
//!
//! Error types for storage and for the stock entry points.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError ← Adds context and constraint categorization                  │
//! │       │                                                                 │
//! │       │        CoreError (validation, stock arithmetic)                │
//! │       │             │                                                   │
//! │       ▼             ▼                                                   │
//! │  StockError ← What services return                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ErrorCode + HTTP status hint ← For the calling layer                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use stockroom_core::CoreError;
use thiserror::Error;

// =============================================================================
// DbError
// =============================================================================

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and user feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Inserting a duplicate barcode
    /// - Reusing a sale id
    /// - Duplicate category name
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Referencing a non-existent category
    /// - Deleting a category or product that is still referenced
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// CHECK constraint violation (negative stock, non-positive quantity).
    #[error("Check constraint violation: {message}")]
    CheckViolation { message: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite constraint messages:
                // "UNIQUE constraint failed: <table>.<column>"
                // "FOREIGN KEY constraint failed"
                // "CHECK constraint failed: <expr>"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("CHECK constraint failed") {
                    DbError::CheckViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// StockError
// =============================================================================

/// Typed failure of a catalog, movement, sale or report operation.
///
/// Nothing is committed when one of these is returned from a mutating call.
#[derive(Debug, Error)]
pub enum StockError {
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Category or sale lookup failed.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Insufficient stock for {name} ({product_id}): available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        name: String,
        available: i64,
        requested: i64,
    },

    #[error("Invalid movement: {0}")]
    InvalidMovement(String),

    /// Malformed input other than a movement (sale, catalog fields).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation refused because of existing references.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Sale id, barcode or category name already in use.
    #[error("Duplicate {field}: '{value}' already exists")]
    DuplicateIdentifier { field: String, value: String },

    #[error("Storage failure: {0}")]
    StorageFailure(DbError),
}

impl StockError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        StockError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        StockError::DuplicateIdentifier {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Machine-readable code for the calling layer.
    pub fn code(&self) -> ErrorCode {
        match self {
            StockError::ProductNotFound(_) | StockError::NotFound { .. } => ErrorCode::NotFound,
            StockError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            StockError::InvalidMovement(_) => ErrorCode::InvalidMovement,
            StockError::InvalidInput(_) => ErrorCode::ValidationError,
            StockError::Conflict(_) => ErrorCode::Conflict,
            StockError::DuplicateIdentifier { .. } => ErrorCode::DuplicateIdentifier,
            StockError::StorageFailure(_) => ErrorCode::StorageFailure,
        }
    }

    /// Serializable form handed to the HTTP layer.
    ///
    /// Storage details are logged, not exposed.
    pub fn to_payload(&self) -> ErrorPayload {
        let message = match self {
            StockError::StorageFailure(e) => {
                tracing::error!(error = %e, "Storage failure");
                "Database operation failed".to_string()
            }
            other => other.to_string(),
        };

        ErrorPayload {
            code: self.code(),
            message,
        }
    }
}

/// Lifts storage errors, keeping constraint meaning where it has one.
impl From<DbError> for StockError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => StockError::NotFound { entity, id },
            DbError::UniqueViolation { field, value } => {
                StockError::DuplicateIdentifier { field, value }
            }
            other => StockError::StorageFailure(other),
        }
    }
}

impl From<sqlx::Error> for StockError {
    fn from(err: sqlx::Error) -> Self {
        StockError::from(DbError::from(err))
    }
}

impl From<CoreError> for StockError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => StockError::ProductNotFound(id),
            CoreError::CategoryNotFound(id) => StockError::not_found("Category", id),
            CoreError::SaleNotFound(id) => StockError::not_found("Sale", id),
            CoreError::InsufficientStock {
                product_id,
                name,
                available,
                requested,
            } => StockError::InsufficientStock {
                product_id,
                name,
                available,
                requested,
            },
            CoreError::InvalidMovement { reason } => StockError::InvalidMovement(reason),
            CoreError::InvalidSale { reason } => StockError::InvalidInput(reason),
            CoreError::Validation(e) => StockError::InvalidInput(e.to_string()),
        }
    }
}

impl From<stockroom_core::ValidationError> for StockError {
    fn from(err: stockroom_core::ValidationError) -> Self {
        StockError::InvalidInput(err.to_string())
    }
}

/// Result type for service operations.
pub type StockResult<T> = Result<T, StockError>;

// =============================================================================
// Error Codes
// =============================================================================

/// Error codes for API responses.
///
/// ## Usage in Frontend
/// ```typescript
/// switch (e.code) {
///   case 'INSUFFICIENT_STOCK':
///     showNotification(e.message);
///     break;
///   case 'NOT_FOUND':
///     ...
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,
    /// Not enough units on hand (409)
    InsufficientStock,
    /// Refused because of existing references (409)
    Conflict,
    /// Identifier already in use (409)
    DuplicateIdentifier,
    /// Input validation failed (400)
    ValidationError,
    /// Movement rules violated (422)
    InvalidMovement,
    /// Database operation failed (500)
    StorageFailure,
}

impl ErrorCode {
    /// HTTP status the calling layer should answer with.
    pub const fn http_status(&self) -> u16 {
        match self {
            ErrorCode::NotFound => 404,
            ErrorCode::InsufficientStock
            | ErrorCode::Conflict
            | ErrorCode::DuplicateIdentifier => 409,
            ErrorCode::ValidationError => 400,
            ErrorCode::InvalidMovement => 422,
            ErrorCode::StorageFailure => 500,
        }
    }
}

/// What the HTTP layer receives when an operation fails:
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Insufficient stock for Cola 330ml (...): available 3, requested 5"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub code: ErrorCode,
    pub message: String,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_mapping() {
        let err: StockError = CoreError::InsufficientStock {
            product_id: "p-1".to_string(),
            name: "Cola".to_string(),
            available: 3,
            requested: 5,
        }
        .into();
        assert_eq!(err.code(), ErrorCode::InsufficientStock);
        assert_eq!(err.code().http_status(), 409);

        let err: StockError = CoreError::invalid_movement("bad").into();
        assert_eq!(err.code().http_status(), 422);

        let err: StockError = CoreError::SaleNotFound("S-1".to_string()).into();
        assert_eq!(err.code().http_status(), 404);
    }

    #[test]
    fn test_db_error_mapping() {
        let err: StockError = DbError::duplicate("sale_id", "S-1").into();
        assert!(matches!(err, StockError::DuplicateIdentifier { .. }));

        let err: StockError = DbError::PoolExhausted.into();
        assert_eq!(err.code(), ErrorCode::StorageFailure);
        assert_eq!(err.to_payload().message, "Database operation failed");
    }

    #[test]
    fn test_payload_serialization() {
        let payload = StockError::ProductNotFound("p-9".to_string()).to_payload();
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Product not found: p-9");
    }
}
