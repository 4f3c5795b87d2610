//! # Error Types
//!
//! Domain-specific error types for stockroom-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockroom-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  stockroom-db errors (separate crate)                                  │
//! │  ├── DbError          - Storage failures                               │
//! │  └── StockError       - Typed failures of the stock entry points       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → StockError → HTTP layer           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Product id does not resolve.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Category id does not resolve.
    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    /// Sale id does not resolve.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Applying the requested quantity would drive stock below zero.
    ///
    /// ## User Workflow
    /// ```text
    /// Sale line: 5 × "Cola 330ml"
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { name: "Cola 330ml", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Caller shows: "Insufficient stock for Cola 330ml. Available: 3"
    /// ```
    #[error("Insufficient stock for {name} ({product_id}): available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        name: String,
        available: i64,
        requested: i64,
    },

    /// Movement request is malformed (bad quantity, missing IN cost, ...).
    #[error("Invalid movement: {reason}")]
    InvalidMovement { reason: String },

    /// Sale request is malformed (no lines, bad line quantity, ...).
    #[error("Invalid sale: {reason}")]
    InvalidSale { reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InvalidMovement error.
    pub fn invalid_movement(reason: impl Into<String>) -> Self {
        CoreError::InvalidMovement {
            reason: reason.into(),
        }
    }

    /// Creates an InvalidSale error.
    pub fn invalid_sale(reason: impl Into<String>) -> Self {
        CoreError::InvalidSale {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., a barcode with punctuation).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates a Required error for `field`.
    pub fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product_id: "p-1".to_string(),
            name: "Cola 330ml".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Cola 330ml (p-1): available 3, requested 5"
        );

        let err = CoreError::invalid_movement("cost price is required for IN");
        assert_eq!(
            err.to_string(),
            "Invalid movement: cost price is required for IN"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(ValidationError::required("barcode").to_string(), "barcode is required");

        let err = ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        };
        assert_eq!(err.to_string(), "name must be at most 200 characters");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("name").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
