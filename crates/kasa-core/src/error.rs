//! # Error Types
//!
//! Domain-specific error types for kasa-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kasa-core errors (this file)                                          │
//! │  ├── CoreError        - Pricing-stage failures (bad input, fatal)      │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  kasa-db errors (separate crate)                                       │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  kasa-checkout errors                                                  │
//! │  └── CheckoutError    - Session preconditions + wrapped lower layers   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CheckoutError → caller            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pricing-stage errors indicate bad input, not transient failure. They
//! are never retried and never suppressed into a degraded total: the
//! whole order creation fails.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Pricing-stage errors. Any of these aborts the order with no partial
/// result.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Cart references a barcode the catalog cannot resolve, or one that
    /// resolves to an inactive product.
    #[error("Unknown product: {0}")]
    UnknownProduct(String),

    /// An order needs at least one line.
    #[error("Cart is empty")]
    EmptyCart,

    /// Cart has exceeded maximum allowed distinct lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors, raised before any pricing work runs.
#[derive(Debug, Error)]
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

    /// Invalid format (characters, structure).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
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
        let err = CoreError::UnknownProduct("999".to_string());
        assert_eq!(err.to_string(), "Unknown product: 999");

        let err = CoreError::CartTooLarge { max: 100 };
        assert_eq!(err.to_string(), "Cart cannot have more than 100 lines");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
