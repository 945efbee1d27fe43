//! # Validation Module
//!
//! Input validation for the checkout boundary. Runs before any pricing
//! work so malformed requests fail fast and never reach the engine.

use crate::error::ValidationError;
use crate::{MAX_LINE_QUANTITY, MAX_NAME_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product barcode.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Alphanumeric, hyphens, underscores only
///
/// ## Example
/// ```rust
/// use kasa_core::validation::validate_barcode;
///
/// assert!(validate_barcode("8901030-512").is_ok());
/// assert!(validate_barcode("").is_err());
/// assert!(validate_barcode("no spaces").is_err());
/// ```
pub fn validate_barcode(barcode: &str) -> ValidationResult<()> {
    let barcode = barcode.trim();

    if barcode.is_empty() {
        return Err(ValidationError::Required {
            field: "barcode".to_string(),
        });
    }

    if barcode.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "barcode".to_string(),
            max: 50,
        });
    }

    if !barcode
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a cashier name (session owner).
pub fn validate_cashier_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "cashier_name".to_string(),
        });
    }

    if name.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "cashier_name".to_string(),
            max: 100,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a requested cart-line quantity.
///
/// Cart requests are always positive; the return sign is applied by the
/// line pricer, never supplied by the caller.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents (zero allowed: free items exist).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustBePositive {
            field: "price_cents".to_string(),
        });
    }

    Ok(())
}

/// Validates an opening-cash amount for a new session.
pub fn validate_opening_cash(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustBePositive {
            field: "opening_cash".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_barcode() {
        assert!(validate_barcode("001").is_ok());
        assert!(validate_barcode("COKE-330_A").is_ok());
        assert!(validate_barcode("").is_err());
        assert!(validate_barcode("   ").is_err());
        assert!(validate_barcode("has space").is_err());
        assert!(validate_barcode(&"9".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_cashier_name() {
        assert!(validate_cashier_name("alice").is_ok());
        assert!(validate_cashier_name("").is_err());
        assert!(validate_cashier_name(&"a".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_money_fields() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(-1).is_err());
        assert!(validate_opening_cash(10000).is_ok());
        assert!(validate_opening_cash(-1).is_err());
    }
}
