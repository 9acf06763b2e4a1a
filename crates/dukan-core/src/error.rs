//! # Error Types
//!
//! Domain-specific error types for dukan-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  dukan-core errors (this file)                                         │
//! │  ├── CoreError        - Cart, checkout and scanner rule violations     │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  dukan-client errors (separate crate)                                  │
//! │  ├── ClientError      - HTTP transport / protocol failures             │
//! │  └── PosError         - What the cashier sees (code + notice)          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → PosError → Notice → Presentation  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant here is recoverable by the cashier. None of them end the
//! register session.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Product has no stock at all.
    ///
    /// ## When This Occurs
    /// - Adding a product whose live `quantity` is zero or negative
    #[error("{name} is out of stock")]
    OutOfStock { product_id: i64, name: String },

    /// The cart line would exceed the available stock.
    ///
    /// ## User Workflow
    /// ```text
    /// Scan COLA (stock: 2, in cart: 2)
    ///      │
    ///      ▼
    /// StockExceeded { name: "Cola", available: 2, requested: 3 }
    ///      │
    ///      ▼
    /// UI shows: "Only 2 of Cola in stock"
    /// ```
    #[error("Only {available} of {name} in stock (requested {requested})")]
    StockExceeded {
        product_id: i64,
        name: String,
        available: i64,
        requested: i64,
    },

    /// Checkout attempted with no lines in the cart.
    #[error("Cart is empty. Add products before checking out")]
    EmptyCart,

    /// Discount is negative, or larger than the subtotal at checkout.
    #[error("Discount {discount} is not valid for subtotal {subtotal}")]
    InvalidDiscount { discount: Money, subtotal: Money },

    /// A checkout is already in flight for this cart.
    #[error("A sale is already being submitted")]
    CheckoutInProgress,

    /// The camera scan session could not start.
    #[error("Camera unavailable: {reason}")]
    CameraUnavailable { reason: String },

    /// Manual barcode entry was submitted blank.
    #[error("Enter a barcode first")]
    EmptyBarcode,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
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

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g. an amount that is not a number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
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
        let err = CoreError::StockExceeded {
            product_id: 7,
            name: "Cola".to_string(),
            available: 2,
            requested: 3,
        };
        assert_eq!(err.to_string(), "Only 2 of Cola in stock (requested 3)");

        let err = CoreError::InvalidDiscount {
            discount: Money::from_cents(5000),
            subtotal: Money::from_cents(3000),
        };
        assert_eq!(err.to_string(), "Discount 50.00 is not valid for subtotal 30.00");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "barcode".to_string(),
        };
        assert_eq!(err.to_string(), "barcode is required");

        let err = ValidationError::TooShort {
            field: "query".to_string(),
            min: 2,
        };
        assert_eq!(err.to_string(), "query must be at least 2 characters");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Negative {
            field: "discount".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
