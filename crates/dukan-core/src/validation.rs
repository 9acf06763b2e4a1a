//! # Validation Module
//!
//! Input validation for the fields a cashier types into.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Presentation                                                 │
//! │  └── Raw text from search box, barcode field, discount, quantity       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Trim, length, numeric format                                      │
//! │  └── Never touches the network                                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Sales API                                                    │
//! │  └── Stock and permission checks at sale time                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::MIN_SEARCH_QUERY_LEN;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest query sent to the search endpoint.
pub const MAX_SEARCH_QUERY_LEN: usize = 100;

/// Longest barcode accepted for lookup.
pub const MAX_BARCODE_LEN: usize = 64;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a search query.
///
/// ## Rules
/// - Trimmed before checking
/// - At least `min_len` characters (normally [`MIN_SEARCH_QUERY_LEN`])
/// - At most [`MAX_SEARCH_QUERY_LEN`] characters
///
/// ## Returns
/// The trimmed query.
///
/// ## Example
/// ```rust
/// use dukan_core::validation::validate_search_query;
/// use dukan_core::MIN_SEARCH_QUERY_LEN;
///
/// assert_eq!(validate_search_query("  cola ", MIN_SEARCH_QUERY_LEN).unwrap(), "cola");
/// assert!(validate_search_query("c", MIN_SEARCH_QUERY_LEN).is_err());
/// ```
pub fn validate_search_query(query: &str, min_len: usize) -> ValidationResult<&str> {
    let query = query.trim();
    let len = query.chars().count();

    if len < min_len {
        return Err(ValidationError::TooShort {
            field: "query".to_string(),
            min: min_len,
        });
    }

    if len > MAX_SEARCH_QUERY_LEN {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: MAX_SEARCH_QUERY_LEN,
        });
    }

    Ok(query)
}

/// Validates a barcode before lookup.
///
/// ## Rules
/// - Trimmed before checking
/// - Must not be empty
/// - At most [`MAX_BARCODE_LEN`] characters
/// - No control characters
pub fn validate_barcode(code: &str) -> ValidationResult<&str> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "barcode".to_string(),
        });
    }

    if code.chars().count() > MAX_BARCODE_LEN {
        return Err(ValidationError::TooLong {
            field: "barcode".to_string(),
            max: MAX_BARCODE_LEN,
        });
    }

    if code.chars().any(char::is_control) {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "contains control characters".to_string(),
        });
    }

    Ok(code)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Parses the discount field. Blank input means no discount.
///
/// ## Example
/// ```rust
/// use dukan_core::validation::parse_discount;
///
/// assert_eq!(parse_discount("").unwrap().cents(), 0);
/// assert_eq!(parse_discount("12.5").unwrap().cents(), 1250);
/// assert!(parse_discount("-1").is_err());
/// ```
pub fn parse_discount(input: &str) -> ValidationResult<Money> {
    if input.trim().is_empty() {
        return Ok(Money::zero());
    }

    let amount: Money = input.parse()?;
    if amount.is_negative() {
        return Err(ValidationError::Negative {
            field: "discount".to_string(),
        });
    }

    Ok(amount)
}

/// Parses a quantity typed into a cart line.
///
/// Zero and negative values are valid input: they remove the line.
pub fn parse_quantity(input: &str) -> ValidationResult<i64> {
    input
        .trim()
        .parse::<i64>()
        .map_err(|_| ValidationError::InvalidFormat {
            field: "quantity".to_string(),
            reason: "expected a whole number".to_string(),
        })
}
