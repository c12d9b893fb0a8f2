//! # Error Types
//!
//! Domain-specific error types for label-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  label-core errors (this file)                                          │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  label-cart errors (separate crate)                                     │
//! │  ├── BackendError     - What the remote cart service reported          │
//! │  └── CartError        - What the configurator sees                     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CartError → UI message            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The sizing engine has no error type at all: an unmeasurable layout
//! yields the previous stable size instead.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A decimal amount from the remote store could not be parsed.
    ///
    /// ## When This Occurs
    /// - `cost.totalAmount.amount` is not a plain decimal ("12.90")
    /// - More than two fractional digits
    #[error("Invalid money amount: '{0}'")]
    InvalidAmount(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when a configuration doesn't meet the label rules.
/// Used before a configuration is handed to the cart.
#[derive(Debug, Error, PartialEq)]
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

    /// Invalid format (e.g., a color that is not `#rrggbb`).
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
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "text".to_string(),
        };
        assert_eq!(err.to_string(), "text is required");

        let err = ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: 99,
        };
        assert_eq!(err.to_string(), "quantity must be between 1 and 99");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "text".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
