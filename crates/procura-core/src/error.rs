//! # Error Types
//!
//! Domain-specific error types for procura-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  procura-core errors (this file)                                       │
//! │  ├── CoreError        - Document operation failures                    │
//! │  └── ValidationError  - Input / submission validation failures         │
//! │                                                                         │
//! │  procura-sync errors (separate crate)                                  │
//! │  └── SyncError        - Config, rate lookup, session failures          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → SyncError → front-end             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Malformed discount tokens and failed rate lookups are NOT errors here:
//! the former degrade to a zero discount, the latter keep the last rate.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Document operation errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Line cannot be found on the document.
    ///
    /// ## When This Occurs
    /// - The row was already deleted
    /// - The front-end holds a stale line id after a reload
    #[error("Line not found: {0}")]
    LineNotFound(String),

    /// Document has reached the maximum number of lines.
    #[error("Document cannot have more than {max} lines")]
    TooManyLines { max: usize },

    /// Manual exchange-rate edit while source and target currency match.
    ///
    /// ## User Workflow
    /// ```text
    /// Source: THB, Target: THB
    ///      │
    ///      ▼
    /// User types 35.5 into the rate field
    ///      │
    ///      ▼
    /// ExchangeRateLocked { currency: "THB" }  (rate stays 1)
    /// ```
    #[error("Exchange rate is fixed at 1 while both sides are {currency}")]
    ExchangeRateLocked { currency: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input and submission validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (e.g., currency code with spaces).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or more.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: String,
        min: String,
        max: String,
    },

    /// Document has no lines.
    #[error("Document must have at least one line")]
    EmptyDocument,

    /// Source and target differ but no rate was fetched or typed in.
    #[error("Exchange rate {source_currency}/{target_currency} has not been resolved")]
    RateUnresolved {
        source_currency: String,
        target_currency: String,
    },

    /// Document discount is larger than the sum of the lines.
    #[error("Document discount {discount} exceeds subtotal {subtotal}")]
    DiscountExceedsSubtotal { discount: String, subtotal: String },
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
        let err = CoreError::ExchangeRateLocked {
            currency: "THB".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Exchange rate is fixed at 1 while both sides are THB"
        );

        let err = CoreError::TooManyLines { max: 500 };
        assert_eq!(err.to_string(), "Document cannot have more than 500 lines");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::RateUnresolved {
            source_currency: "USD".to_string(),
            target_currency: "EUR".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Exchange rate USD/EUR has not been resolved"
        );

        let err = ValidationError::MustNotBeNegative {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must not be negative");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::EmptyDocument;
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
