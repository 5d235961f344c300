//! # Validation Module
//!
//! Input validation for document fields and submission.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Form (TypeScript)                                            │
//! │  ├── Numeric inputs, required markers                                  │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Field edits (THIS MODULE)                                    │
//! │  ├── Quantities, prices, discounts not negative                        │
//! │  └── Tax rate 0-100, exchange rate > 0                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Submission (validate_for_submission)                         │
//! │  ├── At least one line                                                 │
//! │  ├── Exchange rate resolved for foreign currency                       │
//! │  └── Document discount within subtotal                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these checks change a computed figure. A document whose discount
//! exceeds its subtotal still shows a negative amount after discount; it is
//! only refused at submission.

use rust_decimal::Decimal;

use crate::document::Document;
use crate::error::ValidationError;
use crate::MAX_DOCUMENT_LINES;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted currency code.
pub const MAX_CURRENCY_CODE_LEN: usize = 10;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a currency code.
///
/// ## Rules
/// - Must not be empty
/// - At most 10 characters
/// - Letters and digits only
///
/// ## Example
/// ```rust
/// use procura_core::validation::validate_currency_code;
///
/// assert!(validate_currency_code("USD").is_ok());
/// assert!(validate_currency_code("").is_err());
/// assert!(validate_currency_code("US D").is_err());
/// ```
pub fn validate_currency_code(code: &str) -> ValidationResult<()> {
    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "currency".to_string(),
        });
    }

    if code.len() > MAX_CURRENCY_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "currency".to_string(),
            max: MAX_CURRENCY_CODE_LEN,
        });
    }

    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidFormat {
            field: "currency".to_string(),
            reason: "must contain only letters and digits".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

fn not_negative(field: &str, value: Decimal) -> ValidationResult<()> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a line quantity. Zero is allowed (a freshly added row).
pub fn validate_quantity(quantity: Decimal) -> ValidationResult<()> {
    not_negative("quantity", quantity)
}

/// Validates a unit price. Zero is allowed (free items).
pub fn validate_unit_price(price: Decimal) -> ValidationResult<()> {
    not_negative("unit price", price)
}

/// Validates a document-level discount.
///
/// Only the sign is checked; a discount above the subtotal is accepted
/// here and reported by [`validate_for_submission`].
pub fn validate_document_discount(discount: Decimal) -> ValidationResult<()> {
    not_negative("document discount", discount)
}

/// Validates a tax rate percentage.
///
/// ## Rules
/// - Must be between 0 and 100 inclusive
///
/// ## Example
/// ```rust
/// use procura_core::validation::validate_tax_rate;
/// use rust_decimal::Decimal;
///
/// assert!(validate_tax_rate(Decimal::from(7)).is_ok());
/// assert!(validate_tax_rate(Decimal::from(101)).is_err());
/// ```
pub fn validate_tax_rate(percent: Decimal) -> ValidationResult<()> {
    if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
        return Err(ValidationError::OutOfRange {
            field: "tax rate".to_string(),
            min: "0".to_string(),
            max: "100".to_string(),
        });
    }
    Ok(())
}

/// Validates an exchange rate. Must be strictly positive.
pub fn validate_exchange_rate(rate: Decimal) -> ValidationResult<()> {
    if rate <= Decimal::ZERO {
        return Err(ValidationError::MustBePositive {
            field: "exchange rate".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates that one more line fits on a document.
///
/// ## Rules
/// - Must not exceed MAX_DOCUMENT_LINES (500)
pub fn validate_line_count(current_lines: usize) -> ValidationResult<()> {
    if current_lines >= MAX_DOCUMENT_LINES {
        return Err(ValidationError::OutOfRange {
            field: "lines".to_string(),
            min: "0".to_string(),
            max: MAX_DOCUMENT_LINES.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Submission
// =============================================================================

/// Checks a document before it is handed to the submission service.
///
/// ## Submission Flow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  User presses "Submit"                                                  │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_for_submission(&doc) ← THIS FUNCTION                         │
/// │       │                                                                 │
/// │       ├── no lines?                   → EmptyDocument                  │
/// │       │                                                                 │
/// │       ├── foreign pair, no rate yet?  → RateUnresolved                 │
/// │       │                                                                 │
/// │       ├── amount after discount < 0?  → DiscountExceedsSubtotal        │
/// │       │                                                                 │
/// │       └── OK → doc.snapshot() goes to the submission service           │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_for_submission(document: &Document) -> ValidationResult<()> {
    if document.lines().is_empty() {
        return Err(ValidationError::EmptyDocument);
    }

    let currency = document.currency();
    if currency.source() != currency.target() && !currency.is_rate_resolved() {
        return Err(ValidationError::RateUnresolved {
            source_currency: currency.source().to_string(),
            target_currency: currency.target().to_string(),
        });
    }

    let totals = document.totals();
    if totals.amount_after_discount.is_negative() {
        return Err(ValidationError::DiscountExceedsSubtotal {
            discount: document.document_discount().round_for_display().to_string(),
            subtotal: totals.subtotal.round_for_display().to_string(),
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
    use crate::money::Money;
    use crate::types::{CurrencyCode, DocumentDefaults, DocumentKind};
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_currency_code() {
        assert!(validate_currency_code("THB").is_ok());
        assert!(validate_currency_code("USDT").is_ok());

        assert_eq!(
            validate_currency_code(""),
            Err(ValidationError::Required {
                field: "currency".to_string()
            })
        );
        assert!(validate_currency_code("U SD").is_err());
        assert!(validate_currency_code("US-D").is_err());
        assert!(validate_currency_code(&"A".repeat(11)).is_err());
    }

    #[test]
    fn test_validate_amounts() {
        assert!(validate_quantity(dec!(0)).is_ok());
        assert!(validate_quantity(dec!(2.5)).is_ok());
        assert!(validate_quantity(dec!(-1)).is_err());

        assert!(validate_unit_price(dec!(0)).is_ok());
        assert!(validate_unit_price(dec!(-0.01)).is_err());

        assert!(validate_document_discount(dec!(1000000)).is_ok());
        assert!(validate_document_discount(dec!(-5)).is_err());
    }

    #[test]
    fn test_validate_tax_rate() {
        assert!(validate_tax_rate(dec!(0)).is_ok());
        assert!(validate_tax_rate(dec!(7)).is_ok());
        assert!(validate_tax_rate(dec!(100)).is_ok());
        assert!(validate_tax_rate(dec!(100.01)).is_err());
        assert!(validate_tax_rate(dec!(-1)).is_err());
    }

    #[test]
    fn test_validate_exchange_rate() {
        assert!(validate_exchange_rate(dec!(35.5)).is_ok());
        assert!(validate_exchange_rate(dec!(0)).is_err());
        assert!(validate_exchange_rate(dec!(-1)).is_err());
    }

    #[test]
    fn test_validate_line_count() {
        assert!(validate_line_count(0).is_ok());
        assert!(validate_line_count(MAX_DOCUMENT_LINES - 1).is_ok());
        assert!(validate_line_count(MAX_DOCUMENT_LINES).is_err());
    }

    fn document_with_line() -> Document {
        let mut doc = Document::new_with_line(DocumentKind::PurchaseOrder, &DocumentDefaults::default());
        let id = doc.lines()[0].id.clone();
        doc.set_quantity(&id, dec!(2)).unwrap();
        doc.set_unit_price(&id, dec!(50)).unwrap();
        doc
    }

    #[test]
    fn test_submission_empty_document() {
        let doc = Document::new(DocumentKind::PurchaseRequisition, &DocumentDefaults::default());
        assert_eq!(validate_for_submission(&doc), Err(ValidationError::EmptyDocument));
    }

    #[test]
    fn test_submission_ok() {
        assert!(validate_for_submission(&document_with_line()).is_ok());
    }

    #[test]
    fn test_submission_unresolved_rate() {
        let mut doc = document_with_line();
        let request = doc
            .set_source_currency(CurrencyCode::parse("USD").unwrap())
            .unwrap();

        assert!(matches!(
            validate_for_submission(&doc),
            Err(ValidationError::RateUnresolved { .. })
        ));

        doc.complete_rate_lookup(&request, dec!(35.5));
        assert!(validate_for_submission(&doc).is_ok());
    }

    #[test]
    fn test_submission_discount_exceeds_subtotal() {
        let mut doc = document_with_line();
        doc.set_document_discount(Money::new(dec!(150))).unwrap();

        // Totals themselves are not clamped
        assert_eq!(doc.totals().amount_after_discount.amount(), dec!(-50));
        assert_eq!(
            validate_for_submission(&doc),
            Err(ValidationError::DiscountExceedsSubtotal {
                discount: "150.00".to_string(),
                subtotal: "100.00".to_string(),
            })
        );
    }
}
