//! # Line Calculator
//!
//! Turns a line's raw inputs into a resolved discount and a line amount.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  quantity ─┐                                                            │
//! │            ├─► gross = qty × price                                      │
//! │  price ────┘         │                                                  │
//! │                      ▼                                                  │
//! │  "10%" ──► DiscountInput ──► raw discount ──► clamp [0, gross]          │
//! │                                                     │                   │
//! │                                                     ▼                   │
//! │                                   line amount = gross − discount        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::discount::DiscountInput;
use crate::money::Money;

// =============================================================================
// Line Resolution
// =============================================================================

/// Output of [`resolve_line`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineResolution {
    /// quantity × unit price.
    pub gross_amount: Money,
    /// Discount actually applied, within `[0, gross_amount]`.
    pub resolved_discount: Money,
    /// gross − resolved discount.
    pub line_amount: Money,
}

/// Resolves one line.
///
/// ## Rules
/// - `"x%"` takes x percent of the gross amount
/// - anything else is read as a flat amount
/// - malformed input counts as no discount
/// - the discount is clamped so the line never goes below zero
/// - figures too large for a `Decimal` saturate, so a percentage that
///   overflows ends up clamped to the gross amount
///
/// ## Example
/// ```rust
/// use procura_core::line::resolve_line;
/// use rust_decimal::Decimal;
///
/// // 5 × 50 = 250, a flat 500 discount is clamped to 250
/// let line = resolve_line(Decimal::from(5), Decimal::from(50), "500");
/// assert_eq!(line.resolved_discount.amount(), Decimal::from(250));
/// assert!(line.line_amount.is_zero());
/// ```
pub fn resolve_line(quantity: Decimal, unit_price: Decimal, discount_input: &str) -> LineResolution {
    resolve_parsed(quantity, unit_price, DiscountInput::parse(discount_input))
}

/// Same as [`resolve_line`] for an already parsed token.
pub fn resolve_parsed(quantity: Decimal, unit_price: Decimal, discount: DiscountInput) -> LineResolution {
    let gross_amount = Money::new(unit_price).multiply_quantity(quantity);
    let resolved_discount = discount
        .raw_discount(gross_amount)
        .min(gross_amount)
        .max(Money::zero());

    LineResolution {
        gross_amount,
        resolved_discount,
        line_amount: gross_amount - resolved_discount,
    }
}

// =============================================================================
// Document Line
// =============================================================================

/// Identifier of a line within a document (UUID v4).
pub type LineId = String;

/// One row of a purchasing document.
///
/// ## Invariants
/// - `discount` and `amount` always reflect the current raw inputs
/// - `0 ≤ discount ≤ quantity × unit_price`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DocumentLine {
    /// Line identifier.
    pub id: LineId,

    /// Item description as typed on the form.
    pub description: Option<String>,

    /// Unit of measure ("EA", "BOX", ...).
    pub unit: Option<String>,

    /// Ordered quantity.
    #[ts(type = "string")]
    pub quantity: Decimal,

    /// Price per unit in the document currency.
    #[ts(type = "string")]
    pub unit_price: Decimal,

    /// Discount field exactly as typed ("", "50", "10%").
    pub discount_input: String,

    /// Discount actually applied.
    pub discount: Money,

    /// Line amount after discount.
    pub amount: Money,
}

impl DocumentLine {
    /// Creates an empty line (zero quantity, zero price, no discount).
    pub fn new() -> Self {
        DocumentLine {
            id: Uuid::new_v4().to_string(),
            description: None,
            unit: None,
            quantity: Decimal::ZERO,
            unit_price: Decimal::ZERO,
            discount_input: String::new(),
            discount: Money::zero(),
            amount: Money::zero(),
        }
    }

    /// Returns quantity × unit price.
    pub fn gross_amount(&self) -> Money {
        Money::new(self.unit_price).multiply_quantity(self.quantity)
    }

    /// Returns the parsed discount token.
    pub fn parsed_discount(&self) -> DiscountInput {
        DiscountInput::parse(&self.discount_input)
    }

    /// Re-runs the Line Calculator for this line.
    pub fn resolve(&mut self) -> LineResolution {
        let resolution = resolve_line(self.quantity, self.unit_price, &self.discount_input);
        self.discount = resolution.resolved_discount;
        self.amount = resolution.line_amount;
        resolution
    }
}

impl Default for DocumentLine {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_percent_discount() {
        // qty=10, price=100, "10%" → discount 100, amount 900
        let line = resolve_line(dec!(10), dec!(100), "10%");
        assert_eq!(line.gross_amount.amount(), dec!(1000));
        assert_eq!(line.resolved_discount.amount(), dec!(100));
        assert_eq!(line.line_amount.amount(), dec!(900));
    }

    #[test]
    fn test_flat_discount_clamped_to_gross() {
        // qty=5, price=50, "500" exceeds gross 250
        let line = resolve_line(dec!(5), dec!(50), "500");
        assert_eq!(line.resolved_discount.amount(), dec!(250));
        assert_eq!(line.line_amount.amount(), dec!(0));
    }

    #[test]
    fn test_percent_over_hundred_clamped() {
        let line = resolve_line(dec!(2), dec!(10), "150%");
        assert_eq!(line.resolved_discount.amount(), dec!(20));
        assert!(line.line_amount.is_zero());
    }

    #[test]
    fn test_huge_percentage_clamps_to_gross() {
        let line = resolve_line(dec!(1000), dec!(1), "79228162514264337593543950335%");
        assert_eq!(line.resolved_discount.amount(), dec!(1000));
        assert!(line.line_amount.is_zero());

        let line = resolve_line(dec!(1000), dec!(1), "-79228162514264337593543950335%");
        assert!(line.resolved_discount.is_zero());
        assert_eq!(line.line_amount.amount(), dec!(1000));
    }

    #[test]
    fn test_gross_beyond_decimal_range_saturates() {
        let big = dec!(100000000000000000);
        let line = resolve_line(big, big, "10%");
        assert_eq!(line.gross_amount.amount(), Decimal::MAX);
        assert!(line.resolved_discount <= line.gross_amount);
        assert!(!line.line_amount.is_negative());
    }

    #[test]
    fn test_negative_discount_never_applied() {
        let line = resolve_line(dec!(2), dec!(10), "-5");
        assert!(line.resolved_discount.is_zero());
        assert_eq!(line.line_amount.amount(), dec!(20));

        let line = resolve_line(dec!(2), dec!(10), "-5%");
        assert!(line.resolved_discount.is_zero());
    }

    #[test]
    fn test_malformed_discount_is_zero() {
        for raw in ["abc", "%", ""] {
            let line = resolve_line(dec!(3), dec!(7), raw);
            assert!(line.resolved_discount.is_zero());
            assert_eq!(line.line_amount.amount(), dec!(21));
        }
    }

    #[test]
    fn test_fractional_quantity() {
        let line = resolve_line(dec!(2.5), dec!(3.99), "12.5%");
        assert_eq!(line.gross_amount.amount(), dec!(9.975));
        assert_eq!(line.resolved_discount.amount(), dec!(1.246875));
        assert_eq!(line.line_amount.amount(), dec!(8.728125));
    }

    #[test]
    fn test_document_line_resolve() {
        let mut line = DocumentLine::new();
        assert!(line.amount.is_zero());

        line.quantity = dec!(10);
        line.unit_price = dec!(100);
        line.discount_input = "10%".to_string();
        line.resolve();

        assert_eq!(line.discount.amount(), dec!(100));
        assert_eq!(line.amount.amount(), dec!(900));
        assert_eq!(line.gross_amount().amount(), dec!(1000));
        assert_eq!(line.parsed_discount(), DiscountInput::Percent(dec!(10)));
    }

    #[test]
    fn test_new_lines_have_distinct_ids() {
        assert_ne!(DocumentLine::new().id, DocumentLine::new().id);
    }

    fn amount() -> impl Strategy<Value = Decimal> {
        (0i64..10_000_000, 0u32..4).prop_map(|(n, scale)| Decimal::new(n, scale))
    }

    proptest! {
        #[test]
        fn prop_discount_within_gross(q in amount(), p in amount(), raw in ".{0,8}") {
            let line = resolve_line(q, p, &raw);
            prop_assert!(line.resolved_discount.amount() >= Decimal::ZERO);
            prop_assert!(line.resolved_discount <= line.gross_amount);
            prop_assert_eq!(line.line_amount, line.gross_amount - line.resolved_discount);
        }

        #[test]
        fn prop_flat_discount_is_min(q in amount(), p in amount(), d in amount()) {
            let line = resolve_line(q, p, &d.to_string());
            prop_assert_eq!(line.resolved_discount.amount(), d.min(q * p));
        }

        #[test]
        fn prop_percent_discount_is_min(q in amount(), p in amount(), x in 0u32..300) {
            let line = resolve_line(q, p, &format!("{}%", x));
            let expected = (q * p * Decimal::from(x) / Decimal::ONE_HUNDRED).min(q * p);
            prop_assert_eq!(line.resolved_discount.amount(), expected);
        }
    }
}
