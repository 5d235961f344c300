//! # Discount Module
//!
//! Parses the raw text of a line's discount field.
//!
//! ## Three-State Parse
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Raw token           Parsed as                 Discount on gross 1000   │
//! │  ─────────           ─────────                 ──────────────────────   │
//! │  "50"           ──►  Flat(50)             ──►  50                       │
//! │  "10%"          ──►  Percent(10)          ──►  100                      │
//! │  "abc", "%", "" ──►  Unrecognized         ──►  0                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Parsing never fails. The field is edited keystroke by keystroke, so a
//! half-typed token ("1" on the way to "10%") must keep the form usable.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::money::Money;

/// Suffix marking a percentage discount.
pub const PERCENT_SUFFIX: char = '%';

/// A parsed discount token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum DiscountInput {
    /// A flat amount in the document currency.
    Flat(Decimal),
    /// A percentage of the line's gross amount.
    Percent(Decimal),
    /// Anything that is not a number; treated as no discount.
    #[default]
    Unrecognized,
}

impl DiscountInput {
    /// Parses a raw discount token.
    ///
    /// ## Example
    /// ```rust
    /// use procura_core::discount::DiscountInput;
    /// use rust_decimal::Decimal;
    ///
    /// assert_eq!(DiscountInput::parse("10%"), DiscountInput::Percent(Decimal::from(10)));
    /// assert_eq!(DiscountInput::parse(" 25 "), DiscountInput::Flat(Decimal::from(25)));
    /// assert_eq!(DiscountInput::parse("abc"), DiscountInput::Unrecognized);
    /// ```
    pub fn parse(raw: &str) -> Self {
        let token = raw.trim();

        if let Some(number) = token.strip_suffix(PERCENT_SUFFIX) {
            return match parse_decimal(number) {
                Some(pct) => DiscountInput::Percent(pct),
                None => DiscountInput::Unrecognized,
            };
        }

        match parse_decimal(token) {
            Some(amount) => DiscountInput::Flat(amount),
            None => DiscountInput::Unrecognized,
        }
    }

    /// Returns the discount this token asks for on `gross`, before clamping.
    pub fn raw_discount(&self, gross: Money) -> Money {
        match self {
            DiscountInput::Flat(amount) => Money::new(*amount),
            DiscountInput::Percent(pct) => gross.percentage(*pct),
            DiscountInput::Unrecognized => Money::zero(),
        }
    }

    /// Checks if the token was understood.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, DiscountInput::Unrecognized)
    }
}

/// Strict decimal parse; `None` for empty or non-numeric text.
fn parse_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Decimal::from_str(text).ok()
}

// =============================================================================
// Unit Tests
// =============================================================================
