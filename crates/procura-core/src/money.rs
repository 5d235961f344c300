//! # Money Module
//!
//! Provides the `Money` type for document amounts.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Integer cents are not enough here either:                              │
//! │    12.5% of 3.99 = 0.49875  → needs more than 2 digits until display    │
//! │                                                                         │
//! │  OUR SOLUTION: Exact Decimal                                            │
//! │    Full precision through the whole pipeline,                           │
//! │    rounded to 2 digits only when rendered                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use procura_core::money::Money;
//! use rust_decimal::Decimal;
//!
//! let price = Money::new(Decimal::new(1099, 2)); // 10.99
//! let line = price.multiply_quantity(Decimal::from(3));
//! assert_eq!(line.to_string(), "32.97");
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

/// Fraction digits shown to the user.
pub const DISPLAY_SCALE: u32 = 2;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the document's currency, kept at full precision.
///
/// ## Design Decisions
/// - **Signed**: the amount after document discount may go negative
/// - **Single field tuple struct**: zero-cost wrapper over `Decimal`
/// - **Serialized as a string**: no precision loss on the way to the browser
/// - **Saturating**: operators and scaling clamp at the `Decimal` range
///   instead of panicking; the `checked_*` forms report the overflow
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  qty × unit price ──► gross ──► − line discount ──► line amount         │
/// │                                                                         │
/// │  Σ line amount ──► − document discount ──► + tax ──► grand total        │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(#[ts(type = "string")] Decimal);

impl Money {
    /// Creates a Money value from a decimal amount.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Returns the underlying decimal.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Returns the absolute value.
    #[inline]
    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies a unit price by a (possibly fractional) quantity.
    ///
    /// ## Example
    /// ```rust
    /// use procura_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let unit_price = Money::new(Decimal::from(50));
    /// let gross = unit_price.multiply_quantity(Decimal::new(25, 1)); // 2.5 units
    /// assert_eq!(gross.amount(), Decimal::from(125));
    /// ```
    #[inline]
    pub fn multiply_quantity(&self, qty: Decimal) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Like [`Money::multiply_quantity`], `None` when the product does not
    /// fit in a `Decimal`.
    #[inline]
    pub fn checked_multiply_quantity(&self, qty: Decimal) -> Option<Self> {
        self.0.checked_mul(qty).map(Money)
    }

    /// Returns `pct` percent of this amount (`self × pct / 100`).
    ///
    /// Multiplication happens before the division so whole percentages of
    /// whole amounts stay exact. Saturates at the `Decimal` range.
    pub fn percentage(&self, pct: Decimal) -> Money {
        self.checked_percentage(pct)
            .unwrap_or_else(|| Money::saturated(self.0, pct))
    }

    /// Like [`Money::percentage`], `None` when the result does not fit.
    pub fn checked_percentage(&self, pct: Decimal) -> Option<Money> {
        self.0
            .checked_mul(pct)
            .and_then(|scaled| scaled.checked_div(Decimal::ONE_HUNDRED))
            // 100% of a huge amount overflows only in the intermediate product
            .or_else(|| (self.0 / Decimal::ONE_HUNDRED).checked_mul(pct))
            .map(Money)
    }

    /// Calculates tax on this amount at full precision.
    ///
    /// ## Example
    /// ```rust
    /// use procura_core::money::Money;
    /// use procura_core::types::TaxRate;
    /// use rust_decimal::Decimal;
    ///
    /// let net = Money::new(Decimal::from(1650));
    /// let tax = net.calculate_tax(TaxRate::from_percent(Decimal::from(7)));
    /// assert_eq!(tax.amount(), Decimal::new(1155, 1)); // 115.5
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        self.percentage(rate.percent())
    }

    /// Converts this amount with an exchange rate (`self × rate`).
    ///
    /// Saturates at the `Decimal` range.
    pub fn convert(&self, rate: Decimal) -> Money {
        Money(self.0.saturating_mul(rate))
    }

    /// Like [`Money::convert`], `None` when the result does not fit.
    pub fn checked_convert(&self, rate: Decimal) -> Option<Money> {
        self.0.checked_mul(rate).map(Money)
    }

    /// Sum of two amounts, `None` on overflow.
    #[inline]
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Difference of two amounts, `None` on overflow.
    #[inline]
    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Returns the smaller of two amounts.
    #[inline]
    pub fn min(self, other: Money) -> Money {
        if other.0 < self.0 {
            other
        } else {
            self
        }
    }

    /// Returns the larger of two amounts.
    #[inline]
    pub fn max(self, other: Money) -> Money {
        if other.0 > self.0 {
            other
        } else {
            self
        }
    }

    /// The bound a product of `a` and `b` overflowed towards.
    fn saturated(a: Decimal, b: Decimal) -> Money {
        if a.is_sign_negative() != b.is_sign_negative() {
            Money(Decimal::MIN)
        } else {
            Money(Decimal::MAX)
        }
    }

    /// Rounds to [`DISPLAY_SCALE`] digits, midpoint away from zero.
    ///
    /// Only for rendering; further computation keeps the unrounded value.
    pub fn round_for_display(&self) -> Money {
        let mut rounded = self
            .0
            .round_dp_with_strategy(DISPLAY_SCALE, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(DISPLAY_SCALE);
        Money(rounded)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Renders the display-rounded value with exactly two fraction digits.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.round_for_display().0)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
