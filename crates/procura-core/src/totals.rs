//! # Document Aggregator
//!
//! Rolls line amounts, the document discount and tax into a grand total.
//!
//! ## Computation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Σ line amounts                       = subtotal                        │
//! │  subtotal − document discount         = amount after discount           │
//! │  amount after discount × rate / 100   = tax amount                      │
//! │  amount after discount + tax amount   = grand total                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The document discount is deliberately not clamped against the subtotal:
//! line discounts are, document discounts are not, and a negative amount
//! after discount is passed through as-is.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::TaxRate;

/// Derived totals of a document, full precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTotals {
    pub subtotal: Money,
    pub amount_after_discount: Money,
    pub tax_amount: Money,
    pub grand_total: Money,
}

impl DocumentTotals {
    /// Returns a copy rounded to two fraction digits for display.
    ///
    /// Each figure is rounded on its own; the rounded figures are not
    /// recomputed from one another.
    pub fn rounded(&self) -> DocumentTotals {
        DocumentTotals {
            subtotal: self.subtotal.round_for_display(),
            amount_after_discount: self.amount_after_discount.round_for_display(),
            tax_amount: self.tax_amount.round_for_display(),
            grand_total: self.grand_total.round_for_display(),
        }
    }

    /// Expresses every figure in the target currency.
    ///
    /// ## Example
    /// ```rust
    /// use procura_core::{aggregate, Money, TaxRate};
    /// use rust_decimal::Decimal;
    ///
    /// let totals = aggregate([Money::new(Decimal::from(100))], Money::zero(), TaxRate::zero());
    /// let thb = totals.converted(Decimal::new(355, 1)); // 35.5 THB per USD
    /// assert_eq!(thb.grand_total.amount(), Decimal::from(3550));
    /// ```
    pub fn converted(&self, exchange_rate: Decimal) -> DocumentTotals {
        DocumentTotals {
            subtotal: self.subtotal.convert(exchange_rate),
            amount_after_discount: self.amount_after_discount.convert(exchange_rate),
            tax_amount: self.tax_amount.convert(exchange_rate),
            grand_total: self.grand_total.convert(exchange_rate),
        }
    }

    /// Like [`DocumentTotals::converted`], `None` if any figure overflows.
    pub fn checked_converted(&self, exchange_rate: Decimal) -> Option<DocumentTotals> {
        Some(DocumentTotals {
            subtotal: self.subtotal.checked_convert(exchange_rate)?,
            amount_after_discount: self.amount_after_discount.checked_convert(exchange_rate)?,
            tax_amount: self.tax_amount.checked_convert(exchange_rate)?,
            grand_total: self.grand_total.checked_convert(exchange_rate)?,
        })
    }
}

/// Aggregates resolved line amounts into document totals.
///
/// Pure and O(n); callers re-run it after every line, discount or tax
/// rate change. Figures saturate at the `Decimal` range; use
/// [`try_aggregate`] to detect that.
///
/// ## Example
/// ```rust
/// use procura_core::{aggregate, Money, TaxRate};
/// use rust_decimal::Decimal;
///
/// let lines = [Money::new(Decimal::from(900)), Money::new(Decimal::from(750))];
/// let totals = aggregate(lines, Money::zero(), TaxRate::from_percent(Decimal::from(7)));
/// assert_eq!(totals.tax_amount.amount(), Decimal::new(1155, 1));
/// assert_eq!(totals.grand_total.to_string(), "1765.50");
/// ```
pub fn aggregate<I>(line_amounts: I, document_discount: Money, tax_rate: TaxRate) -> DocumentTotals
where
    I: IntoIterator<Item = Money>,
{
    let subtotal: Money = line_amounts.into_iter().sum();
    let amount_after_discount = subtotal - document_discount;
    let tax_amount = amount_after_discount.calculate_tax(tax_rate);

    DocumentTotals {
        subtotal,
        amount_after_discount,
        tax_amount,
        grand_total: amount_after_discount + tax_amount,
    }
}

/// Like [`aggregate`], `None` when a figure does not fit in a `Decimal`.
pub fn try_aggregate<I>(
    line_amounts: I,
    document_discount: Money,
    tax_rate: TaxRate,
) -> Option<DocumentTotals>
where
    I: IntoIterator<Item = Money>,
{
    let subtotal = line_amounts
        .into_iter()
        .try_fold(Money::zero(), Money::checked_add)?;
    let amount_after_discount = subtotal.checked_sub(document_discount)?;
    let tax_amount = amount_after_discount.checked_percentage(tax_rate.percent())?;

    Some(DocumentTotals {
        subtotal,
        amount_after_discount,
        tax_amount,
        grand_total: amount_after_discount.checked_add(tax_amount)?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn money(d: Decimal) -> Money {
        Money::new(d)
    }

    #[test]
    fn test_two_lines_with_vat() {
        let totals = aggregate(
            [money(dec!(900)), money(dec!(750))],
            Money::zero(),
            TaxRate::from_percent(dec!(7)),
        );
        assert_eq!(totals.subtotal.amount(), dec!(1650));
        assert_eq!(totals.amount_after_discount.amount(), dec!(1650));
        assert_eq!(totals.tax_amount.amount(), dec!(115.5));
        assert_eq!(totals.grand_total.amount(), dec!(1765.5));
    }

    #[test]
    fn test_document_discount_applied_before_tax() {
        let totals = aggregate(
            [money(dec!(1000))],
            money(dec!(100)),
            TaxRate::from_percent(dec!(7)),
        );
        assert_eq!(totals.amount_after_discount.amount(), dec!(900));
        assert_eq!(totals.tax_amount.amount(), dec!(63));
        assert_eq!(totals.grand_total.amount(), dec!(963));
    }

    #[test]
    fn test_document_discount_not_clamped() {
        let totals = aggregate(
            [money(dec!(50))],
            money(dec!(80)),
            TaxRate::from_percent(dec!(10)),
        );
        assert_eq!(totals.amount_after_discount.amount(), dec!(-30));
        assert_eq!(totals.tax_amount.amount(), dec!(-3));
        assert_eq!(totals.grand_total.amount(), dec!(-33));
    }

    #[test]
    fn test_empty_document() {
        let totals = aggregate(Vec::new(), Money::zero(), TaxRate::from_percent(dec!(7)));
        assert_eq!(totals, DocumentTotals::default());

        let totals = aggregate(Vec::new(), money(dec!(100)), TaxRate::from_percent(dec!(7)));
        assert!(totals.subtotal.is_zero());
        assert_eq!(totals.grand_total.amount(), dec!(-107));
    }

    #[test]
    fn test_rounded_for_display() {
        let totals = aggregate(
            [money(dec!(10.005))],
            Money::zero(),
            TaxRate::from_percent(dec!(7)),
        );
        // 10.005 × 7% = 0.70035
        assert_eq!(totals.tax_amount.amount(), dec!(0.70035));

        let rounded = totals.rounded();
        assert_eq!(rounded.subtotal.to_string(), "10.01");
        assert_eq!(rounded.tax_amount.to_string(), "0.70");
        assert_eq!(rounded.grand_total.to_string(), "10.71");
        // Internal value untouched
        assert_eq!(totals.grand_total.amount(), dec!(10.70535));
    }

    #[test]
    fn test_converted() {
        let totals = aggregate([money(dec!(200))], money(dec!(20)), TaxRate::zero());
        let converted = totals.converted(dec!(0.5));
        assert_eq!(converted.subtotal.amount(), dec!(100));
        assert_eq!(converted.grand_total.amount(), dec!(90));
    }

    #[test]
    fn test_try_aggregate_matches_aggregate() {
        let lines = [money(dec!(900)), money(dec!(750))];
        let rate = TaxRate::from_percent(dec!(7));
        assert_eq!(
            try_aggregate(lines, money(dec!(50)), rate),
            Some(aggregate(lines, money(dec!(50)), rate))
        );
    }

    #[test]
    fn test_overflowing_totals() {
        let huge = money(Decimal::MAX);
        let rate = TaxRate::from_percent(dec!(7));

        assert!(try_aggregate([huge, huge], Money::zero(), rate).is_none());
        // Tax on top of the largest subtotal no longer fits
        assert!(try_aggregate([huge], Money::zero(), rate).is_none());

        let totals = aggregate([huge, huge], Money::zero(), rate);
        assert_eq!(totals.subtotal.amount(), Decimal::MAX);
        assert_eq!(totals.grand_total.amount(), Decimal::MAX);

        assert!(totals.checked_converted(dec!(2)).is_none());
        assert_eq!(totals.converted(dec!(2)).grand_total.amount(), Decimal::MAX);
    }

    fn amount() -> impl Strategy<Value = Decimal> {
        (0i64..100_000_000, 0u32..3).prop_map(|(n, scale)| Decimal::new(n, scale))
    }

    proptest! {
        #[test]
        fn prop_empty_lines(discount in amount(), rate in 0u32..100) {
            let rate = Decimal::from(rate);
            let totals = aggregate(Vec::new(), money(discount), TaxRate::from_percent(rate));
            prop_assert!(totals.subtotal.is_zero());
            let expected = (Decimal::ZERO - discount) * (Decimal::ONE + rate / Decimal::ONE_HUNDRED);
            prop_assert_eq!(totals.grand_total.amount(), expected);
        }

        #[test]
        fn prop_aggregate_is_idempotent(
            lines in proptest::collection::vec(amount(), 0..20),
            discount in amount(),
            rate in 0u32..30,
        ) {
            let rate = TaxRate::from_percent(Decimal::from(rate));
            let first = aggregate(lines.iter().copied().map(money), money(discount), rate);
            let second = aggregate(lines.iter().copied().map(money), money(discount), rate);
            prop_assert_eq!(first, second);
        }
    }
}
