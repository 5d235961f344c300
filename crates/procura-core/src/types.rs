//! # Domain Types
//!
//! Small value types shared by the calculators.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TaxRate      │   │  CurrencyCode   │   │  DocumentKind   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  percent        │   │  "THB", "USD"   │   │  PR, RFQ, QT,   │       │
//! │  │  7 = 7%         │   │  upper-cased    │   │  QC, PO, GRN    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │ DocumentDefaults                        │                           │
//! │  │ base currency, default currency, tax    │                           │
//! │  └─────────────────────────────────────────┘                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::validation::{validate_currency_code, ValidationResult};
use crate::{DEFAULT_BASE_CURRENCY, DEFAULT_TAX_RATE_PERCENT};

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate expressed as a percentage (7 = 7%).
///
/// ## Why percent, not basis points?
/// The purchasing forms type the rate as a percentage and fractional
/// rates like 7.5% must stay exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(#[ts(type = "string")] Decimal);

impl TaxRate {
    /// Creates a tax rate from a percentage.
    #[inline]
    pub const fn from_percent(percent: Decimal) -> Self {
        TaxRate(percent)
    }

    /// Returns the rate as a percentage.
    #[inline]
    pub const fn percent(&self) -> Decimal {
        self.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(Decimal::ZERO)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

// =============================================================================
// Currency Code
// =============================================================================

/// A currency code as selected on a form ("THB", "USD", "EUR", ...).
///
/// Codes are free-form but normalized: surrounding whitespace is removed
/// and letters are upper-cased, so `"usd "` and `"USD"` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(try_from = "String", into = "String")]
#[ts(export)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parses and normalizes a currency code.
    ///
    /// ## Example
    /// ```rust
    /// use procura_core::types::CurrencyCode;
    ///
    /// let code = CurrencyCode::parse(" usd").unwrap();
    /// assert_eq!(code.as_str(), "USD");
    /// assert!(CurrencyCode::parse("").is_err());
    /// ```
    pub fn parse(code: &str) -> ValidationResult<Self> {
        let normalized = code.trim().to_uppercase();
        validate_currency_code(&normalized)?;
        Ok(CurrencyCode(normalized))
    }

    /// The default base reporting currency ("THB").
    pub fn base_default() -> Self {
        CurrencyCode(DEFAULT_BASE_CURRENCY.to_string())
    }

    /// Returns the normalized code.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = crate::error::ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CurrencyCode::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = crate::error::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CurrencyCode::parse(s)
    }
}

// =============================================================================
// Document Kind
// =============================================================================

/// The purchasing document a form edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// PR: the originating demand document.
    PurchaseRequisition,
    /// RFQ: sent to vendors to solicit prices.
    RequestForQuotation,
    /// QT: a vendor's price response.
    Quotation,
    /// QC: side-by-side vendor comparison.
    QuotationComparison,
    /// PO: the committed order.
    PurchaseOrder,
    /// GRN: goods received against a PO.
    GoodsReceipt,
}

impl DocumentKind {
    /// Short code used in document numbers ("PR", "RFQ", ...).
    pub fn code(&self) -> &'static str {
        match self {
            DocumentKind::PurchaseRequisition => "PR",
            DocumentKind::RequestForQuotation => "RFQ",
            DocumentKind::Quotation => "QT",
            DocumentKind::QuotationComparison => "QC",
            DocumentKind::PurchaseOrder => "PO",
            DocumentKind::GoodsReceipt => "GRN",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// =============================================================================
// Document Defaults
// =============================================================================

/// Settings a new document is opened with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentDefaults {
    /// Organization home currency that multi-currency status is judged against.
    pub base_currency: CurrencyCode,

    /// Currency pre-selected on both sides of a new document.
    pub default_currency: CurrencyCode,

    /// Tax rate pre-filled on a new document.
    pub tax_rate: TaxRate,
}

impl Default for DocumentDefaults {
    fn default() -> Self {
        DocumentDefaults {
            base_currency: CurrencyCode::base_default(),
            default_currency: CurrencyCode::base_default(),
            tax_rate: TaxRate::from_percent(Decimal::from(DEFAULT_TAX_RATE_PERCENT)),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
