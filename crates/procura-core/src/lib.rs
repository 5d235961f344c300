//! # procura-core: Pure Document Math for Procura
//!
//! This crate holds the calculation logic shared by every purchasing
//! document form (PR, RFQ, QT, QC, PO, GRN) as pure functions with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Procura Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Web front-end                                │   │
//! │  │    PR Form ──► RFQ Form ──► QT / QC ──► PO Form ──► GRN         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ field edits                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 procura-sync (DocumentSession)                  │   │
//! │  │    exchange-rate lookups, timeouts, disposal                    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ procura-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌──────────────┐   │   │
//! │  │   │ discount │  │   line   │  │  totals  │  │   currency   │   │   │
//! │  │   │  parse   │─►│ resolve  │─►│aggregate │  │ state machine│   │   │
//! │  │   └──────────┘  └──────────┘  └──────────┘  └──────────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • PURE FUNCTIONS                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - `Money` over exact decimals
//! - [`types`] - Tax rate, currency codes, document kinds, defaults
//! - [`discount`] - Lenient discount token parsing
//! - [`line`] - Line Calculator
//! - [`totals`] - Document Aggregator
//! - [`currency`] - Currency Synchronizer state machine
//! - [`document`] - The `Document` aggregate tying it all together
//! - [`validation`] - Submission-level checks
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use procura_core::line::resolve_line;
//! use rust_decimal::Decimal;
//!
//! let line = resolve_line(Decimal::from(10), Decimal::from(100), "10%");
//! assert_eq!(line.resolved_discount.amount(), Decimal::from(100));
//! assert_eq!(line.line_amount.amount(), Decimal::from(900));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod currency;
pub mod discount;
pub mod document;
pub mod error;
pub mod line;
pub mod money;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use currency::{CurrencySync, RateApplication, RateMode, RateRequest};
pub use discount::DiscountInput;
pub use document::{Document, DocumentSnapshot, LineDraft};
pub use error::{CoreError, CoreResult, ValidationError};
pub use line::{resolve_line, DocumentLine, LineId, LineResolution};
pub use money::Money;
pub use totals::{aggregate, try_aggregate, DocumentTotals};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Base reporting currency used when nothing else is configured.
pub const DEFAULT_BASE_CURRENCY: &str = "THB";

/// Standard VAT rate applied to new documents, in percent.
pub const DEFAULT_TAX_RATE_PERCENT: u32 = 7;

/// Maximum number of lines on a single document.
///
/// Forms carry tens of lines; this only stops runaway imports.
pub const MAX_DOCUMENT_LINES: usize = 500;
