//! # Document Aggregate
//!
//! One purchasing document as it is being edited on a form: lines,
//! document-level discount and tax, currency state, and the totals
//! derived from them.
//!
//! ## Recalculation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  field edit (qty, price, discount, tax, document discount)              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  resolve_line(touched line)    ← Line Calculator                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  aggregate(all line amounts)   ← Document Aggregator                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  cached DocumentTotals         ← read by the form and by snapshot()     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every mutating method ends with a recompute, so the cached totals are
//! never observed out of step with the lines.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::currency::{CurrencySync, RateApplication, RateRequest};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::line::{DocumentLine, LineId};
use crate::money::Money;
use crate::totals::{aggregate, try_aggregate, DocumentTotals};
use crate::types::{CurrencyCode, DocumentDefaults, DocumentKind, TaxRate};
use crate::validation::{
    validate_document_discount, validate_line_count, validate_quantity, validate_tax_rate,
    validate_unit_price,
};
use crate::MAX_DOCUMENT_LINES;

// =============================================================================
// Line Draft
// =============================================================================

/// Raw inputs for a line added in one go (copying lines from a PR into an
/// RFQ, importing a quotation).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineDraft {
    pub description: Option<String>,
    pub unit: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub discount_input: String,
}

// =============================================================================
// Document
// =============================================================================

/// A purchasing document being edited.
///
/// ## Invariants
/// - `totals` always equals `aggregate` over the current lines
/// - Every line's `discount` and `amount` match its raw inputs
/// - At most `MAX_DOCUMENT_LINES` lines
/// - Every figure fits in a `Decimal`; edits that would overflow are refused
///
/// Serialize-only: a document is rebuilt through its own methods, never
/// from stored totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    id: String,
    kind: DocumentKind,
    created_at: DateTime<Utc>,
    lines: Vec<DocumentLine>,
    document_discount: Money,
    tax_rate: TaxRate,
    currency: CurrencySync,
    totals: DocumentTotals,
}

impl Document {
    /// Creates an empty document.
    pub fn new(kind: DocumentKind, defaults: &DocumentDefaults) -> Self {
        Document {
            id: Uuid::new_v4().to_string(),
            kind,
            created_at: Utc::now(),
            lines: Vec::new(),
            document_discount: Money::zero(),
            tax_rate: defaults.tax_rate,
            currency: CurrencySync::new(
                defaults.base_currency.clone(),
                defaults.default_currency.clone(),
            ),
            totals: DocumentTotals::default(),
        }
    }

    /// Creates a document with one empty line, as a new form opens.
    pub fn new_with_line(kind: DocumentKind, defaults: &DocumentDefaults) -> Self {
        let mut document = Document::new(kind, defaults);
        document.lines.push(DocumentLine::new());
        document.recompute();
        document
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn lines(&self) -> &[DocumentLine] {
        &self.lines
    }

    /// Looks up a line by id.
    pub fn line(&self, id: &str) -> Option<&DocumentLine> {
        self.lines.iter().find(|l| l.id == id)
    }

    pub fn document_discount(&self) -> Money {
        self.document_discount
    }

    pub fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    /// Current totals at full precision.
    pub fn totals(&self) -> DocumentTotals {
        self.totals
    }

    pub fn currency(&self) -> &CurrencySync {
        &self.currency
    }

    pub fn exchange_rate(&self) -> Decimal {
        self.currency.exchange_rate()
    }

    pub fn is_multi_currency(&self) -> bool {
        self.currency.is_multi_currency()
    }

    // =========================================================================
    // Lines
    // =========================================================================

    /// Appends an empty line and returns its id.
    pub fn add_line(&mut self) -> CoreResult<LineId> {
        self.add_line_with(LineDraft::default())
    }

    /// Appends a line built from raw inputs and returns its id.
    ///
    /// ## Errors
    /// - `TooManyLines` when the document is full
    /// - `Validation` for a negative quantity or price, or a line whose
    ///   figures do not fit in a `Decimal`
    pub fn add_line_with(&mut self, draft: LineDraft) -> CoreResult<LineId> {
        if validate_line_count(self.lines.len()).is_err() {
            return Err(CoreError::TooManyLines {
                max: MAX_DOCUMENT_LINES,
            });
        }
        validate_quantity(draft.quantity)?;
        validate_unit_price(draft.unit_price)?;
        check_gross(draft.quantity, draft.unit_price)?;

        let mut line = DocumentLine::new();
        line.description = draft.description;
        line.unit = draft.unit;
        line.quantity = draft.quantity;
        line.unit_price = draft.unit_price;
        line.discount_input = draft.discount_input;
        line.resolve();

        let amounts = self.lines.iter().map(|l| l.amount).chain(std::iter::once(line.amount));
        let totals = totals_for(amounts, self.document_discount, self.tax_rate)?;

        let id = line.id.clone();
        self.lines.push(line);
        self.totals = totals;
        Ok(id)
    }

    /// Removes a line.
    ///
    /// Keeping at least one row on screen is left to the form.
    pub fn remove_line(&mut self, id: &str) -> CoreResult<DocumentLine> {
        let index = self
            .lines
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| CoreError::LineNotFound(id.to_string()))?;

        let removed = self.lines.remove(index);
        self.recompute();
        Ok(removed)
    }

    /// Sets a line's quantity.
    pub fn set_quantity(&mut self, id: &str, quantity: Decimal) -> CoreResult<()> {
        validate_quantity(quantity)?;
        self.update_line(id, |line| line.quantity = quantity)
    }

    /// Sets a line's unit price.
    pub fn set_unit_price(&mut self, id: &str, unit_price: Decimal) -> CoreResult<()> {
        validate_unit_price(unit_price)?;
        self.update_line(id, |line| line.unit_price = unit_price)
    }

    /// Stores the discount text exactly as typed.
    ///
    /// Never fails on content: an unreadable token counts as no discount.
    pub fn set_discount_input(&mut self, id: &str, raw: &str) -> CoreResult<()> {
        self.update_line(id, |line| line.discount_input = raw.to_string())
    }

    pub fn set_description(&mut self, id: &str, description: Option<String>) -> CoreResult<()> {
        self.line_mut(id)?.description = description;
        Ok(())
    }

    pub fn set_unit(&mut self, id: &str, unit: Option<String>) -> CoreResult<()> {
        self.line_mut(id)?.unit = unit;
        Ok(())
    }

    // =========================================================================
    // Document-Level Inputs
    // =========================================================================

    /// Sets the flat document discount.
    ///
    /// Not clamped to the subtotal; see `validate_for_submission`.
    pub fn set_document_discount(&mut self, discount: Money) -> CoreResult<()> {
        validate_document_discount(discount.amount())?;
        let amounts = self.lines.iter().map(|l| l.amount);
        self.totals = totals_for(amounts, discount, self.tax_rate)?;
        self.document_discount = discount;
        Ok(())
    }

    /// Sets the tax rate (percent, 0-100).
    pub fn set_tax_rate(&mut self, rate: TaxRate) -> CoreResult<()> {
        validate_tax_rate(rate.percent())?;
        let amounts = self.lines.iter().map(|l| l.amount);
        self.totals = totals_for(amounts, self.document_discount, rate)?;
        self.tax_rate = rate;
        Ok(())
    }

    // =========================================================================
    // Currency
    // =========================================================================

    /// Selects both currencies at once. See [`CurrencySync::select_currencies`].
    pub fn select_currencies(
        &mut self,
        source: CurrencyCode,
        target: CurrencyCode,
    ) -> Option<RateRequest> {
        self.currency.select_currencies(source, target)
    }

    pub fn set_source_currency(&mut self, source: CurrencyCode) -> Option<RateRequest> {
        self.currency.set_source_currency(source)
    }

    pub fn set_target_currency(&mut self, target: CurrencyCode) -> Option<RateRequest> {
        self.currency.set_target_currency(target)
    }

    /// Applies a rate typed by the user.
    pub fn edit_exchange_rate(&mut self, rate: Decimal) -> CoreResult<()> {
        self.currency.edit_rate_manually(rate)
    }

    pub fn refresh_exchange_rate(&mut self) -> Option<RateRequest> {
        self.currency.refresh_rate()
    }

    pub fn complete_rate_lookup(&mut self, request: &RateRequest, rate: Decimal) -> RateApplication {
        self.currency.complete_lookup(request, rate)
    }

    pub fn fail_rate_lookup(&mut self, request: &RateRequest) -> RateApplication {
        self.currency.fail_lookup(request)
    }

    // =========================================================================
    // Snapshot
    // =========================================================================

    /// Builds the payload handed to the submission service.
    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            id: self.id.clone(),
            kind: self.kind,
            created_at: self.created_at,
            lines: self.lines.clone(),
            document_discount: self.document_discount,
            tax_rate: self.tax_rate,
            subtotal: self.totals.subtotal,
            amount_after_discount: self.totals.amount_after_discount,
            tax_amount: self.totals.tax_amount,
            grand_total: self.totals.grand_total,
            exchange_rate: self.currency.exchange_rate(),
            multi_currency: self.currency.is_multi_currency(),
            source_currency: self.currency.source().clone(),
            target_currency: self.currency.target().clone(),
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn line_mut(&mut self, id: &str) -> CoreResult<&mut DocumentLine> {
        self.lines
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| CoreError::LineNotFound(id.to_string()))
    }

    /// Applies `f` to a copy of the line and commits it only if the line
    /// and the document totals still fit.
    fn update_line<F>(&mut self, id: &str, f: F) -> CoreResult<()>
    where
        F: FnOnce(&mut DocumentLine),
    {
        let index = self
            .lines
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| CoreError::LineNotFound(id.to_string()))?;

        let mut line = self.lines[index].clone();
        f(&mut line);
        check_gross(line.quantity, line.unit_price)?;
        line.resolve();

        let amounts = self
            .lines
            .iter()
            .enumerate()
            .map(|(i, l)| if i == index { line.amount } else { l.amount });
        let totals = totals_for(amounts, self.document_discount, self.tax_rate)?;

        self.lines[index] = line;
        self.totals = totals;
        Ok(())
    }

    fn recompute(&mut self) {
        self.totals = aggregate(
            self.lines.iter().map(|l| l.amount),
            self.document_discount,
            self.tax_rate,
        );
    }
}

fn totals_for<I>(amounts: I, discount: Money, tax_rate: TaxRate) -> CoreResult<DocumentTotals>
where
    I: IntoIterator<Item = Money>,
{
    try_aggregate(amounts, discount, tax_rate).ok_or_else(|| out_of_range("document total"))
}

fn out_of_range(field: &str) -> CoreError {
    CoreError::Validation(ValidationError::OutOfRange {
        field: field.to_string(),
        min: Decimal::MIN.to_string(),
        max: Decimal::MAX.to_string(),
    })
}

/// Refuses a quantity and price whose product does not fit in a `Decimal`.
fn check_gross(quantity: Decimal, unit_price: Decimal) -> CoreResult<()> {
    Money::new(unit_price)
        .checked_multiply_quantity(quantity)
        .map(|_| ())
        .ok_or_else(|| out_of_range("line amount"))
}

// =============================================================================
// Snapshot
// =============================================================================

/// Document state as sent to the submission service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSnapshot {
    pub id: String,
    pub kind: DocumentKind,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    pub lines: Vec<DocumentLine>,
    pub document_discount: Money,
    pub tax_rate: TaxRate,
    pub subtotal: Money,
    pub amount_after_discount: Money,
    pub tax_amount: Money,
    pub grand_total: Money,
    #[ts(type = "string")]
    pub exchange_rate: Decimal,
    pub multi_currency: bool,
    pub source_currency: CurrencyCode,
    pub target_currency: CurrencyCode,
}

// =============================================================================
// Unit Tests
// =============================================================================
