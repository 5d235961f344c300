//! # Currency Synchronizer (state machine)
//!
//! Keeps a document's exchange rate and multi-currency flag consistent with
//! its source/target currency selection.
//!
//! This module only decides WHAT should happen. Running the actual lookup
//! is the job of `procura-sync`, which hands the result back through
//! [`CurrencySync::complete_lookup`] / [`CurrencySync::fail_lookup`].
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │                  select(src == tgt)                                     │
//! │         ┌──────────────────────────────────────────┐                    │
//! │         ▼                                          │                    │
//! │  ┌───────────────┐  select(src != tgt)   ┌─────────┴──────┐             │
//! │  │ SameCurrency  │──────────────────────►│      Auto      │             │
//! │  │   rate = 1    │      RateRequest      │ lookup pending │             │
//! │  └───────────────┘                       └───┬────────▲───┘             │
//! │         ▲                        manual edit │        │ new pair        │
//! │         │                                    ▼        │ or refresh      │
//! │         │    select(src == tgt)       ┌──────────────┴─┐                │
//! │         └─────────────────────────────│     Manual     │                │
//! │                                       │ rate user-typed│                │
//! │                                       └────────────────┘                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ordering
//! Every transition bumps a generation counter. A lookup result is applied
//! only if its request carries the current generation AND the currency pair
//! still matches, so a slow earlier lookup can never overwrite a newer
//! selection or a manually typed rate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::CurrencyCode;
use crate::validation::validate_exchange_rate;

// =============================================================================
// Rate Mode
// =============================================================================

/// Where the current exchange rate comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RateMode {
    /// Source equals target; the rate is pinned to 1.
    SameCurrency,
    /// Rate is looked up automatically for the current pair.
    Auto,
    /// The user typed the rate; selection no-ops leave it alone.
    Manual,
}

// =============================================================================
// Rate Request / Application
// =============================================================================

/// A lookup the caller should run for `source → target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateRequest {
    /// Generation the request was issued at.
    pub generation: u64,
    pub source: CurrencyCode,
    pub target: CurrencyCode,
}

/// What happened to a lookup result handed back to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateApplication {
    /// The fetched rate is now the document's rate.
    Applied(Decimal),
    /// The lookup failed; the last known rate stays in place.
    Retained(Decimal),
    /// A newer selection, manual edit or refresh superseded the request.
    Superseded,
}

// =============================================================================
// Currency Sync
// =============================================================================

/// Per-document currency state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencySync {
    base_currency: CurrencyCode,
    source: CurrencyCode,
    target: CurrencyCode,
    exchange_rate: Decimal,
    multi_currency: bool,
    mode: RateMode,
    rate_resolved: bool,
    generation: u64,
}

impl CurrencySync {
    /// Initial state: both sides on `default_currency`, rate 1.
    pub fn new(base_currency: CurrencyCode, default_currency: CurrencyCode) -> Self {
        let multi_currency = default_currency != base_currency;
        CurrencySync {
            base_currency,
            source: default_currency.clone(),
            target: default_currency,
            exchange_rate: Decimal::ONE,
            multi_currency,
            mode: RateMode::SameCurrency,
            rate_resolved: true,
            generation: 0,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn base_currency(&self) -> &CurrencyCode {
        &self.base_currency
    }

    pub fn source(&self) -> &CurrencyCode {
        &self.source
    }

    pub fn target(&self) -> &CurrencyCode {
        &self.target
    }

    pub fn exchange_rate(&self) -> Decimal {
        self.exchange_rate
    }

    pub fn is_multi_currency(&self) -> bool {
        self.multi_currency
    }

    pub fn mode(&self) -> RateMode {
        self.mode
    }

    /// True once the rate reflects the current pair (pinned, fetched or typed).
    pub fn is_rate_resolved(&self) -> bool {
        self.rate_resolved
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Applies a new currency selection.
    ///
    /// ## Behavior
    /// - Same pair as before: nothing changes (a manual rate survives)
    /// - Source equals target: rate forced to 1, no lookup
    /// - Otherwise: switch to `Auto` and return the lookup to run
    pub fn select_currencies(
        &mut self,
        source: CurrencyCode,
        target: CurrencyCode,
    ) -> Option<RateRequest> {
        if source == self.source && target == self.target {
            return None;
        }

        self.source = source;
        self.target = target;
        self.generation += 1;

        if self.source == self.target {
            self.exchange_rate = Decimal::ONE;
            self.multi_currency = self.source != self.base_currency;
            self.mode = RateMode::SameCurrency;
            self.rate_resolved = true;
            return None;
        }

        self.multi_currency = true;
        self.mode = RateMode::Auto;
        self.rate_resolved = false;
        Some(self.current_request())
    }

    /// Changes only the source currency.
    pub fn set_source_currency(&mut self, source: CurrencyCode) -> Option<RateRequest> {
        let target = self.target.clone();
        self.select_currencies(source, target)
    }

    /// Changes only the target currency.
    pub fn set_target_currency(&mut self, target: CurrencyCode) -> Option<RateRequest> {
        let source = self.source.clone();
        self.select_currencies(source, target)
    }

    /// Records a rate typed in by the user.
    ///
    /// Rejected while both sides are the same currency; any lookup still
    /// in flight is superseded.
    pub fn edit_rate_manually(&mut self, rate: Decimal) -> CoreResult<()> {
        if self.mode == RateMode::SameCurrency {
            return Err(CoreError::ExchangeRateLocked {
                currency: self.source.to_string(),
            });
        }
        validate_exchange_rate(rate)?;

        self.generation += 1;
        self.exchange_rate = rate;
        self.mode = RateMode::Manual;
        self.rate_resolved = true;
        Ok(())
    }

    /// Asks for a fresh lookup of the current pair.
    ///
    /// Used to retry after a failed lookup or to drop a manual rate.
    /// Returns `None` while both sides are the same currency.
    pub fn refresh_rate(&mut self) -> Option<RateRequest> {
        if self.mode == RateMode::SameCurrency {
            return None;
        }
        self.generation += 1;
        self.mode = RateMode::Auto;
        self.rate_resolved = false;
        Some(self.current_request())
    }

    /// Hands back a successful lookup.
    pub fn complete_lookup(&mut self, request: &RateRequest, rate: Decimal) -> RateApplication {
        if !self.is_current(request) {
            return RateApplication::Superseded;
        }
        self.exchange_rate = rate;
        self.multi_currency = true;
        self.rate_resolved = true;
        RateApplication::Applied(rate)
    }

    /// Hands back a failed lookup; the previous rate stays.
    pub fn fail_lookup(&mut self, request: &RateRequest) -> RateApplication {
        if !self.is_current(request) {
            return RateApplication::Superseded;
        }
        RateApplication::Retained(self.exchange_rate)
    }

    /// Checks whether a request still matches the live selection.
    pub fn is_current(&self, request: &RateRequest) -> bool {
        self.mode == RateMode::Auto
            && request.generation == self.generation
            && request.source == self.source
            && request.target == self.target
    }

    fn current_request(&self) -> RateRequest {
        RateRequest {
            generation: self.generation,
            source: self.source.clone(),
            target: self.target.clone(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::parse(s).unwrap()
    }

    fn thb_sync() -> CurrencySync {
        CurrencySync::new(code("THB"), code("THB"))
    }

    #[test]
    fn test_initial_state() {
        let sync = thb_sync();
        assert_eq!(sync.mode(), RateMode::SameCurrency);
        assert_eq!(sync.exchange_rate(), Decimal::ONE);
        assert!(!sync.is_multi_currency());
        assert!(sync.is_rate_resolved());

        let usd = CurrencySync::new(code("THB"), code("USD"));
        assert!(usd.is_multi_currency());
        assert_eq!(usd.exchange_rate(), Decimal::ONE);
    }

    #[test]
    fn test_different_currency_issues_request() {
        let mut sync = thb_sync();
        let request = sync.set_source_currency(code("USD")).unwrap();

        assert_eq!(request.source, code("USD"));
        assert_eq!(request.target, code("THB"));
        assert_eq!(sync.mode(), RateMode::Auto);
        assert!(sync.is_multi_currency());
        assert!(!sync.is_rate_resolved());
        // Previous rate stays until the lookup lands
        assert_eq!(sync.exchange_rate(), Decimal::ONE);

        assert_eq!(
            sync.complete_lookup(&request, dec!(35.5)),
            RateApplication::Applied(dec!(35.5))
        );
        assert_eq!(sync.exchange_rate(), dec!(35.5));
        assert!(sync.is_rate_resolved());
    }

    #[test]
    fn test_same_currency_forces_rate_one() {
        let mut sync = thb_sync();
        let request = sync.set_source_currency(code("USD")).unwrap();
        sync.complete_lookup(&request, dec!(35.5));
        sync.edit_rate_manually(dec!(36)).unwrap();

        assert!(sync.set_target_currency(code("USD")).is_none());
        assert_eq!(sync.mode(), RateMode::SameCurrency);
        assert_eq!(sync.exchange_rate(), Decimal::ONE);
        // Both sides USD while the base is THB
        assert!(sync.is_multi_currency());
    }

    #[test]
    fn test_same_currency_matching_base_clears_flag() {
        let mut sync = CurrencySync::new(code("USD"), code("EUR"));
        assert!(sync.is_multi_currency());
        assert!(sync.select_currencies(code("USD"), code("USD")).is_none());
        assert!(!sync.is_multi_currency());
        assert_eq!(sync.exchange_rate(), Decimal::ONE);
    }

    #[test]
    fn test_unchanged_selection_keeps_manual_rate() {
        let mut sync = thb_sync();
        sync.set_source_currency(code("USD")).unwrap();
        sync.edit_rate_manually(dec!(34.9)).unwrap();
        assert_eq!(sync.mode(), RateMode::Manual);

        assert!(sync.select_currencies(code("USD"), code("THB")).is_none());
        assert!(sync.set_source_currency(code("usd")).is_none());
        assert_eq!(sync.mode(), RateMode::Manual);
        assert_eq!(sync.exchange_rate(), dec!(34.9));
    }

    #[test]
    fn test_pair_change_resets_manual_to_auto() {
        let mut sync = thb_sync();
        sync.set_source_currency(code("USD")).unwrap();
        sync.edit_rate_manually(dec!(34.9)).unwrap();

        let request = sync.set_source_currency(code("EUR")).unwrap();
        assert_eq!(sync.mode(), RateMode::Auto);
        assert_eq!(request.source, code("EUR"));
    }

    #[test]
    fn test_manual_edit_supersedes_inflight_lookup() {
        let mut sync = thb_sync();
        let request = sync.set_source_currency(code("USD")).unwrap();
        sync.edit_rate_manually(dec!(34.9)).unwrap();

        assert_eq!(sync.complete_lookup(&request, dec!(35.5)), RateApplication::Superseded);
        assert_eq!(sync.exchange_rate(), dec!(34.9));
    }

    #[test]
    fn test_manual_edit_rejected_when_same_currency() {
        let mut sync = thb_sync();
        let err = sync.edit_rate_manually(dec!(2)).unwrap_err();
        assert!(matches!(err, CoreError::ExchangeRateLocked { .. }));
        assert_eq!(sync.exchange_rate(), Decimal::ONE);
    }

    #[test]
    fn test_manual_edit_rejects_non_positive_rate() {
        let mut sync = thb_sync();
        sync.set_source_currency(code("USD")).unwrap();
        assert!(matches!(
            sync.edit_rate_manually(Decimal::ZERO),
            Err(CoreError::Validation(_))
        ));
        assert_eq!(sync.mode(), RateMode::Auto);
    }

    #[test]
    fn test_latest_selection_wins() {
        let mut sync = thb_sync();
        let first = sync.set_source_currency(code("USD")).unwrap();
        let second = sync.set_source_currency(code("EUR")).unwrap();

        // Second resolves first
        assert_eq!(
            sync.complete_lookup(&second, dec!(38.2)),
            RateApplication::Applied(dec!(38.2))
        );
        // Slow first lookup lands afterwards and is ignored
        assert_eq!(sync.complete_lookup(&first, dec!(35.5)), RateApplication::Superseded);
        assert_eq!(sync.exchange_rate(), dec!(38.2));
    }

    #[test]
    fn test_back_and_forth_selection_invalidates_old_request() {
        let mut sync = thb_sync();
        let first = sync.set_source_currency(code("USD")).unwrap();
        sync.set_source_currency(code("EUR")).unwrap();
        let third = sync.set_source_currency(code("USD")).unwrap();

        // Same pair as `first`, but a newer generation
        assert_eq!(sync.complete_lookup(&first, dec!(1)), RateApplication::Superseded);
        assert_eq!(
            sync.complete_lookup(&third, dec!(35.5)),
            RateApplication::Applied(dec!(35.5))
        );
    }

    #[test]
    fn test_failed_lookup_retains_rate() {
        let mut sync = thb_sync();
        let request = sync.select_currencies(code("USD"), code("EUR")).unwrap();

        assert_eq!(sync.fail_lookup(&request), RateApplication::Retained(Decimal::ONE));
        assert_eq!(sync.exchange_rate(), Decimal::ONE);
        assert!(sync.is_multi_currency());
        assert!(!sync.is_rate_resolved());
    }

    #[test]
    fn test_refresh() {
        let mut sync = thb_sync();
        assert!(sync.refresh_rate().is_none());

        let request = sync.set_source_currency(code("USD")).unwrap();
        sync.fail_lookup(&request);

        let retry = sync.refresh_rate().unwrap();
        assert!(retry.generation > request.generation);
        assert_eq!(sync.complete_lookup(&request, dec!(1)), RateApplication::Superseded);
        assert_eq!(
            sync.complete_lookup(&retry, dec!(35.5)),
            RateApplication::Applied(dec!(35.5))
        );
    }
}
