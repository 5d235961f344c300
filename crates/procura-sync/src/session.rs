//! # Document Session
//!
//! Owns one [`Document`] for as long as its form is open and runs the
//! exchange-rate lookups its currency state machine asks for.
//!
//! ## Lookup Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  select_currencies(USD, THB)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CurrencySync ──► RateRequest { generation: 4, USD → THB }              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  tokio::spawn ─► timeout(5s, provider.fetch_exchange_rate)              │
//! │                         │                                               │
//! │          ┌──────────────┼──────────────┬─────────────────┐              │
//! │          ▼              ▼              ▼                 ▼              │
//! │      Ok(rate)        Err(e)         elapsed        session closed       │
//! │          │              │              │                 │              │
//! │          ▼              └──────┬───────┘                 ▼              │
//! │  complete_rate_lookup   fail_rate_lookup            no write           │
//! │   (generation 4 still    (last rate kept,           (Cancelled)         │
//! │    current? else         warn! logged)                                  │
//! │    Superseded)                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Locking
//! The document sits behind a `std::sync::Mutex`. Every critical section is
//! synchronous; the lock is taken only after the provider future resolves.

use rust_decimal::Decimal;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, warn};

use procura_core::{
    CoreResult, CurrencyCode, Document, DocumentKind, DocumentSnapshot, DocumentTotals,
    RateApplication, RateRequest,
};

use crate::config::EngineConfig;
use crate::error::{SyncError, SyncResult};
use crate::provider::ExchangeRateProvider;

// =============================================================================
// Lookup Outcome
// =============================================================================

/// How a spawned lookup ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    /// The fetched rate became the document's rate.
    Applied(Decimal),

    /// The lookup failed or timed out; the last rate was kept.
    Retained(Decimal),

    /// A newer selection or a manual edit made the result stale.
    Superseded,

    /// The session was closed before the result could be written.
    Cancelled,
}

/// Handle to a spawned lookup.
///
/// Dropping the handle does not cancel the lookup.
#[derive(Debug)]
pub struct LookupHandle {
    request: RateRequest,
    join: JoinHandle<LookupOutcome>,
}

impl LookupHandle {
    /// The request this lookup serves.
    pub fn request(&self) -> &RateRequest {
        &self.request
    }

    /// Waits for the lookup to finish.
    pub async fn wait(self) -> LookupOutcome {
        match self.join.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => LookupOutcome::Cancelled,
        }
    }
}

// =============================================================================
// Session State
// =============================================================================

struct SessionState {
    document: Document,
    closed: bool,
    in_flight: Vec<AbortHandle>,
}

type SharedState = Arc<Mutex<SessionState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Document Session
// =============================================================================

/// An open document plus the machinery to keep its exchange rate current.
///
/// Methods that may start a lookup must be called from within a Tokio
/// runtime.
pub struct DocumentSession {
    state: SharedState,
    provider: Arc<dyn ExchangeRateProvider>,
    lookup_timeout: Duration,
}

impl DocumentSession {
    /// Wraps an existing document.
    pub fn new(
        document: Document,
        provider: Arc<dyn ExchangeRateProvider>,
        lookup_timeout: Duration,
    ) -> Self {
        DocumentSession {
            state: Arc::new(Mutex::new(SessionState {
                document,
                closed: false,
                in_flight: Vec::new(),
            })),
            provider,
            lookup_timeout,
        }
    }

    /// Opens a fresh document of `kind` with one empty line, using the
    /// configured defaults and rate provider.
    pub fn open(kind: DocumentKind, config: &EngineConfig) -> SyncResult<Self> {
        let document = Document::new_with_line(kind, &config.document_defaults());
        let provider = config.build_provider()?;
        info!(kind = %kind, id = %document.id(), "Document session opened");
        Ok(Self::new(document, provider, config.lookup_timeout()))
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Runs `f` against the document. Still allowed after [`close`](Self::close).
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Document) -> R,
    {
        let state = lock(&self.state);
        f(&state.document)
    }

    pub fn totals(&self) -> DocumentTotals {
        self.read(|doc| doc.totals())
    }

    pub fn exchange_rate(&self) -> Decimal {
        self.read(|doc| doc.exchange_rate())
    }

    pub fn snapshot(&self) -> DocumentSnapshot {
        self.read(|doc| doc.snapshot())
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.state).closed
    }

    // =========================================================================
    // Edits
    // =========================================================================

    /// Applies a line, discount or tax edit.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// session.edit(|doc| doc.set_quantity(&line_id, Decimal::from(10)))?;
    /// ```
    pub fn edit<F, R>(&self, f: F) -> SyncResult<R>
    where
        F: FnOnce(&mut Document) -> CoreResult<R>,
    {
        let mut state = lock(&self.state);
        if state.closed {
            return Err(SyncError::SessionClosed);
        }
        Ok(f(&mut state.document)?)
    }

    /// Applies a manually typed exchange rate.
    pub fn edit_exchange_rate(&self, rate: Decimal) -> SyncResult<()> {
        self.edit(|doc| doc.edit_exchange_rate(rate))?;
        debug!(%rate, "Exchange rate edited manually");
        Ok(())
    }

    // =========================================================================
    // Currency Selection
    // =========================================================================

    /// Selects both currencies; starts a lookup when they differ.
    pub fn select_currencies(
        &self,
        source: CurrencyCode,
        target: CurrencyCode,
    ) -> SyncResult<Option<LookupHandle>> {
        self.transition(|doc| doc.select_currencies(source, target))
    }

    pub fn set_source_currency(&self, source: CurrencyCode) -> SyncResult<Option<LookupHandle>> {
        self.transition(|doc| doc.set_source_currency(source))
    }

    pub fn set_target_currency(&self, target: CurrencyCode) -> SyncResult<Option<LookupHandle>> {
        self.transition(|doc| doc.set_target_currency(target))
    }

    /// Looks the current pair up again (after a failure, or to drop a
    /// manual rate).
    pub fn refresh_exchange_rate(&self) -> SyncResult<Option<LookupHandle>> {
        self.transition(|doc| doc.refresh_exchange_rate())
    }

    /// Runs a currency transition and spawns the lookup it asks for.
    fn transition<F>(&self, f: F) -> SyncResult<Option<LookupHandle>>
    where
        F: FnOnce(&mut Document) -> Option<RateRequest>,
    {
        let mut state = lock(&self.state);
        if state.closed {
            return Err(SyncError::SessionClosed);
        }

        let Some(request) = f(&mut state.document) else {
            debug!(
                source = %state.document.currency().source(),
                target = %state.document.currency().target(),
                rate = %state.document.exchange_rate(),
                "Currency selection needs no lookup"
            );
            return Ok(None);
        };

        debug!(
            generation = request.generation,
            source = %request.source,
            target = %request.target,
            "Starting exchange rate lookup"
        );

        let join = tokio::spawn(run_lookup(
            Arc::clone(&self.state),
            Arc::clone(&self.provider),
            self.lookup_timeout,
            request.clone(),
        ));

        state.in_flight.retain(|handle| !handle.is_finished());
        state.in_flight.push(join.abort_handle());

        Ok(Some(LookupHandle { request, join }))
    }

    // =========================================================================
    // Disposal
    // =========================================================================

    /// Closes the session.
    ///
    /// In-flight lookups are aborted; any that already hold a result see
    /// the closed flag and drop it. Later edits fail with `SessionClosed`.
    pub fn close(&self) {
        let mut state = lock(&self.state);
        if state.closed {
            return;
        }
        state.closed = true;

        let aborted = state.in_flight.len();
        for handle in state.in_flight.drain(..) {
            handle.abort();
        }
        info!(id = %state.document.id(), aborted, "Document session closed");
    }
}

impl Drop for DocumentSession {
    fn drop(&mut self) {
        self.close();
    }
}

// =============================================================================
// Lookup Task
// =============================================================================

/// Timeout error in whole milliseconds, saturating at `u64::MAX`.
fn timeout_error(lookup_timeout: Duration) -> SyncError {
    SyncError::Timeout(u64::try_from(lookup_timeout.as_millis()).unwrap_or(u64::MAX))
}

async fn run_lookup(
    state: SharedState,
    provider: Arc<dyn ExchangeRateProvider>,
    lookup_timeout: Duration,
    request: RateRequest,
) -> LookupOutcome {
    let fetched = tokio::time::timeout(
        lookup_timeout,
        provider.fetch_exchange_rate(&request.source, &request.target),
    )
    .await;

    let result = match fetched {
        Ok(Ok(rate)) if rate > Decimal::ZERO => Ok(rate),
        Ok(Ok(rate)) => Err(SyncError::InvalidResponse(format!(
            "rate must be positive, got {}",
            rate
        ))),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(timeout_error(lookup_timeout)),
    };

    let mut guard = lock(&state);
    if guard.closed {
        debug!(generation = request.generation, "Lookup finished after close, dropped");
        return LookupOutcome::Cancelled;
    }

    let application = match result {
        Ok(rate) => guard.document.complete_rate_lookup(&request, rate),
        Err(e) => {
            warn!(
                source = %request.source,
                target = %request.target,
                retryable = e.is_retryable(),
                "Exchange rate lookup failed: {}",
                e
            );
            guard.document.fail_rate_lookup(&request)
        }
    };

    match application {
        RateApplication::Applied(rate) => {
            debug!(generation = request.generation, %rate, "Exchange rate applied");
            LookupOutcome::Applied(rate)
        }
        RateApplication::Retained(rate) => LookupOutcome::Retained(rate),
        RateApplication::Superseded => {
            debug!(generation = request.generation, "Stale lookup result ignored");
            LookupOutcome::Superseded
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
