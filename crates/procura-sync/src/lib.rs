//! # procura-sync: Currency Synchronization for Procura Documents
//!
//! This crate is the async half of the document engine. It keeps an open
//! document's exchange rate in step with its currency selection while the
//! pure math stays in `procura-core`.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Document Session Architecture                       │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                  DocumentSession (one per open form)             │  │
//! │  │                                                                  │  │
//! │  │  Owns the Document behind a mutex                                │  │
//! │  │  Spawns one Tokio task per exchange-rate lookup                  │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │ ExchangeRate-  │  │  EngineConfig  │  │  procura-core          │    │
//! │  │ Provider       │  │                │  │                        │    │
//! │  │                │  │ engine.toml    │  │ CurrencySync decides   │    │
//! │  │ fixed table or │  │ + PROCURA_*    │  │ which results apply    │    │
//! │  │ REST endpoint  │  │ env overrides  │  │                        │    │
//! │  └────────────────┘  └────────────────┘  └────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`session`] - `DocumentSession` and lookup tasks
//! - [`provider`] - Exchange-rate providers
//! - [`config`] - Engine configuration (currency, tax, rate source)
//! - [`error`] - Sync error types
//! - [`logging`] - Tracing subscriber setup
//!
//! ## Usage
//!
//! ```rust,ignore
//! use procura_core::{CurrencyCode, DocumentKind};
//! use procura_sync::{DocumentSession, EngineConfig};
//!
//! let config = EngineConfig::load_or_default(None);
//! let session = DocumentSession::open(DocumentKind::PurchaseOrder, &config)?;
//!
//! if let Some(lookup) = session.set_source_currency(CurrencyCode::parse("USD")?)? {
//!     lookup.wait().await;
//! }
//! println!("Rate: {}", session.exchange_rate());
//!
//! session.close();
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod logging;
pub mod provider;
pub mod session;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{EngineConfig, ProviderKind};
pub use error::{SyncError, SyncResult};
pub use logging::init_tracing;
pub use provider::{ExchangeRateProvider, FixedRateProvider, HttpRateProvider};
pub use session::{DocumentSession, LookupHandle, LookupOutcome};
