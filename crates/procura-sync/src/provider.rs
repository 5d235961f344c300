//! # Exchange Rate Providers
//!
//! Where a document's exchange rate comes from when the user has not typed
//! one in.
//!
//! ## Providers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    ExchangeRateProvider (trait)                         │
//! │                                                                         │
//! │  ┌───────────────────────────┐      ┌───────────────────────────────┐  │
//! │  │    FixedRateProvider      │      │      HttpRateProvider         │  │
//! │  │                           │      │                               │  │
//! │  │  "USD/THB" = 35.50        │      │  GET {base}/exchange-rates    │  │
//! │  │  inverse pair = 1 / rate  │      │      ?from=USD&to=THB         │  │
//! │  │  identity pair = 1        │      │  → { "rate": 35.50 }          │  │
//! │  │                           │      │                               │  │
//! │  │  demos, tests, offline    │      │  finance service              │  │
//! │  └───────────────────────────┘      └───────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A provider only answers "what is the rate for this pair". Ordering,
//! timeouts and disposal belong to [`crate::session`].

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use procura_core::CurrencyCode;

use crate::error::{SyncError, SyncResult};

/// Separator between the two codes of a table key ("USD/THB").
pub const PAIR_SEPARATOR: char = '/';

// =============================================================================
// Provider Trait
// =============================================================================

/// Looks up the exchange rate for a currency pair.
///
/// The returned rate converts one unit of `source` into `target`.
#[async_trait]
pub trait ExchangeRateProvider: Send + Sync {
    async fn fetch_exchange_rate(
        &self,
        source: &CurrencyCode,
        target: &CurrencyCode,
    ) -> SyncResult<Decimal>;
}

fn pair_key(source: &CurrencyCode, target: &CurrencyCode) -> String {
    format!("{}{}{}", source, PAIR_SEPARATOR, target)
}

fn not_found(source: &CurrencyCode, target: &CurrencyCode) -> SyncError {
    SyncError::RateNotFound {
        source_currency: source.to_string(),
        target_currency: target.to_string(),
    }
}

// =============================================================================
// Fixed Rate Provider
// =============================================================================

/// In-memory rate table.
#[derive(Debug, Clone, Default)]
pub struct FixedRateProvider {
    rates: HashMap<String, Decimal>,
}

impl FixedRateProvider {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rate, builder style.
    pub fn with_rate(mut self, source: &CurrencyCode, target: &CurrencyCode, rate: Decimal) -> Self {
        self.insert(source, target, rate);
        self
    }

    pub fn insert(&mut self, source: &CurrencyCode, target: &CurrencyCode, rate: Decimal) {
        self.rates.insert(pair_key(source, target), rate);
    }

    /// Builds a table from `"SRC/TGT" → rate` entries, as found in the
    /// `[rates.fixed]` config section.
    ///
    /// ## Errors
    /// - `InvalidConfig` for a malformed key or a non-positive rate
    pub fn from_table(table: &HashMap<String, Decimal>) -> SyncResult<Self> {
        let mut provider = Self::new();

        for (key, rate) in table {
            let (source, target) = key.split_once(PAIR_SEPARATOR).ok_or_else(|| {
                SyncError::InvalidConfig(format!(
                    "Rate key '{}' must look like SRC{}TGT",
                    key, PAIR_SEPARATOR
                ))
            })?;
            let source = CurrencyCode::parse(source)
                .map_err(|e| SyncError::InvalidConfig(format!("Rate key '{}': {}", key, e)))?;
            let target = CurrencyCode::parse(target)
                .map_err(|e| SyncError::InvalidConfig(format!("Rate key '{}': {}", key, e)))?;

            if *rate <= Decimal::ZERO {
                return Err(SyncError::InvalidConfig(format!(
                    "Rate for '{}' must be positive",
                    key
                )));
            }
            provider.insert(&source, &target, *rate);
        }

        Ok(provider)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

#[async_trait]
impl ExchangeRateProvider for FixedRateProvider {
    async fn fetch_exchange_rate(
        &self,
        source: &CurrencyCode,
        target: &CurrencyCode,
    ) -> SyncResult<Decimal> {
        if source == target {
            return Ok(Decimal::ONE);
        }

        if let Some(rate) = self.rates.get(&pair_key(source, target)) {
            return Ok(*rate);
        }

        // Fall back to the inverse pair
        match self.rates.get(&pair_key(target, source)) {
            Some(inverse) if !inverse.is_zero() => {
                debug!(%source, %target, "Using inverse of stored rate");
                Ok(Decimal::ONE / *inverse)
            }
            _ => Err(not_found(source, target)),
        }
    }
}

// =============================================================================
// HTTP Rate Provider
// =============================================================================

/// Body returned by the rates endpoint.
#[derive(Debug, Deserialize)]
struct RateResponse {
    rate: Option<serde_json::Value>,
}

/// Fetches rates from the finance service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRateProvider {
    client: Client,
    base_url: String,
}

impl HttpRateProvider {
    /// Creates a provider for `base_url` (e.g. `http://localhost:8080/api`).
    ///
    /// `timeout` bounds each request on the client side as well; the
    /// session applies its own lookup timeout on top.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> SyncResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::InvalidConfig(format!("HTTP client: {}", e)))?;

        Ok(HttpRateProvider {
            client,
            base_url: base_url.into(),
        })
    }

    /// Full URL of the rates endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}/exchange-rates", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ExchangeRateProvider for HttpRateProvider {
    async fn fetch_exchange_rate(
        &self,
        source: &CurrencyCode,
        target: &CurrencyCode,
    ) -> SyncResult<Decimal> {
        if source == target {
            return Ok(Decimal::ONE);
        }

        let response = self
            .client
            .get(self.endpoint())
            .query(&[("from", source.as_str()), ("to", target.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(not_found(source, target));
        }
        if !status.is_success() {
            return Err(SyncError::LookupFailed(format!(
                "Rate service returned {}",
                status
            )));
        }

        let body = response.text().await?;
        parse_rate_response(&body)
    }
}

/// Extracts the rate from a `{ "rate": ... }` body.
///
/// The rate may be a JSON number or a decimal string; it must be positive.
pub fn parse_rate_response(body: &str) -> SyncResult<Decimal> {
    let response: RateResponse = serde_json::from_str(body)?;

    let rate = match response.rate {
        Some(serde_json::Value::Number(n)) => Decimal::from_str(&n.to_string()).ok(),
        Some(serde_json::Value::String(s)) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
    .ok_or_else(|| SyncError::InvalidResponse("missing or non-numeric 'rate'".to_string()))?;

    if rate <= Decimal::ZERO {
        return Err(SyncError::InvalidResponse(format!(
            "rate must be positive, got {}",
            rate
        )));
    }

    Ok(rate)
}

// =============================================================================
// Unit Tests
// =============================================================================
