//! # Sync Error Types
//!
//! Error types for configuration, rate lookups and document sessions.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Rate Lookup   │  │     Session             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  RateNotFound   │  │  SessionClosed          │ │
//! │  │  ConfigLoad     │  │  LookupFailed   │  │  Core (document edits)  │ │
//! │  │  ConfigSave     │  │  Timeout, Http  │  │                         │ │
//! │  │                 │  │  InvalidResponse│  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lookup errors never reach the person editing the form. The session
//! logs them and keeps the last known rate.

use procura_core::CoreError;
use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type covering configuration, lookup and session failures.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid engine configuration.
    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Rate Lookup Errors
    // =========================================================================
    /// The provider has no rate for the pair.
    #[error("No exchange rate for {source_currency}/{target_currency}")]
    RateNotFound {
        source_currency: String,
        target_currency: String,
    },

    /// The provider answered with an error.
    #[error("Exchange rate lookup failed: {0}")]
    LookupFailed(String),

    /// The provider did not answer in time.
    #[error("Exchange rate lookup timed out after {0} ms")]
    Timeout(u64),

    /// The provider answered with something that is not a usable rate.
    #[error("Invalid exchange rate response: {0}")]
    InvalidResponse(String),

    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(String),

    // =========================================================================
    // Session Errors
    // =========================================================================
    /// The document session was closed.
    #[error("Document session is closed")]
    SessionClosed,

    /// A document edit was rejected.
    #[error(transparent)]
    Core(#[from] CoreError),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SyncError::InvalidResponse(err.to_string())
        } else {
            SyncError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::InvalidResponse(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl SyncError {
    /// Returns true if a later lookup of the same pair may succeed.
    ///
    /// ## Retryable Errors
    /// - Timeouts
    /// - HTTP transport failures
    /// - Provider-side errors
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::Timeout(_) | SyncError::Http(_) | SyncError::LookupFailed(_)
        )
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_)
                | SyncError::ConfigLoadFailed(_)
                | SyncError::ConfigSaveFailed(_)
        )
    }
}
