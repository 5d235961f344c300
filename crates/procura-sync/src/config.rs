//! # Engine Configuration
//!
//! Settings for new documents and for exchange-rate lookups.
//!
//! ## Configuration Sources (Priority Order)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest)                                    │
//! │     PROCURA_BASE_CURRENCY, PROCURA_DEFAULT_CURRENCY,                   │
//! │     PROCURA_DEFAULT_TAX_RATE, PROCURA_RATE_PROVIDER,                   │
//! │     PROCURA_RATE_URL, PROCURA_RATE_TIMEOUT_MS                          │
//! │                     │                                                   │
//! │                     ▼                                                   │
//! │  2. Config File (engine.toml)                                          │
//! │     Linux: ~/.config/procura/engine.toml                               │
//! │     macOS: ~/Library/Application Support/com.procura.procura/...      │
//! │                     │                                                   │
//! │                     ▼                                                   │
//! │  3. Default Values (lowest)                                            │
//! │     THB base and default currency, 7% tax, fixed rates, 5 s timeout    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Config File
//! ```toml
//! [currency]
//! base_currency = "THB"
//! default_currency = "THB"
//!
//! [document]
//! default_tax_rate = "7"
//!
//! [rates]
//! provider = "http"  # fixed | http
//! base_url = "http://localhost:8080/api"
//! timeout_ms = 5000
//!
//! [rates.fixed]
//! "USD/THB" = "35.50"
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use procura_core::validation::validate_tax_rate;
use procura_core::{CurrencyCode, DocumentDefaults, TaxRate, DEFAULT_TAX_RATE_PERCENT};

use crate::error::{SyncError, SyncResult};
use crate::provider::{ExchangeRateProvider, FixedRateProvider, HttpRateProvider};

/// Lookup timeout used when none is configured.
pub const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 5_000;

/// File name of the engine config inside the config directory.
pub const CONFIG_FILE_NAME: &str = "engine.toml";

// =============================================================================
// Provider Kind
// =============================================================================

/// Which exchange-rate provider to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Rates from the `[rates.fixed]` table.
    #[default]
    Fixed,

    /// Rates from the finance service REST endpoint.
    Http,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Fixed => write!(f, "fixed"),
            ProviderKind::Http => write!(f, "http"),
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fixed" | "mock" | "static" => Ok(ProviderKind::Fixed),
            "http" | "rest" => Ok(ProviderKind::Http),
            other => Err(SyncError::InvalidConfig(format!(
                "Unknown rate provider: '{}'. Valid options: fixed, http",
                other
            ))),
        }
    }
}

// =============================================================================
// Sections
// =============================================================================

/// `[currency]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencySettings {
    /// Organization home currency.
    #[serde(default = "CurrencyCode::base_default")]
    pub base_currency: CurrencyCode,

    /// Currency pre-selected on new documents.
    #[serde(default = "CurrencyCode::base_default")]
    pub default_currency: CurrencyCode,
}

impl Default for CurrencySettings {
    fn default() -> Self {
        CurrencySettings {
            base_currency: CurrencyCode::base_default(),
            default_currency: CurrencyCode::base_default(),
        }
    }
}

/// `[document]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSettings {
    /// Tax rate pre-filled on new documents, in percent.
    #[serde(default = "default_tax_rate")]
    pub default_tax_rate: Decimal,
}

fn default_tax_rate() -> Decimal {
    Decimal::from(DEFAULT_TAX_RATE_PERCENT)
}

impl Default for DocumentSettings {
    fn default() -> Self {
        DocumentSettings {
            default_tax_rate: default_tax_rate(),
        }
    }
}

/// `[rates]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSettings {
    #[serde(default)]
    pub provider: ProviderKind,

    /// Base URL of the finance service (http provider only).
    #[serde(default)]
    pub base_url: Option<String>,

    /// Lookup timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Static rates keyed `"SRC/TGT"` (fixed provider only).
    #[serde(default)]
    pub fixed: HashMap<String, Decimal>,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_LOOKUP_TIMEOUT_MS
}

impl Default for RateSettings {
    fn default() -> Self {
        RateSettings {
            provider: ProviderKind::default(),
            base_url: None,
            timeout_ms: default_timeout_ms(),
            fixed: HashMap::new(),
        }
    }
}

// =============================================================================
// Engine Configuration
// =============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub currency: CurrencySettings,

    #[serde(default)]
    pub document: DocumentSettings,

    #[serde(default)]
    pub rates: RateSettings,
}

impl EngineConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (engine.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading engine config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load engine config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SyncError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| SyncError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Engine config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        validate_tax_rate(self.document.default_tax_rate)
            .map_err(|e| SyncError::InvalidConfig(e.to_string()))?;

        if self.rates.timeout_ms == 0 {
            return Err(SyncError::InvalidConfig(
                "timeout_ms must be greater than 0".into(),
            ));
        }

        match self.rates.provider {
            ProviderKind::Http => match self.rates.base_url.as_deref() {
                None => {
                    return Err(SyncError::InvalidConfig(
                        "base_url is required for the http rate provider".into(),
                    ))
                }
                Some(url) if !url.starts_with("http://") && !url.starts_with("https://") => {
                    return Err(SyncError::InvalidConfig(format!(
                        "Rate URL must start with http:// or https://, got: {}",
                        url
                    )))
                }
                Some(_) => {}
            },
            ProviderKind::Fixed => {
                FixedRateProvider::from_table(&self.rates.fixed)?;
            }
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(code) = std::env::var("PROCURA_BASE_CURRENCY") {
            match CurrencyCode::parse(&code) {
                Ok(parsed) => {
                    debug!(currency = %parsed, "Overriding base currency from environment");
                    self.currency.base_currency = parsed;
                }
                Err(e) => warn!(code = %code, "Ignoring PROCURA_BASE_CURRENCY: {}", e),
            }
        }

        if let Ok(code) = std::env::var("PROCURA_DEFAULT_CURRENCY") {
            match CurrencyCode::parse(&code) {
                Ok(parsed) => self.currency.default_currency = parsed,
                Err(e) => warn!(code = %code, "Ignoring PROCURA_DEFAULT_CURRENCY: {}", e),
            }
        }

        if let Ok(rate) = std::env::var("PROCURA_DEFAULT_TAX_RATE") {
            if let Ok(parsed) = rate.trim().parse::<Decimal>() {
                self.document.default_tax_rate = parsed;
            }
        }

        if let Ok(provider) = std::env::var("PROCURA_RATE_PROVIDER") {
            match provider.parse() {
                Ok(parsed) => {
                    debug!(provider = %provider, "Overriding rate provider from environment");
                    self.rates.provider = parsed;
                }
                Err(_) => warn!(provider = %provider, "Unknown rate provider in environment"),
            }
        }

        if let Ok(url) = std::env::var("PROCURA_RATE_URL") {
            debug!(url = %url, "Overriding rate URL from environment");
            self.rates.base_url = Some(url);
        }

        if let Ok(timeout) = std::env::var("PROCURA_RATE_TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse::<u64>() {
                self.rates.timeout_ms = ms;
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "procura", "procura")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Settings new documents are opened with.
    pub fn document_defaults(&self) -> DocumentDefaults {
        DocumentDefaults {
            base_currency: self.currency.base_currency.clone(),
            default_currency: self.currency.default_currency.clone(),
            tax_rate: TaxRate::from_percent(self.document.default_tax_rate),
        }
    }

    /// How long a single rate lookup may take.
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.rates.timeout_ms)
    }

    /// Builds the configured exchange-rate provider.
    pub fn build_provider(&self) -> SyncResult<Arc<dyn ExchangeRateProvider>> {
        match self.rates.provider {
            ProviderKind::Fixed => {
                let provider = FixedRateProvider::from_table(&self.rates.fixed)?;
                info!(rates = provider.len(), "Using fixed exchange rates");
                Ok(Arc::new(provider))
            }
            ProviderKind::Http => {
                let url = self.rates.base_url.clone().ok_or_else(|| {
                    SyncError::InvalidConfig("base_url is required for the http rate provider".into())
                })?;
                info!(url = %url, "Using HTTP exchange rates");
                Ok(Arc::new(HttpRateProvider::new(url, self.lookup_timeout())?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serial_test::serial;

    const ENV_VARS: [&str; 6] = [
        "PROCURA_BASE_CURRENCY",
        "PROCURA_DEFAULT_CURRENCY",
        "PROCURA_DEFAULT_TAX_RATE",
        "PROCURA_RATE_PROVIDER",
        "PROCURA_RATE_URL",
        "PROCURA_RATE_TIMEOUT_MS",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!("fixed".parse::<ProviderKind>().unwrap(), ProviderKind::Fixed);
        assert_eq!("HTTP".parse::<ProviderKind>().unwrap(), ProviderKind::Http);
        assert_eq!("rest".parse::<ProviderKind>().unwrap(), ProviderKind::Http);
        assert!("ftp".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.currency.base_currency.as_str(), "THB");
        assert_eq!(config.document.default_tax_rate, dec!(7));
        assert_eq!(config.rates.provider, ProviderKind::Fixed);
        assert_eq!(config.lookup_timeout(), Duration::from_secs(5));
        assert!(config.validate().is_ok());

        let defaults = config.document_defaults();
        assert_eq!(defaults, DocumentDefaults::default());
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig::default();

        config.document.default_tax_rate = dec!(120);
        assert!(config.validate().unwrap_err().is_config_error());
        config.document.default_tax_rate = dec!(7);

        config.rates.timeout_ms = 0;
        assert!(config.validate().is_err());
        config.rates.timeout_ms = 5000;

        config.rates.provider = ProviderKind::Http;
        assert!(config.validate().is_err());
        config.rates.base_url = Some("ftp://rates".to_string());
        assert!(config.validate().is_err());
        config.rates.base_url = Some("http://localhost:8080/api".to_string());
        assert!(config.validate().is_ok());

        config.rates.provider = ProviderKind::Fixed;
        config.rates.fixed.insert("USD-THB".to_string(), dec!(35.5));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_parsing() {
        let config: EngineConfig = toml::from_str(
            r#"
            [currency]
            base_currency = "thb"
            default_currency = "USD"

            [document]
            default_tax_rate = "10"

            [rates]
            provider = "fixed"
            timeout_ms = 2500

            [rates.fixed]
            "USD/THB" = "35.50"
            "#,
        )
        .unwrap();

        assert_eq!(config.currency.base_currency.as_str(), "THB");
        assert_eq!(config.currency.default_currency.as_str(), "USD");
        assert_eq!(config.document.default_tax_rate, dec!(10));
        assert_eq!(config.lookup_timeout(), Duration::from_millis(2500));
        assert_eq!(config.rates.fixed.get("USD/THB"), Some(&dec!(35.50)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: EngineConfig = toml::from_str("[rates]\nprovider = \"http\"\n").unwrap();
        assert_eq!(config.currency, CurrencySettings::default());
        assert_eq!(config.rates.timeout_ms, DEFAULT_LOOKUP_TIMEOUT_MS);
        assert_eq!(config.rates.provider, ProviderKind::Http);
    }

    #[test]
    #[serial]
    fn test_save_and_load_roundtrip() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let mut config = EngineConfig::default();
        config.currency.default_currency = CurrencyCode::parse("USD").unwrap();
        config.rates.fixed.insert("USD/THB".to_string(), dec!(35.5));
        config.save(Some(path.clone())).unwrap();

        let loaded = EngineConfig::load(Some(path)).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    #[serial]
    fn test_load_missing_file_uses_defaults() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load(Some(dir.path().join(CONFIG_FILE_NAME))).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    #[serial]
    fn test_load_or_default_on_broken_file() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[document]\ndefault_tax_rate = \"abc\"\n").unwrap();

        assert!(EngineConfig::load(Some(path.clone())).unwrap_err().is_config_error());
        assert_eq!(EngineConfig::load_or_default(Some(path)), EngineConfig::default());
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();

        std::env::set_var("PROCURA_DEFAULT_CURRENCY", "eur");
        std::env::set_var("PROCURA_DEFAULT_TAX_RATE", "0");
        std::env::set_var("PROCURA_RATE_PROVIDER", "http");
        std::env::set_var("PROCURA_RATE_URL", "https://finance.internal/api");
        std::env::set_var("PROCURA_RATE_TIMEOUT_MS", "1500");
        std::env::set_var("PROCURA_BASE_CURRENCY", "not a code");

        let config = EngineConfig::load(Some(dir.path().join(CONFIG_FILE_NAME)));
        clear_env();
        let config = config.unwrap();

        assert_eq!(config.currency.default_currency.as_str(), "EUR");
        // Invalid code ignored
        assert_eq!(config.currency.base_currency.as_str(), "THB");
        assert!(config.document.default_tax_rate.is_zero());
        assert_eq!(config.rates.provider, ProviderKind::Http);
        assert_eq!(config.rates.base_url.as_deref(), Some("https://finance.internal/api"));
        assert_eq!(config.lookup_timeout(), Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn test_build_fixed_provider() {
        let mut config = EngineConfig::default();
        config.rates.fixed.insert("USD/THB".to_string(), dec!(35.5));

        let provider = config.build_provider().unwrap();
        let usd = CurrencyCode::parse("USD").unwrap();
        let rate = provider
            .fetch_exchange_rate(&usd, &CurrencyCode::base_default())
            .await
            .unwrap();
        assert_eq!(rate, dec!(35.5));
    }

    #[test]
    fn test_build_http_provider_requires_url() {
        let mut config = EngineConfig::default();
        config.rates.provider = ProviderKind::Http;
        assert!(config.build_provider().is_err());

        config.rates.base_url = Some("http://localhost:8080/api".to_string());
        assert!(config.build_provider().is_ok());
    }
}
