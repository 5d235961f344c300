//! # Logging
//!
//! Tracing setup for hosts embedding the engine.
//!
//! `procura-core` never logs. Everything in this crate reports through
//! `tracing` macros; the host decides where the events go. `RUST_LOG`
//! overrides the filter passed in.

use tracing_subscriber::EnvFilter;

/// Filter used when neither the host nor `RUST_LOG` sets one.
pub const DEFAULT_FILTER: &str = "info,procura_sync=debug";

/// Installs a global fmt subscriber.
///
/// Returns `false` if a global subscriber was already installed (tests,
/// or a host that set up its own).
pub fn init_tracing(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_twice() {
        init_tracing(DEFAULT_FILTER);
        // Second install is refused, not a panic
        assert!(!init_tracing(DEFAULT_FILTER));
    }
}
