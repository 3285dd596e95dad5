//! Structured debug logging system

use jingle_rtc_core::JingleError;
use tracing_subscriber::EnvFilter;

/// Default filter when neither the caller nor `RUST_LOG` provides one
pub const DEFAULT_FILTER: &str = "info";

/// Debug logger for structured logging
#[derive(Debug)]
pub struct DebugLogger {
    filter: String,
}

impl DebugLogger {
    /// Create new debug logger with the default filter
    pub fn new() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
        }
    }

    /// Create a logger with an explicit filter directive (e.g. `jingle_rtc=debug`)
    pub fn with_filter(filter: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
        }
    }

    /// Filter directive this logger installs
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Install a fmt subscriber. `RUST_LOG` wins over the configured filter.
    pub fn install(&self) -> Result<(), JingleError> {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.filter))
            .map_err(|e| JingleError::Logging {
                reason: format!("invalid filter '{}': {}", self.filter, e),
            })?;

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .try_init()
            .map_err(|e| JingleError::Logging {
                reason: e.to_string(),
            })
    }

    /// Initialize logging system with the default filter
    pub fn init_logging() -> Result<(), JingleError> {
        Self::new().install()
    }
}

impl Default for DebugLogger {
    fn default() -> Self {
        Self::new()
    }
}
