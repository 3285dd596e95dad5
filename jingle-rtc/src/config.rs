//! Configuration types and defaults

use jingle_rtc_core::{ConnectionConstraints, IceConfig, JingleError};
use jingle_rtc_media::MIN_FIREFOX_VERSION;
use serde::{Deserialize, Serialize};

/// Global configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Install a console subscriber at init
    pub debug_logging: bool,
    /// Filter directive used when `RUST_LOG` is unset
    pub log_filter: String,
    /// Oldest accepted Firefox major version
    pub min_firefox_version: u32,
    /// Events buffered per media event subscriber
    pub event_capacity: usize,
    /// User agent used for detection instead of the host's
    pub user_agent_override: Option<String>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            debug_logging: false,
            log_filter: "info".to_string(),
            min_firefox_version: MIN_FIREFOX_VERSION,
            event_capacity: 100,
            user_agent_override: None,
        }
    }
}

impl GlobalConfig {
    /// Parse from JSON; missing fields take their defaults
    ///
    /// # Errors
    ///
    /// [`JingleError::Configuration`] on malformed or invalid input.
    pub fn from_json(json: &str) -> Result<Self, JingleError> {
        let config: Self = serde_json::from_str(json).map_err(|e| JingleError::Configuration {
            reason: format!("invalid configuration JSON: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// [`JingleError::Configuration`] naming the first offending field.
    pub fn validate(&self) -> Result<(), JingleError> {
        if self.event_capacity == 0 {
            return Err(JingleError::Configuration {
                reason: "event_capacity must be at least 1".to_string(),
            });
        }
        if self.log_filter.trim().is_empty() {
            return Err(JingleError::Configuration {
                reason: "log_filter must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Per-connection configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerConfig {
    /// ICE servers
    pub ice: IceConfig,
    /// Connection constraints; `None` uses the detected profile's defaults
    pub constraints: Option<ConnectionConstraints>,
}

impl PeerConfig {
    /// Config with the given ICE servers and profile default constraints
    pub fn new(ice: IceConfig) -> Self {
        Self {
            ice,
            constraints: None,
        }
    }

    /// Override the connection constraints
    pub fn with_constraints(mut self, constraints: ConnectionConstraints) -> Self {
        self.constraints = Some(constraints);
        self
    }
}
