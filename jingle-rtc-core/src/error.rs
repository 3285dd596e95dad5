//! Error types for jingle-rtc

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by the host engine.
///
/// This is the opaque error value hosts hand back through failure
/// continuations. It is recorded in traces and forwarded to callers verbatim,
/// so it carries no classification of its own beyond the host's name for it.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{name}: {message}")]
pub struct HostError {
    /// Host error name (e.g. `InvalidStateError`)
    pub name: String,
    /// Human readable message
    pub message: String,
}

impl HostError {
    /// Create a host error from a name and message
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Main error type for jingle-rtc operations
#[derive(Error, Debug)]
pub enum JingleError {
    /// Initialization error
    #[error("Initialization failed: {reason}")]
    Initialization {
        /// Reason for initialization failure
        reason: String,
    },

    /// The host environment exposes no supported WebRTC bindings
    #[error("Real-time media is not supported in this environment: {user_agent}")]
    Unsupported {
        /// User agent that was inspected
        user_agent: String,
    },

    /// Host refused to create a peer connection
    #[error("Peer connection creation failed: {source}")]
    PeerConnectionCreation {
        /// Error reported by the host
        source: HostError,
    },

    /// A synchronous host call failed
    #[error("Host call {operation} failed: {source}")]
    Host {
        /// Operation that was delegated
        operation: String,
        /// Error reported by the host
        source: HostError,
    },

    /// Configuration could not be loaded or is invalid
    #[error("Invalid configuration: {reason}")]
    Configuration {
        /// Reason the configuration was rejected
        reason: String,
    },

    /// Logging subsystem could not be installed
    #[error("Logging initialization failed: {reason}")]
    Logging {
        /// Reason reported by the subscriber
        reason: String,
    },

    /// Serialization failed
    #[error("Serialization failed: {source}")]
    Serialization {
        /// Underlying serde error
        #[from]
        source: serde_json::Error,
    },
}

impl JingleError {
    /// Get error code for programmatic handling
    pub fn error_code(&self) -> String {
        match self {
            JingleError::Initialization { .. } => "INITIALIZATION_FAILED".to_string(),
            JingleError::Unsupported { .. } => "UNSUPPORTED_ENVIRONMENT".to_string(),
            JingleError::PeerConnectionCreation { .. } => "PEER_CONNECTION_CREATION_FAILED".to_string(),
            JingleError::Host { .. } => "HOST_CALL_FAILED".to_string(),
            JingleError::Configuration { .. } => "INVALID_CONFIGURATION".to_string(),
            JingleError::Logging { .. } => "LOGGING_INIT_FAILED".to_string(),
            JingleError::Serialization { .. } => "SERIALIZATION_FAILED".to_string(),
        }
    }

    /// Wrap a host failure of a synchronous call
    pub fn host(operation: &str, source: HostError) -> Self {
        JingleError::Host {
            operation: operation.to_string(),
            source,
        }
    }
}
