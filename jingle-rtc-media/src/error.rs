//! Media error types and handling
//!
//! Errors raised while selecting host bindings, attaching streams to elements
//! and requesting capture.

use jingle_rtc_core::HostError;
use thiserror::Error;

/// Main error type for media operations
#[derive(Error, Debug)]
pub enum MediaError {
    /// The environment has no supported WebRTC bindings
    #[error("Unsupported platform: {platform}")]
    UnsupportedPlatform {
        /// User agent or platform description
        platform: String,
    },

    /// Invalid configuration provided
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// Error message
        message: String,
    },

    /// The host lacks a facility the profile's attach strategy needs
    #[error("Resource not available: {resource}")]
    ResourceNotAvailable {
        /// Resource name
        resource: String,
    },

    /// The host rejected attaching a stream to an element
    #[error("Attaching stream {stream_id} failed: {source}")]
    AttachFailed {
        /// Stream being attached
        stream_id: String,
        /// Host error
        source: HostError,
    },

    /// The host rejected a capture request
    #[error("Capture failed: {source}")]
    CaptureFailed {
        /// Host error
        source: HostError,
    },
}

/// Result type alias for media operations
pub type MediaResult<T> = Result<T, MediaError>;

impl MediaError {
    /// Check if error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            MediaError::UnsupportedPlatform { .. } => false,
            MediaError::InvalidConfiguration { .. } => false,
            MediaError::ResourceNotAvailable { .. } => false,
            MediaError::AttachFailed { .. } => true,
            MediaError::CaptureFailed { .. } => true,
        }
    }

    /// Get error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            MediaError::UnsupportedPlatform { .. } => ErrorCategory::Platform,
            MediaError::InvalidConfiguration { .. } => ErrorCategory::Configuration,
            MediaError::ResourceNotAvailable { .. } => ErrorCategory::Platform,
            MediaError::AttachFailed { .. } => ErrorCategory::Host,
            MediaError::CaptureFailed { .. } => ErrorCategory::Host,
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Platform compatibility errors
    Platform,
    /// Configuration and parameter errors
    Configuration,
    /// Errors reported by the host engine
    Host,
}
