//! # jingle-rtc Media
//!
//! Host capability detection, stream track normalization, and capture
//! constraint building for jingle-rtc. This crate decides *which* host
//! bindings to use and *what* to ask them for; it never captures media itself.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod capability;
pub mod constraints;
pub mod error;
pub mod track_access;

// Re-export main types
pub use capability::{
    detect_once, firefox_version, AttachStrategy, Browser, CapabilityDetector, CapabilityProfile,
    Platform, RtcProfile, MIN_FIREFOX_VERSION,
};
pub use constraints::{
    build_constraints, ConstraintBuilder, RequestedMedia, ResolutionTier, WIDESCREEN_ASPECT_RATIO,
};
pub use error::{ErrorCategory, MediaError, MediaResult};
pub use track_access::TrackAccess;
