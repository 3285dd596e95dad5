//! # jingle-rtc Core
//!
//! Host engine abstractions, negotiation values and error types shared by the
//! jingle-rtc crates. Nothing here talks to a network: the host traits are
//! implemented by whatever engine embeds jingle-rtc.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod constraints;
pub mod error;
pub mod host;
pub mod session;
pub mod stream;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export main types
pub use constraints::{
    AudioConstraints, MandatoryVideoConstraints, MediaConstraints, OptionalVideoConstraint,
    VideoConstraints, VideoSource,
};
pub use error::{HostError, JingleError};
pub use host::{
    EventListener, FailureCallback, HostBindings, HostEnvironment, IceCandidateEvent,
    MediaCapture, MediaElement, MediaStreamEvent, ObjectUrlFactory, PeerConnectionFactory,
    PeerConnectionHost, SignalingStateChangeEvent, SuccessCallback,
};
pub use session::{
    ConnectionConstraints, IceCandidate, IceConfig, IceConnectionState, IceServer, SdpType,
    SessionDescription, SignalingState, StatsReport,
};
pub use stream::{MediaKind, MediaStream, MediaStreamTrack};
