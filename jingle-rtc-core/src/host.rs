//! Host engine abstractions
//!
//! jingle-rtc never implements negotiation, transport or capture itself. A
//! host (browser bindings, a native engine, or the fakes in
//! [`crate::testing`]) implements these traits and jingle-rtc observes and
//! massages what flows through them.

use crate::constraints::MediaConstraints;
use crate::error::HostError;
use crate::session::{
    ConnectionConstraints, IceCandidate, IceConfig, IceConnectionState, SessionDescription,
    SignalingState, StatsReport,
};
use crate::stream::MediaStream;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Continuation invoked once when a host operation succeeds
pub type SuccessCallback<T> = Box<dyn FnOnce(T) + Send + 'static>;

/// Continuation invoked once when a host operation fails
pub type FailureCallback = Box<dyn FnOnce(HostError) + Send + 'static>;

/// Listener installed on a host connection event
pub type EventListener<E> = Box<dyn FnMut(E) + Send + 'static>;

/// A local ICE candidate was gathered; `None` marks end of gathering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IceCandidateEvent {
    /// Gathered candidate
    pub candidate: Option<IceCandidate>,
}

/// A remote stream was added to or removed from the connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaStreamEvent {
    /// Affected stream
    pub stream: MediaStream,
}

/// The connection's signaling state changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignalingStateChangeEvent {
    /// New signaling state
    pub state: SignalingState,
}

/// Host peer connection primitive
///
/// Mirrors the legacy callback-style `RTCPeerConnection` surface. Asynchronous
/// operations take their continuations by value and the host calls exactly one
/// of them, later, from its event loop.
pub trait PeerConnectionHost: Send + Sync {
    /// Current signaling state
    fn signaling_state(&self) -> SignalingState;

    /// Current ICE connection state
    fn ice_connection_state(&self) -> IceConnectionState;

    /// Applied local description
    fn local_description(&self) -> Option<SessionDescription>;

    /// Applied remote description
    fn remote_description(&self) -> Option<SessionDescription>;

    /// Attach a local stream
    fn add_stream(&self, stream: &MediaStream) -> Result<(), HostError>;

    /// Detach a local stream
    fn remove_stream(&self, stream: &MediaStream) -> Result<(), HostError>;

    /// Apply a local description
    fn set_local_description(
        &self,
        description: SessionDescription,
        on_success: SuccessCallback<()>,
        on_failure: FailureCallback,
    );

    /// Apply a remote description
    fn set_remote_description(
        &self,
        description: SessionDescription,
        on_success: SuccessCallback<()>,
        on_failure: FailureCallback,
    );

    /// Create an offer
    fn create_offer(
        &self,
        on_success: SuccessCallback<SessionDescription>,
        on_failure: FailureCallback,
        constraints: Option<ConnectionConstraints>,
    );

    /// Create an answer
    fn create_answer(
        &self,
        on_success: SuccessCallback<SessionDescription>,
        on_failure: FailureCallback,
        constraints: Option<ConnectionConstraints>,
    );

    /// Add a remote candidate; outcome continuations are optional
    fn add_ice_candidate(
        &self,
        candidate: IceCandidate,
        on_success: Option<SuccessCallback<()>>,
        on_failure: Option<FailureCallback>,
    );

    /// Close the connection
    fn close(&self);

    /// Retrieve statistics
    fn get_stats(&self, callback: SuccessCallback<StatsReport>);

    /// Install or clear the ICE candidate listener
    fn on_ice_candidate(&self, listener: Option<EventListener<IceCandidateEvent>>);

    /// Install or clear the remote-stream-added listener
    fn on_add_stream(&self, listener: Option<EventListener<MediaStreamEvent>>);

    /// Install or clear the remote-stream-removed listener
    fn on_remove_stream(&self, listener: Option<EventListener<MediaStreamEvent>>);

    /// Install or clear the signaling-state listener
    fn on_signaling_state_change(&self, listener: Option<EventListener<SignalingStateChangeEvent>>);
}

/// Host peer connection constructor
pub trait PeerConnectionFactory: Send + Sync {
    /// Construct a connection
    fn create(
        &self,
        config: &IceConfig,
        constraints: &ConnectionConstraints,
    ) -> Result<Box<dyn PeerConnectionHost>, HostError>;
}

/// Host media capture primitive (`getUserMedia`)
pub trait MediaCapture: Send + Sync {
    /// Request capture.
    ///
    /// An `Err` return means the call itself failed before any continuation
    /// was scheduled; neither continuation will run in that case.
    fn get_user_media(
        &self,
        constraints: &MediaConstraints,
        on_success: SuccessCallback<MediaStream>,
        on_failure: FailureCallback,
    ) -> Result<(), HostError>;
}

/// Host facility turning a stream into a URL usable as an element source
pub trait ObjectUrlFactory: Send + Sync {
    /// Create an object URL for the stream
    fn create_object_url(&self, stream: &MediaStream) -> String;
}

/// Host media element (a `<video>` or `<audio>` tag)
pub trait MediaElement {
    /// Assign the element's source object
    fn set_source_object(&mut self, stream: &MediaStream);

    /// Set an element attribute
    fn set_attribute(&mut self, name: &str, value: &str);

    /// Start playback
    fn play(&mut self) -> Result<(), HostError>;
}

/// Vendor bindings exposed by a host
#[derive(Clone)]
pub struct HostBindings {
    /// Peer connection constructor
    pub peer_connection: Arc<dyn PeerConnectionFactory>,
    /// Capture function
    pub media_capture: Arc<dyn MediaCapture>,
    /// Object URL facility, when the host has one
    pub object_urls: Option<Arc<dyn ObjectUrlFactory>>,
}

impl fmt::Debug for HostBindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostBindings")
            .field("object_urls", &self.object_urls.is_some())
            .finish_non_exhaustive()
    }
}

/// Environment introspection
pub trait HostEnvironment: Send + Sync {
    /// User agent string
    fn user_agent(&self) -> String;

    /// Bindings behind the `moz`-prefixed globals, if present
    fn firefox_bindings(&self) -> Option<HostBindings>;

    /// Bindings behind the `webkit`-prefixed globals, if present
    fn webkit_bindings(&self) -> Option<HostBindings>;
}
