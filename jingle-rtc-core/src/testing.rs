//! Scriptable host fakes
//!
//! The fakes queue asynchronous continuations instead of running them, so a
//! test decides when (and how) each host operation completes. Continuations and
//! listeners always run with no fake lock held, which lets them call back into
//! the fake.

use crate::constraints::MediaConstraints;
use crate::error::HostError;
use crate::host::{
    EventListener, FailureCallback, HostBindings, HostEnvironment, IceCandidateEvent,
    MediaCapture, MediaElement, MediaStreamEvent, ObjectUrlFactory, PeerConnectionFactory,
    PeerConnectionHost, SignalingStateChangeEvent, SuccessCallback,
};
use crate::session::{
    ConnectionConstraints, IceCandidate, IceConfig, IceConnectionState, SdpType,
    SessionDescription, SignalingState, StatsReport,
};
use crate::stream::{MediaKind, MediaStream, MediaStreamTrack};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Desktop Chrome user agent
pub const CHROME_UA: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/28.0.1500.95 Safari/537.36";

/// Android Chrome user agent
pub const CHROME_ANDROID_UA: &str = "Mozilla/5.0 (Linux; Android 4.2.2; Nexus 7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/28.0.1500.94 Safari/537.36";

/// Firefox 24 user agent
pub const FIREFOX_UA: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:24.0) Gecko/20100101 Firefox/24.0";

/// Firefox 21 user agent, below the supported minimum
pub const OLD_FIREFOX_UA: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:21.0) Gecko/20100101 Firefox/21.0";

/// A user agent with no WebRTC support
pub const UNSUPPORTED_UA: &str = "Mozilla/5.0 (compatible; MSIE 10.0; Windows NT 6.1)";

/// A camera + microphone stream with both track accessors
pub fn sample_stream(id: &str) -> MediaStream {
    MediaStream::new(
        id,
        vec![
            MediaStreamTrack::new(format!("{id}-video"), MediaKind::Video, "Fake Camera"),
            MediaStreamTrack::new(format!("{id}-audio"), MediaKind::Audio, "Fake Microphone"),
        ],
    )
}

/// A candidate line for tests
pub fn sample_candidate(index: u16) -> IceCandidate {
    IceCandidate {
        candidate: format!("candidate:{index} 1 udp 2113937151 192.0.2.1 5000{index} typ host"),
        sdp_mid: Some("audio".to_string()),
        sdp_m_line_index: Some(index),
    }
}

enum Pending {
    Apply {
        operation: String,
        local: bool,
        description: SessionDescription,
        on_success: SuccessCallback<()>,
        on_failure: FailureCallback,
    },
    Create {
        operation: String,
        sdp_type: SdpType,
        on_success: SuccessCallback<SessionDescription>,
        on_failure: FailureCallback,
    },
}

impl Pending {
    fn operation(&self) -> &str {
        match self {
            Pending::Apply { operation, .. } | Pending::Create { operation, .. } => operation,
        }
    }
}

#[derive(Default)]
struct Listeners {
    ice_candidate: Option<EventListener<IceCandidateEvent>>,
    add_stream: Option<EventListener<MediaStreamEvent>>,
    remove_stream: Option<EventListener<MediaStreamEvent>>,
    signaling_state: Option<EventListener<SignalingStateChangeEvent>>,
}

struct FakeState {
    calls: Vec<String>,
    pending: VecDeque<Pending>,
    signaling_state: SignalingState,
    ice_connection_state: IceConnectionState,
    local_description: Option<SessionDescription>,
    remote_description: Option<SessionDescription>,
    streams: Vec<String>,
    candidates: Vec<IceCandidate>,
    candidate_callbacks_attached: bool,
    stream_failure: Option<HostError>,
    stats: StatsReport,
    closed: bool,
}

/// Scriptable peer connection
///
/// Clones share state, so a test keeps one clone while the wrapper owns the
/// boxed other.
#[derive(Clone)]
pub struct FakePeerConnection {
    state: Arc<Mutex<FakeState>>,
    listeners: Arc<Mutex<Listeners>>,
}

impl Default for FakePeerConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl FakePeerConnection {
    /// Create a fresh connection in the `stable` / `new` state
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                calls: Vec::new(),
                pending: VecDeque::new(),
                signaling_state: SignalingState::Stable,
                ice_connection_state: IceConnectionState::New,
                local_description: None,
                remote_description: None,
                streams: Vec::new(),
                candidates: Vec::new(),
                candidate_callbacks_attached: false,
                stream_failure: None,
                stats: StatsReport::default(),
                closed: false,
            })),
            listeners: Arc::new(Mutex::new(Listeners::default())),
        }
    }

    /// Host methods invoked so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    /// Asynchronous operations awaiting completion, oldest first
    pub fn pending_operations(&self) -> Vec<String> {
        self.state
            .lock()
            .pending
            .iter()
            .map(|pending| pending.operation().to_string())
            .collect()
    }

    /// Complete the oldest pending operation successfully.
    ///
    /// Description creation yields a canned offer or answer. Returns the
    /// completed operation's name, or `None` when nothing is pending.
    pub fn succeed_next(&self) -> Option<String> {
        let pending = self.state.lock().pending.pop_front()?;
        let operation = pending.operation().to_string();
        match pending {
            Pending::Apply {
                local,
                description,
                on_success,
                ..
            } => {
                {
                    let mut state = self.state.lock();
                    state.signaling_state = match (local, description.sdp_type) {
                        (true, SdpType::Offer) => SignalingState::HaveLocalOffer,
                        (false, SdpType::Offer) => SignalingState::HaveRemoteOffer,
                        (true, SdpType::Pranswer) => SignalingState::HaveLocalPranswer,
                        (false, SdpType::Pranswer) => SignalingState::HaveRemotePranswer,
                        _ => SignalingState::Stable,
                    };
                    if local {
                        state.local_description = Some(description);
                    } else {
                        state.remote_description = Some(description);
                    }
                }
                on_success(());
            }
            Pending::Create {
                sdp_type,
                on_success,
                ..
            } => {
                let sdp = format!("v=0\r\no=- 0 0 IN IP4 127.0.0.1\r\ns=fake-{operation}\r\n");
                on_success(SessionDescription { sdp_type, sdp });
            }
        }
        Some(operation)
    }

    /// Fail the oldest pending operation with `error`
    pub fn fail_next(&self, error: HostError) -> Option<String> {
        let pending = self.state.lock().pending.pop_front()?;
        let operation = pending.operation().to_string();
        match pending {
            Pending::Apply { on_failure, .. } | Pending::Create { on_failure, .. } => {
                on_failure(error)
            }
        }
        Some(operation)
    }

    /// Make the next `add_stream` / `remove_stream` call fail
    pub fn fail_next_stream_call(&self, error: HostError) {
        self.state.lock().stream_failure = Some(error);
    }

    /// Set the ICE connection state reported by the accessor
    pub fn set_ice_connection_state(&self, state: IceConnectionState) {
        self.state.lock().ice_connection_state = state;
    }

    /// Set the report handed to `get_stats`
    pub fn set_stats(&self, stats: StatsReport) {
        self.state.lock().stats = stats;
    }

    /// IDs of currently attached local streams
    pub fn streams(&self) -> Vec<String> {
        self.state.lock().streams.clone()
    }

    /// Remote candidates added so far
    pub fn candidates(&self) -> Vec<IceCandidate> {
        self.state.lock().candidates.clone()
    }

    /// Whether any candidate was added with outcome continuations
    pub fn candidate_callbacks_attached(&self) -> bool {
        self.state.lock().candidate_callbacks_attached
    }

    /// Whether `close` was called
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Whether a listener is installed for each event kind, in the order
    /// ICE candidate, add stream, remove stream, signaling state
    pub fn installed_listeners(&self) -> [bool; 4] {
        let listeners = self.listeners.lock();
        [
            listeners.ice_candidate.is_some(),
            listeners.add_stream.is_some(),
            listeners.remove_stream.is_some(),
            listeners.signaling_state.is_some(),
        ]
    }

    /// Fire an ICE candidate event; returns whether a listener received it
    pub fn emit_ice_candidate(&self, event: IceCandidateEvent) -> bool {
        Self::emit(&self.listeners, |l| &mut l.ice_candidate, event)
    }

    /// Fire a remote-stream-added event
    pub fn emit_add_stream(&self, event: MediaStreamEvent) -> bool {
        Self::emit(&self.listeners, |l| &mut l.add_stream, event)
    }

    /// Fire a remote-stream-removed event
    pub fn emit_remove_stream(&self, event: MediaStreamEvent) -> bool {
        Self::emit(&self.listeners, |l| &mut l.remove_stream, event)
    }

    /// Fire a signaling-state event, updating the reported state first
    pub fn emit_signaling_state_change(&self, event: SignalingStateChangeEvent) -> bool {
        self.state.lock().signaling_state = event.state;
        Self::emit(&self.listeners, |l| &mut l.signaling_state, event)
    }

    fn emit<E>(
        listeners: &Mutex<Listeners>,
        slot: impl Fn(&mut Listeners) -> &mut Option<EventListener<E>>,
        event: E,
    ) -> bool {
        let listener = {
            let mut guard = listeners.lock();
            slot(&mut *guard).take()
        };
        match listener {
            Some(mut listener) => {
                listener(event);
                let mut guard = listeners.lock();
                let current = slot(&mut *guard);
                if current.is_none() {
                    *current = Some(listener);
                }
                true
            }
            None => false,
        }
    }

    fn record(&self, call: &str) {
        self.state.lock().calls.push(call.to_string());
    }

    fn stream_call(&self, call: &str, stream: &MediaStream, add: bool) -> Result<(), HostError> {
        let mut state = self.state.lock();
        state.calls.push(call.to_string());
        if let Some(error) = state.stream_failure.take() {
            return Err(error);
        }
        if add {
            state.streams.push(stream.id.clone());
        } else {
            state.streams.retain(|id| id != &stream.id);
        }
        Ok(())
    }
}

impl PeerConnectionHost for FakePeerConnection {
    fn signaling_state(&self) -> SignalingState {
        self.state.lock().signaling_state
    }

    fn ice_connection_state(&self) -> IceConnectionState {
        self.state.lock().ice_connection_state
    }

    fn local_description(&self) -> Option<SessionDescription> {
        self.state.lock().local_description.clone()
    }

    fn remote_description(&self) -> Option<SessionDescription> {
        self.state.lock().remote_description.clone()
    }

    fn add_stream(&self, stream: &MediaStream) -> Result<(), HostError> {
        self.stream_call("addStream", stream, true)
    }

    fn remove_stream(&self, stream: &MediaStream) -> Result<(), HostError> {
        self.stream_call("removeStream", stream, false)
    }

    fn set_local_description(
        &self,
        description: SessionDescription,
        on_success: SuccessCallback<()>,
        on_failure: FailureCallback,
    ) {
        let mut state = self.state.lock();
        state.calls.push("setLocalDescription".to_string());
        state.pending.push_back(Pending::Apply {
            operation: "setLocalDescription".to_string(),
            local: true,
            description,
            on_success,
            on_failure,
        });
    }

    fn set_remote_description(
        &self,
        description: SessionDescription,
        on_success: SuccessCallback<()>,
        on_failure: FailureCallback,
    ) {
        let mut state = self.state.lock();
        state.calls.push("setRemoteDescription".to_string());
        state.pending.push_back(Pending::Apply {
            operation: "setRemoteDescription".to_string(),
            local: false,
            description,
            on_success,
            on_failure,
        });
    }

    fn create_offer(
        &self,
        on_success: SuccessCallback<SessionDescription>,
        on_failure: FailureCallback,
        _constraints: Option<ConnectionConstraints>,
    ) {
        let mut state = self.state.lock();
        state.calls.push("createOffer".to_string());
        state.pending.push_back(Pending::Create {
            operation: "createOffer".to_string(),
            sdp_type: SdpType::Offer,
            on_success,
            on_failure,
        });
    }

    fn create_answer(
        &self,
        on_success: SuccessCallback<SessionDescription>,
        on_failure: FailureCallback,
        _constraints: Option<ConnectionConstraints>,
    ) {
        let mut state = self.state.lock();
        state.calls.push("createAnswer".to_string());
        state.pending.push_back(Pending::Create {
            operation: "createAnswer".to_string(),
            sdp_type: SdpType::Answer,
            on_success,
            on_failure,
        });
    }

    fn add_ice_candidate(
        &self,
        candidate: IceCandidate,
        on_success: Option<SuccessCallback<()>>,
        on_failure: Option<FailureCallback>,
    ) {
        let mut state = self.state.lock();
        state.calls.push("addIceCandidate".to_string());
        state.candidates.push(candidate);
        if on_success.is_some() || on_failure.is_some() {
            state.candidate_callbacks_attached = true;
        }
    }

    fn close(&self) {
        let mut state = self.state.lock();
        state.calls.push("close".to_string());
        state.closed = true;
        state.signaling_state = SignalingState::Closed;
        state.ice_connection_state = IceConnectionState::Closed;
    }

    fn get_stats(&self, callback: SuccessCallback<StatsReport>) {
        self.record("getStats");
        let stats = self.state.lock().stats.clone();
        callback(stats);
    }

    fn on_ice_candidate(&self, listener: Option<EventListener<IceCandidateEvent>>) {
        self.listeners.lock().ice_candidate = listener;
    }

    fn on_add_stream(&self, listener: Option<EventListener<MediaStreamEvent>>) {
        self.listeners.lock().add_stream = listener;
    }

    fn on_remove_stream(&self, listener: Option<EventListener<MediaStreamEvent>>) {
        self.listeners.lock().remove_stream = listener;
    }

    fn on_signaling_state_change(
        &self,
        listener: Option<EventListener<SignalingStateChangeEvent>>,
    ) {
        self.listeners.lock().signaling_state = listener;
    }
}

/// Factory handing out [`FakePeerConnection`]s
#[derive(Clone, Default)]
pub struct FakeFactory {
    created: Arc<Mutex<Vec<(IceConfig, ConnectionConstraints, FakePeerConnection)>>>,
    failure: Arc<Mutex<Option<HostError>>>,
}

impl FakeFactory {
    /// Create a factory that always succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later construction fail with `error`
    pub fn fail_with(&self, error: HostError) {
        *self.failure.lock() = Some(error);
    }

    /// Number of connections constructed
    pub fn created_count(&self) -> usize {
        self.created.lock().len()
    }

    /// Most recently constructed connection
    pub fn last(&self) -> Option<FakePeerConnection> {
        self.created.lock().last().map(|(_, _, pc)| pc.clone())
    }

    /// Constraints passed to the most recent construction
    pub fn last_constraints(&self) -> Option<ConnectionConstraints> {
        self.created
            .lock()
            .last()
            .map(|(_, constraints, _)| constraints.clone())
    }

    /// ICE configuration passed to the most recent construction
    pub fn last_config(&self) -> Option<IceConfig> {
        self.created.lock().last().map(|(config, _, _)| config.clone())
    }
}

impl PeerConnectionFactory for FakeFactory {
    fn create(
        &self,
        config: &IceConfig,
        constraints: &ConnectionConstraints,
    ) -> Result<Box<dyn PeerConnectionHost>, HostError> {
        if let Some(error) = self.failure.lock().clone() {
            return Err(error);
        }
        let pc = FakePeerConnection::new();
        self.created
            .lock()
            .push((config.clone(), constraints.clone(), pc.clone()));
        Ok(Box::new(pc))
    }
}

/// How a [`FakeCapture`] answers requests
#[derive(Debug, Clone)]
pub enum CaptureBehavior {
    /// Call the success continuation with this stream
    Succeed(MediaStream),
    /// Call the failure continuation with this error
    Fail(HostError),
    /// Return this error from the call itself
    Throw(HostError),
}

/// Scriptable capture function
#[derive(Clone)]
pub struct FakeCapture {
    behavior: Arc<Mutex<CaptureBehavior>>,
    requests: Arc<Mutex<Vec<MediaConstraints>>>,
}

impl FakeCapture {
    /// Capture that succeeds with `stream`
    pub fn succeeding(stream: MediaStream) -> Self {
        Self::with_behavior(CaptureBehavior::Succeed(stream))
    }

    /// Capture that reports `error` through the failure continuation
    pub fn failing(error: HostError) -> Self {
        Self::with_behavior(CaptureBehavior::Fail(error))
    }

    /// Capture whose call itself errors
    pub fn throwing(error: HostError) -> Self {
        Self::with_behavior(CaptureBehavior::Throw(error))
    }

    /// Capture with explicit behavior
    pub fn with_behavior(behavior: CaptureBehavior) -> Self {
        Self {
            behavior: Arc::new(Mutex::new(behavior)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Constraints received so far
    pub fn requests(&self) -> Vec<MediaConstraints> {
        self.requests.lock().clone()
    }
}

impl MediaCapture for FakeCapture {
    fn get_user_media(
        &self,
        constraints: &MediaConstraints,
        on_success: SuccessCallback<MediaStream>,
        on_failure: FailureCallback,
    ) -> Result<(), HostError> {
        self.requests.lock().push(constraints.clone());
        let behavior = self.behavior.lock().clone();
        match behavior {
            CaptureBehavior::Succeed(stream) => on_success(stream),
            CaptureBehavior::Fail(error) => on_failure(error),
            CaptureBehavior::Throw(error) => return Err(error),
        }
        Ok(())
    }
}

/// Object URL facility producing `blob:` URLs
#[derive(Debug, Clone, Default)]
pub struct FakeObjectUrls;

impl ObjectUrlFactory for FakeObjectUrls {
    fn create_object_url(&self, stream: &MediaStream) -> String {
        format!("blob:fake/{}", stream.id)
    }
}

/// Media element recording what was done to it
#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    /// ID of the assigned source object
    pub source_object: Option<String>,
    /// Attributes set on the element
    pub attributes: Vec<(String, String)>,
    /// Whether playback was started
    pub playing: bool,
    /// Error to return from `play`
    pub play_error: Option<HostError>,
}

impl FakeElement {
    /// Last value set for `name`
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

impl MediaElement for FakeElement {
    fn set_source_object(&mut self, stream: &MediaStream) {
        self.source_object = Some(stream.id.clone());
    }

    fn set_attribute(&mut self, name: &str, value: &str) {
        self.attributes.push((name.to_string(), value.to_string()));
    }

    fn play(&mut self) -> Result<(), HostError> {
        if let Some(error) = self.play_error.clone() {
            return Err(error);
        }
        self.playing = true;
        Ok(())
    }
}

/// Environment with configurable user agent and vendor globals
#[derive(Clone)]
pub struct FakeEnvironment {
    user_agent: String,
    firefox: Option<HostBindings>,
    webkit: Option<HostBindings>,
}

impl FakeEnvironment {
    /// Chromium-family environment using `factory` and `capture`
    pub fn chrome(user_agent: &str, factory: FakeFactory, capture: FakeCapture) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            firefox: None,
            webkit: Some(Self::bindings(factory, capture)),
        }
    }

    /// Firefox-family environment using `factory` and `capture`
    pub fn firefox(user_agent: &str, factory: FakeFactory, capture: FakeCapture) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            firefox: Some(HostBindings {
                object_urls: None,
                ..Self::bindings(factory, capture)
            }),
            webkit: None,
        }
    }

    /// Environment exposing no vendor globals
    pub fn unsupported(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            firefox: None,
            webkit: None,
        }
    }

    fn bindings(factory: FakeFactory, capture: FakeCapture) -> HostBindings {
        HostBindings {
            peer_connection: Arc::new(factory),
            media_capture: Arc::new(capture),
            object_urls: Some(Arc::new(FakeObjectUrls)),
        }
    }
}

impl HostEnvironment for FakeEnvironment {
    fn user_agent(&self) -> String {
        self.user_agent.clone()
    }

    fn firefox_bindings(&self) -> Option<HostBindings> {
        self.firefox.clone()
    }

    fn webkit_bindings(&self) -> Option<HostBindings> {
        self.webkit.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fake_queues_until_resolved() {
        let pc = FakePeerConnection::new();
        let done = Arc::new(Mutex::new(None));
        let sink = done.clone();
        pc.create_offer(
            Box::new(move |desc| *sink.lock() = Some(desc)),
            Box::new(|_| {}),
            None,
        );

        assert_eq!(pc.pending_operations(), vec!["createOffer".to_string()]);
        assert!(done.lock().is_none());

        assert_eq!(pc.succeed_next().as_deref(), Some("createOffer"));
        assert_eq!(done.lock().as_ref().map(|d| d.sdp_type), Some(SdpType::Offer));
        assert!(pc.succeed_next().is_none());
    }

    #[test]
    fn test_emit_without_listener_is_dropped() {
        let pc = FakePeerConnection::new();
        assert!(!pc.emit_ice_candidate(IceCandidateEvent { candidate: None }));
    }
}
