//! Traced peer connection
//!
//! [`TraceablePeerConnection`] exposes the full legacy peer connection surface
//! while recording every call and every asynchronous outcome in a
//! [`TraceLog`]. It never interprets, retries or swallows anything: host
//! results go back to the caller exactly as the host produced them.

use futures::channel::oneshot;
use jingle_rtc_core::{
    ConnectionConstraints, EventListener, HostError, IceCandidate, IceCandidateEvent, IceConfig,
    IceConnectionState, JingleError, MediaStream, MediaStreamEvent, PeerConnectionFactory,
    PeerConnectionHost, SessionDescription, SignalingState, SignalingStateChangeEvent,
    StatsReport,
};
use jingle_rtc_diagnostics::{TraceKind, TraceLog};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

type Handler<E> = Arc<dyn Fn(E) + Send + Sync>;

/// Single-slot, overwritable event handler.
///
/// The host listener installed at construction dispatches through the slot;
/// with no handler set the event is dropped.
pub(crate) struct HandlerSlot<E> {
    event: &'static str,
    handler: Arc<Mutex<Option<Handler<E>>>>,
}

impl<E> Clone for HandlerSlot<E> {
    fn clone(&self) -> Self {
        Self {
            event: self.event,
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<E: 'static> HandlerSlot<E> {
    fn new(event: &'static str) -> Self {
        Self {
            event,
            handler: Arc::new(Mutex::new(None)),
        }
    }

    fn set(&self, handler: Option<Handler<E>>) {
        *self.handler.lock() = handler;
    }

    /// Whether a handler is set
    pub(crate) fn is_set(&self) -> bool {
        self.handler.lock().is_some()
    }

    fn dispatch(&self, event: E) {
        // Run the handler unlocked so it may replace itself.
        let handler = self.handler.lock().clone();
        match handler {
            Some(handler) => handler(event),
            None => debug!("Dropping {} event: no handler set", self.event),
        }
    }

    fn listener(&self) -> EventListener<E> {
        let slot = self.clone();
        Box::new(move |event| slot.dispatch(event))
    }
}

/// Peer connection wrapper that traces every interaction
pub struct TraceablePeerConnection {
    id: String,
    peerconnection: Box<dyn PeerConnectionHost>,
    trace: TraceLog,
    ice_candidate: HandlerSlot<IceCandidateEvent>,
    add_stream: HandlerSlot<MediaStreamEvent>,
    remove_stream: HandlerSlot<MediaStreamEvent>,
    signaling_state_change: HandlerSlot<SignalingStateChangeEvent>,
}

impl std::fmt::Debug for TraceablePeerConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceablePeerConnection")
            .field("id", &self.id)
            .field("trace_len", &self.trace.len())
            .finish_non_exhaustive()
    }
}

impl TraceablePeerConnection {
    /// Construct a host connection through `factory` and wrap it.
    ///
    /// # Errors
    ///
    /// [`JingleError::PeerConnectionCreation`] if the host refuses to create
    /// the connection.
    pub fn new(
        factory: &dyn PeerConnectionFactory,
        ice_config: &IceConfig,
        constraints: &ConnectionConstraints,
    ) -> Result<Self, JingleError> {
        let peerconnection = factory
            .create(ice_config, constraints)
            .map_err(|source| JingleError::PeerConnectionCreation { source })?;
        Ok(Self::from_host(peerconnection))
    }

    /// Wrap an already constructed host connection
    pub fn from_host(peerconnection: Box<dyn PeerConnectionHost>) -> Self {
        let id = format!("pc-{}", Uuid::new_v4());
        info!("🔗 Creating traced peer connection {}", id);

        let ice_candidate = HandlerSlot::new("icecandidate");
        let add_stream = HandlerSlot::new("addstream");
        let remove_stream = HandlerSlot::new("removestream");
        let signaling_state_change = HandlerSlot::new("signalingstatechange");

        peerconnection.on_ice_candidate(Some(ice_candidate.listener()));
        peerconnection.on_add_stream(Some(add_stream.listener()));
        peerconnection.on_remove_stream(Some(remove_stream.listener()));
        peerconnection.on_signaling_state_change(Some(signaling_state_change.listener()));

        Self {
            trace: TraceLog::new(id.clone()),
            id,
            peerconnection,
            ice_candidate,
            add_stream,
            remove_stream,
            signaling_state_change,
        }
    }

    /// Connection ID used in logs and as the trace label
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Call trace of this connection
    pub fn trace(&self) -> &TraceLog {
        &self.trace
    }

    /// Current signaling state
    pub fn signaling_state(&self) -> SignalingState {
        self.peerconnection.signaling_state()
    }

    /// Current ICE connection state
    pub fn ice_connection_state(&self) -> IceConnectionState {
        self.peerconnection.ice_connection_state()
    }

    /// Applied local description
    pub fn local_description(&self) -> Option<SessionDescription> {
        self.peerconnection.local_description()
    }

    /// Applied remote description
    pub fn remote_description(&self) -> Option<SessionDescription> {
        self.peerconnection.remote_description()
    }

    /// Set or clear the ICE candidate handler
    pub fn on_ice_candidate<F>(&self, f: Option<F>)
    where
        F: Fn(IceCandidateEvent) + Send + Sync + 'static,
    {
        self.ice_candidate.set(f.map(|f| Arc::new(f) as Handler<_>));
    }

    /// Set or clear the remote-stream-added handler
    pub fn on_add_stream<F>(&self, f: Option<F>)
    where
        F: Fn(MediaStreamEvent) + Send + Sync + 'static,
    {
        self.add_stream.set(f.map(|f| Arc::new(f) as Handler<_>));
    }

    /// Set or clear the remote-stream-removed handler
    pub fn on_remove_stream<F>(&self, f: Option<F>)
    where
        F: Fn(MediaStreamEvent) + Send + Sync + 'static,
    {
        self.remove_stream.set(f.map(|f| Arc::new(f) as Handler<_>));
    }

    /// Set or clear the signaling-state handler
    pub fn on_signaling_state_change<F>(&self, f: Option<F>)
    where
        F: Fn(SignalingStateChangeEvent) + Send + Sync + 'static,
    {
        self.signaling_state_change.set(f.map(|f| Arc::new(f) as Handler<_>));
    }

    /// Whether a handler is set for each event kind, in the order ICE
    /// candidate, add stream, remove stream, signaling state
    pub fn handlers_set(&self) -> [bool; 4] {
        [
            self.ice_candidate.is_set(),
            self.add_stream.is_set(),
            self.remove_stream.is_set(),
            self.signaling_state_change.is_set(),
        ]
    }

    /// Attach a local stream
    ///
    /// # Errors
    ///
    /// [`JingleError::Host`] if the host rejects the stream.
    pub fn add_stream(&self, stream: &MediaStream) -> Result<(), JingleError> {
        self.trace.record(TraceKind::AddStream, Some(stream));
        self.peerconnection
            .add_stream(stream)
            .map_err(|e| JingleError::host("addStream", e))
    }

    /// Detach a local stream
    ///
    /// # Errors
    ///
    /// [`JingleError::Host`] if the host rejects the call.
    pub fn remove_stream(&self, stream: &MediaStream) -> Result<(), JingleError> {
        self.trace.record(TraceKind::RemoveStream, Some(stream));
        self.peerconnection
            .remove_stream(stream)
            .map_err(|e| JingleError::host("removeStream", e))
    }

    /// Apply a local description
    pub fn set_local_description<S, F>(
        &self,
        description: SessionDescription,
        on_success: S,
        on_failure: F,
    ) where
        S: FnOnce() + Send + 'static,
        F: FnOnce(HostError) + Send + 'static,
    {
        self.apply_description(true, description, on_success, on_failure);
    }

    /// Apply a remote description
    pub fn set_remote_description<S, F>(
        &self,
        description: SessionDescription,
        on_success: S,
        on_failure: F,
    ) where
        S: FnOnce() + Send + 'static,
        F: FnOnce(HostError) + Send + 'static,
    {
        self.apply_description(false, description, on_success, on_failure);
    }

    /// Create an offer
    pub fn create_offer<S, F>(
        &self,
        on_success: S,
        on_failure: F,
        constraints: Option<ConnectionConstraints>,
    ) where
        S: FnOnce(SessionDescription) + Send + 'static,
        F: FnOnce(HostError) + Send + 'static,
    {
        self.create_description(true, on_success, on_failure, constraints);
    }

    /// Create an answer
    pub fn create_answer<S, F>(
        &self,
        on_success: S,
        on_failure: F,
        constraints: Option<ConnectionConstraints>,
    ) where
        S: FnOnce(SessionDescription) + Send + 'static,
        F: FnOnce(HostError) + Send + 'static,
    {
        self.create_description(false, on_success, on_failure, constraints);
    }

    /// Add a remote candidate.
    ///
    /// Fire-and-forget: no outcome continuations are attached, so a host
    /// failure is neither traced nor reported.
    pub fn add_ice_candidate(&self, candidate: IceCandidate) {
        self.trace.record(TraceKind::AddIceCandidate, Some(&candidate));
        self.peerconnection.add_ice_candidate(candidate, None, None);
    }

    /// Close the connection. Calls after this are forwarded to the closed
    /// host connection as-is.
    pub fn close(&self) {
        info!("🔌 Closing traced peer connection {}", self.id);
        self.trace.mark(TraceKind::Stop);
        self.peerconnection.close();
    }

    /// Retrieve host statistics; not traced
    pub fn get_stats<F>(&self, callback: F)
    where
        F: FnOnce(StatsReport) + Send + 'static,
    {
        self.peerconnection.get_stats(Box::new(callback));
    }

    /// Apply a local description and await the outcome
    pub async fn set_local_description_async(
        &self,
        description: SessionDescription,
    ) -> Result<(), HostError> {
        let (on_success, on_failure, outcome) = completion::<()>();
        self.set_local_description(description, move || on_success(()), on_failure);
        outcome.await
    }

    /// Apply a remote description and await the outcome
    pub async fn set_remote_description_async(
        &self,
        description: SessionDescription,
    ) -> Result<(), HostError> {
        let (on_success, on_failure, outcome) = completion::<()>();
        self.set_remote_description(description, move || on_success(()), on_failure);
        outcome.await
    }

    /// Create an offer and await it
    pub async fn create_offer_async(
        &self,
        constraints: Option<ConnectionConstraints>,
    ) -> Result<SessionDescription, HostError> {
        let (on_success, on_failure, outcome) = completion::<SessionDescription>();
        self.create_offer(on_success, on_failure, constraints);
        outcome.await
    }

    /// Create an answer and await it
    pub async fn create_answer_async(
        &self,
        constraints: Option<ConnectionConstraints>,
    ) -> Result<SessionDescription, HostError> {
        let (on_success, on_failure, outcome) = completion::<SessionDescription>();
        self.create_answer(on_success, on_failure, constraints);
        outcome.await
    }

    fn apply_description<S, F>(
        &self,
        local: bool,
        description: SessionDescription,
        on_success: S,
        on_failure: F,
    ) where
        S: FnOnce() + Send + 'static,
        F: FnOnce(HostError) + Send + 'static,
    {
        let (request, succeeded, failed) = if local {
            (
                TraceKind::SetLocalDescription,
                TraceKind::SetLocalDescriptionOnSuccess,
                TraceKind::SetLocalDescriptionOnFailure,
            )
        } else {
            (
                TraceKind::SetRemoteDescription,
                TraceKind::SetRemoteDescriptionOnSuccess,
                TraceKind::SetRemoteDescriptionOnFailure,
            )
        };

        self.trace.record(request, Some(&description));
        let success_trace = self.trace.clone();
        let failure_trace = self.trace.clone();
        let on_success = Box::new(move |()| {
            success_trace.mark(succeeded);
            on_success();
        });
        let on_failure = Box::new(move |error: HostError| {
            failure_trace.record(failed, Some(&error));
            on_failure(error);
        });

        if local {
            self.peerconnection.set_local_description(description, on_success, on_failure);
        } else {
            self.peerconnection.set_remote_description(description, on_success, on_failure);
        }
    }

    fn create_description<S, F>(
        &self,
        offer: bool,
        on_success: S,
        on_failure: F,
        constraints: Option<ConnectionConstraints>,
    ) where
        S: FnOnce(SessionDescription) + Send + 'static,
        F: FnOnce(HostError) + Send + 'static,
    {
        let (request, succeeded, failed) = if offer {
            (
                TraceKind::CreateOffer,
                TraceKind::CreateOfferOnSuccess,
                TraceKind::CreateOfferOnFailure,
            )
        } else {
            (
                TraceKind::CreateAnswer,
                TraceKind::CreateAnswerOnSuccess,
                TraceKind::CreateAnswerOnFailure,
            )
        };

        self.trace.record(request, constraints.as_ref());
        let success_trace = self.trace.clone();
        let failure_trace = self.trace.clone();
        let on_success = Box::new(move |description: SessionDescription| {
            success_trace.record(succeeded, Some(&description));
            on_success(description);
        });
        let on_failure = Box::new(move |error: HostError| {
            failure_trace.record(failed, Some(&error));
            on_failure(error);
        });

        if offer {
            self.peerconnection.create_offer(on_success, on_failure, constraints);
        } else {
            self.peerconnection.create_answer(on_success, on_failure, constraints);
        }
    }
}

/// Continuation pair resolving a future
#[allow(clippy::type_complexity)]
fn completion<T: Send + 'static>() -> (
    impl FnOnce(T) + Send + 'static,
    impl FnOnce(HostError) + Send + 'static,
    impl std::future::Future<Output = Result<T, HostError>>,
) {
    let (tx, rx) = oneshot::channel::<Result<T, HostError>>();
    let tx = Arc::new(Mutex::new(Some(tx)));
    let failure_tx = Arc::clone(&tx);

    let on_success = move |value: T| {
        if let Some(tx) = tx.lock().take() {
            let _ = tx.send(Ok(value));
        }
    };
    let on_failure = move |error: HostError| {
        if let Some(tx) = failure_tx.lock().take() {
            let _ = tx.send(Err(error));
        }
    };
    let outcome = async move {
        rx.await.unwrap_or_else(|_| {
            Err(HostError::new(
                "AbortError",
                "host dropped the operation without completing it",
            ))
        })
    };
    (on_success, on_failure, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jingle_rtc_core::testing::FakePeerConnection;

    #[test]
    fn test_construction_installs_all_listeners() {
        let host = FakePeerConnection::new();
        let pc = TraceablePeerConnection::from_host(Box::new(host.clone()));

        assert_eq!(host.installed_listeners(), [true; 4]);
        assert_eq!(pc.handlers_set(), [false; 4]);
        assert!(pc.trace().is_empty());
        assert!(pc.id().starts_with("pc-"));
    }

    #[test]
    fn test_handler_may_clear_itself() {
        let host = FakePeerConnection::new();
        let pc = Arc::new(TraceablePeerConnection::from_host(Box::new(host.clone())));
        let weak = Arc::downgrade(&pc);
        pc.on_ice_candidate(Some(move |_event: IceCandidateEvent| {
            if let Some(pc) = weak.upgrade() {
                pc.on_ice_candidate(None::<fn(IceCandidateEvent)>);
            }
        }));

        host.emit_ice_candidate(IceCandidateEvent { candidate: None });
        assert_eq!(pc.handlers_set(), [false; 4]);
    }
}
