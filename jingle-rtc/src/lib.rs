//! # Jingle RTC - WebRTC compatibility layer
//!
//! Hides the differences between browser families' peer connection and media
//! capture bindings behind one API:
//!
//! - **Capability detection**: resolve the host once into a Firefox-family,
//!   Chromium-family or unsupported profile
//! - **Traced peer connections**: every call and outcome lands in an
//!   inspectable, serializable trace
//! - **Constraint building**: coarse capture parameters become the vendor
//!   constraint object, with a mobile fallback
//! - **Capture events**: capture outcomes are published as
//!   `mediaready.jingle` / `mediafailure.jingle`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use jingle_rtc::{ConstraintBuilder, Jingle, MediaEvent, PeerConfig};
//! # use jingle_rtc::HostEnvironment;
//!
//! # async fn example(host: &dyn HostEnvironment) -> Result<(), jingle_rtc::JingleError> {
//! let jingle = Jingle::init(host)?;
//! let mut events = jingle.events();
//!
//! jingle.get_user_media(&ConstraintBuilder::from_tokens(["audio", "video"]).resolution("720"));
//! if let Some(MediaEvent::MediaReady { stream }) = events.next().await {
//!     let pc = jingle.peer_connection(PeerConfig::default())?;
//!     pc.add_stream(&stream)?;
//!     let offer = pc.create_offer_async(None).await;
//!     println!("{:?}, trace: {}", offer, pc.trace().to_json()?);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

pub use jingle_rtc_core::{
    AudioConstraints, ConnectionConstraints, HostBindings, HostEnvironment, HostError,
    IceCandidate, IceCandidateEvent, IceConfig, IceConnectionState, IceServer, JingleError,
    MediaCapture, MediaConstraints, MediaElement, MediaKind, MediaStream, MediaStreamEvent,
    MediaStreamTrack, ObjectUrlFactory, PeerConnectionFactory, PeerConnectionHost, SdpType,
    SessionDescription, SignalingState, SignalingStateChangeEvent, StatsReport,
    VideoConstraints,
};

pub use jingle_rtc_media::{
    build_constraints, detect_once, AttachStrategy, Browser, CapabilityDetector,
    CapabilityProfile, ConstraintBuilder, ErrorCategory, MediaError, MediaResult, Platform,
    RequestedMedia, ResolutionTier, RtcProfile, TrackAccess,
};

pub use jingle_rtc_diagnostics::{
    DebugLogger, TraceAnalyzer, TraceEntry, TraceKind, TraceLog, TraceSink, TraceSummary,
};

pub mod capture;
pub mod config;
pub mod event;
pub mod peer;

pub use capture::get_user_media_with_constraints;
pub use config::{GlobalConfig, PeerConfig};
pub use event::{
    MediaEvent, MediaEventBus, MediaEventHandler, MediaEventStream, MEDIA_FAILURE, MEDIA_READY,
};
pub use peer::TraceablePeerConnection;

use std::sync::Arc;
use tracing::{debug, info};

/// Main entry point
#[derive(Debug, Clone)]
pub struct Jingle {
    inner: Arc<JingleInner>,
}

#[derive(Debug)]
struct JingleInner {
    config: GlobalConfig,
    user_agent: String,
    profile: CapabilityProfile,
    events: MediaEventBus,
}

impl Jingle {
    /// Initialize with default settings
    ///
    /// # Errors
    ///
    /// See [`init_with`](Self::init_with).
    pub fn init(env: &dyn HostEnvironment) -> Result<Self, JingleError> {
        Self::init_with(GlobalConfig::default(), env)
    }

    /// Initialize with custom global configuration.
    ///
    /// Detects the host profile. An unsupported host is not an error: the
    /// instance still works and reports failure from each media operation.
    ///
    /// # Errors
    ///
    /// [`JingleError::Configuration`] if `config` is invalid.
    pub fn init_with(config: GlobalConfig, env: &dyn HostEnvironment) -> Result<Self, JingleError> {
        config.validate()?;

        if config.debug_logging {
            // Embedders may already own the global subscriber.
            if let Err(e) = DebugLogger::with_filter(config.log_filter.clone()).install() {
                debug!("Keeping existing subscriber: {}", e);
            }
        }

        let user_agent = config
            .user_agent_override
            .clone()
            .unwrap_or_else(|| env.user_agent());
        let profile = CapabilityDetector::with_min_firefox_version(config.min_firefox_version)
            .detect_with_user_agent(env, &user_agent);
        info!(
            "🚀 Jingle initialized: {}",
            profile.browser().map_or("unsupported", |b| b.as_str())
        );

        Ok(Self {
            inner: Arc::new(JingleInner {
                events: MediaEventBus::new(config.event_capacity),
                config,
                user_agent,
                profile,
            }),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &GlobalConfig {
        &self.inner.config
    }

    /// User agent used for detection
    pub fn user_agent(&self) -> &str {
        &self.inner.user_agent
    }

    /// Detected profile
    pub fn profile(&self) -> &CapabilityProfile {
        &self.inner.profile
    }

    /// Whether the host supports real-time media
    pub fn is_supported(&self) -> bool {
        self.inner.profile.is_supported()
    }

    /// Subscribe to capture events
    pub fn events(&self) -> MediaEventStream {
        self.inner.events.subscribe()
    }

    /// Bus carrying capture events
    pub fn event_bus(&self) -> &MediaEventBus {
        &self.inner.events
    }

    /// Create a traced peer connection.
    ///
    /// Without explicit constraints in `config` the profile's defaults apply.
    ///
    /// # Errors
    ///
    /// [`JingleError::Unsupported`] on an unsupported host, or
    /// [`JingleError::PeerConnectionCreation`] if the host refuses.
    pub fn peer_connection(
        &self,
        config: PeerConfig,
    ) -> Result<TraceablePeerConnection, JingleError> {
        let rtc = self.rtc()?;
        let constraints = config
            .constraints
            .unwrap_or_else(|| rtc.pc_constraints().clone());
        TraceablePeerConnection::new(rtc.peer_connection().as_ref(), &config.ice, &constraints)
    }

    /// Request local media; the outcome arrives on [`events`](Self::events)
    pub fn get_user_media(&self, request: &ConstraintBuilder) -> Option<MediaConstraints> {
        get_user_media_with_constraints(&self.inner.profile, request, &self.inner.events)
    }

    /// Attach a stream to a media element
    ///
    /// # Errors
    ///
    /// Any [`MediaError`] from the profile's attach strategy.
    pub fn attach_media_stream(
        &self,
        element: &mut dyn MediaElement,
        stream: &MediaStream,
    ) -> MediaResult<()> {
        self.inner.profile.attach_media_stream(element, stream)
    }

    fn rtc(&self) -> Result<&RtcProfile, JingleError> {
        self.inner
            .profile
            .rtc()
            .ok_or_else(|| JingleError::Unsupported {
                user_agent: self.inner.user_agent.clone(),
            })
    }
}
