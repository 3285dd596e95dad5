//! Host capability detection
//!
//! Inspects the user agent and the vendor-prefixed bindings a host exposes and
//! resolves them, once, into a [`CapabilityProfile`]. Everything downstream
//! works from the profile instead of probing the host again.

use crate::error::{MediaError, MediaResult};
use crate::track_access::TrackAccess;
use jingle_rtc_core::{
    ConnectionConstraints, HostBindings, HostEnvironment, MediaCapture, MediaElement,
    MediaStream, ObjectUrlFactory, PeerConnectionFactory,
};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

/// Oldest Firefox release with a usable peer connection
pub const MIN_FIREFOX_VERSION: u32 = 22;

/// Browser family tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    /// Firefox family
    Firefox,
    /// Chromium family
    Chrome,
}

impl Browser {
    /// Tag string
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Firefox => "firefox",
            Browser::Chrome => "chrome",
        }
    }
}

/// Platform tag derived from the user agent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Platform {
    mobile: bool,
}

impl Platform {
    /// Desktop platform
    pub const fn desktop() -> Self {
        Self { mobile: false }
    }

    /// Mobile platform
    pub const fn mobile() -> Self {
        Self { mobile: true }
    }

    /// Classify a user agent; only Android is treated as mobile
    pub fn from_user_agent(user_agent: &str) -> Self {
        Self {
            mobile: user_agent.contains("Android"),
        }
    }

    /// Whether this is a mobile platform
    pub fn is_mobile(&self) -> bool {
        self.mobile
    }
}

/// How a captured stream is attached to a media element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachStrategy {
    /// Assign the element's source object, then start playback
    SourceObject,
    /// Point the element's `src` attribute at an object URL
    ObjectUrl,
}

/// Bindings and defaults of a supported browser family
#[derive(Clone)]
pub struct RtcProfile {
    browser: Browser,
    version: Option<u32>,
    platform: Platform,
    peer_connection: Arc<dyn PeerConnectionFactory>,
    media_capture: Arc<dyn MediaCapture>,
    object_urls: Option<Arc<dyn ObjectUrlFactory>>,
    attach: AttachStrategy,
    pc_constraints: ConnectionConstraints,
    track_access: TrackAccess,
}

impl fmt::Debug for RtcProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RtcProfile")
            .field("browser", &self.browser)
            .field("version", &self.version)
            .field("platform", &self.platform)
            .field("attach", &self.attach)
            .field("pc_constraints", &self.pc_constraints)
            .field("track_access", &self.track_access)
            .finish_non_exhaustive()
    }
}

impl RtcProfile {
    fn firefox(bindings: HostBindings, version: u32, platform: Platform) -> Self {
        Self {
            browser: Browser::Firefox,
            version: Some(version),
            platform,
            peer_connection: bindings.peer_connection,
            media_capture: bindings.media_capture,
            object_urls: bindings.object_urls,
            attach: AttachStrategy::SourceObject,
            pc_constraints: ConnectionConstraints::empty(),
            track_access: TrackAccess::EmptyFallback,
        }
    }

    fn chromium(bindings: HostBindings, platform: Platform) -> Self {
        // DTLS-SRTP breaks calls on Android builds.
        let pc_constraints = if platform.is_mobile() {
            ConnectionConstraints::empty()
        } else {
            ConnectionConstraints::dtls_srtp_key_agreement()
        };
        Self {
            browser: Browser::Chrome,
            version: None,
            platform,
            peer_connection: bindings.peer_connection,
            media_capture: bindings.media_capture,
            object_urls: bindings.object_urls,
            attach: AttachStrategy::ObjectUrl,
            pc_constraints,
            track_access: TrackAccess::LegacyFields,
        }
    }

    /// Browser tag
    pub fn browser(&self) -> Browser {
        self.browser
    }

    /// Detected major version, when the family reports one
    pub fn version(&self) -> Option<u32> {
        self.version
    }

    /// Platform tag
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Peer connection constructor
    pub fn peer_connection(&self) -> &Arc<dyn PeerConnectionFactory> {
        &self.peer_connection
    }

    /// Capture function
    pub fn media_capture(&self) -> &Arc<dyn MediaCapture> {
        &self.media_capture
    }

    /// Attach strategy
    pub fn attach_strategy(&self) -> AttachStrategy {
        self.attach
    }

    /// Default peer connection constraints
    pub fn pc_constraints(&self) -> &ConnectionConstraints {
        &self.pc_constraints
    }

    /// Track accessor fallback
    pub fn track_access(&self) -> TrackAccess {
        self.track_access
    }

    /// Guarantee the track accessors on a host stream
    pub fn adapt_stream(&self, stream: MediaStream) -> MediaStream {
        self.track_access.adapt(stream)
    }

    /// Attach `stream` to `element` the way this browser family expects
    pub fn attach_media_stream(
        &self,
        element: &mut dyn MediaElement,
        stream: &MediaStream,
    ) -> MediaResult<()> {
        match self.attach {
            AttachStrategy::SourceObject => {
                element.set_source_object(stream);
                element.play().map_err(|source| MediaError::AttachFailed {
                    stream_id: stream.id.clone(),
                    source,
                })
            }
            AttachStrategy::ObjectUrl => {
                let urls = self
                    .object_urls
                    .as_ref()
                    .ok_or_else(|| MediaError::ResourceNotAvailable {
                        resource: "object URL factory".to_string(),
                    })?;
                element.set_attribute("src", &urls.create_object_url(stream));
                Ok(())
            }
        }
    }
}

/// Resolved host capabilities
#[derive(Debug, Clone)]
pub enum CapabilityProfile {
    /// No supported bindings; real-time media is unavailable
    Unsupported,
    /// Firefox family at or above [`MIN_FIREFOX_VERSION`]
    FirefoxFamily(RtcProfile),
    /// Chromium family
    ChromiumFamily(RtcProfile),
}

impl CapabilityProfile {
    /// Bindings of a supported profile
    pub fn rtc(&self) -> Option<&RtcProfile> {
        match self {
            CapabilityProfile::Unsupported => None,
            CapabilityProfile::FirefoxFamily(profile)
            | CapabilityProfile::ChromiumFamily(profile) => Some(profile),
        }
    }

    /// Whether real-time media is available
    pub fn is_supported(&self) -> bool {
        self.rtc().is_some()
    }

    /// Browser tag of a supported profile
    pub fn browser(&self) -> Option<Browser> {
        self.rtc().map(RtcProfile::browser)
    }

    /// Attach a stream, failing on an unsupported profile
    pub fn attach_media_stream(
        &self,
        element: &mut dyn MediaElement,
        stream: &MediaStream,
    ) -> MediaResult<()> {
        match self.rtc() {
            Some(profile) => profile.attach_media_stream(element, stream),
            None => Err(MediaError::UnsupportedPlatform {
                platform: "no WebRTC bindings".to_string(),
            }),
        }
    }
}

/// Extract the major version from the first well-formed
/// `Firefox/<major>.<minor>` token
pub fn firefox_version(user_agent: &str) -> Option<u32> {
    const TOKEN: &str = "Firefox/";

    user_agent
        .match_indices(TOKEN)
        .find_map(|(at, _)| major_version(&user_agent[at + TOKEN.len()..]))
}

fn major_version(rest: &str) -> Option<u32> {
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 || !rest[digits_end..].starts_with('.') {
        return None;
    }
    rest[..digits_end].parse().ok()
}

/// Selects a [`CapabilityProfile`] from a host environment
#[derive(Debug, Clone)]
pub struct CapabilityDetector {
    min_firefox_version: u32,
}

impl Default for CapabilityDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl CapabilityDetector {
    /// Detector with the stock minimum Firefox version
    pub fn new() -> Self {
        Self {
            min_firefox_version: MIN_FIREFOX_VERSION,
        }
    }

    /// Detector with a custom minimum Firefox version
    pub fn with_min_firefox_version(min_firefox_version: u32) -> Self {
        Self {
            min_firefox_version,
        }
    }

    /// Inspect `env` and resolve its profile. Never fails: an unusable
    /// environment resolves to [`CapabilityProfile::Unsupported`].
    pub fn detect(&self, env: &dyn HostEnvironment) -> CapabilityProfile {
        self.detect_with_user_agent(env, &env.user_agent())
    }

    /// Like [`detect`](Self::detect) but with an overriding user agent
    pub fn detect_with_user_agent(
        &self,
        env: &dyn HostEnvironment,
        user_agent: &str,
    ) -> CapabilityProfile {
        let platform = Platform::from_user_agent(user_agent);

        if let Some(bindings) = env.firefox_bindings() {
            info!("🦊 This appears to be Firefox");
            return match firefox_version(user_agent) {
                Some(version) if version >= self.min_firefox_version => {
                    CapabilityProfile::FirefoxFamily(RtcProfile::firefox(
                        bindings, version, platform,
                    ))
                }
                Some(version) => {
                    warn!(
                        "Firefox {} is older than the supported minimum {}",
                        version, self.min_firefox_version
                    );
                    CapabilityProfile::Unsupported
                }
                None => {
                    warn!("Could not parse a Firefox version from '{}'", user_agent);
                    CapabilityProfile::Unsupported
                }
            };
        }

        if let Some(bindings) = env.webkit_bindings() {
            info!("🌐 This appears to be Chrome");
            return CapabilityProfile::ChromiumFamily(RtcProfile::chromium(bindings, platform));
        }

        warn!("Browser does not appear to be WebRTC-capable");
        CapabilityProfile::Unsupported
    }
}

static PROCESS_PROFILE: OnceLock<CapabilityProfile> = OnceLock::new();

/// Detect the profile on first call and return the cached one afterwards.
///
/// Later calls ignore `env`.
pub fn detect_once(env: &dyn HostEnvironment) -> &'static CapabilityProfile {
    PROCESS_PROFILE.get_or_init(|| CapabilityDetector::new().detect(env))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_firefox_version_parsing() {
        assert_eq!(
            firefox_version("Mozilla/5.0 (rv:24.0) Gecko/20100101 Firefox/24.0"),
            Some(24)
        );
        assert_eq!(firefox_version("Firefox/120.1 Something"), Some(120));
        assert_eq!(firefox_version("Firefox/24"), None);
        assert_eq!(firefox_version("Firefox/.0"), None);
        assert_eq!(firefox_version("Chrome/28.0"), None);
    }

    #[test]
    fn test_firefox_version_skips_malformed_tokens() {
        assert_eq!(firefox_version("Firefox/abc Firefox/25.0"), Some(25));
        assert_eq!(firefox_version("Firefox/24 Gecko Firefox/30.1"), Some(30));
        assert_eq!(firefox_version("Firefox/22.0 Firefox/40.0"), Some(22));
        assert_eq!(firefox_version("Firefox/ Firefox/x"), None);
    }

    #[test]
    fn test_platform_from_user_agent() {
        assert!(Platform::from_user_agent("Linux; Android 4.2.2").is_mobile());
        assert!(!Platform::from_user_agent("X11; Linux x86_64").is_mobile());
        assert_eq!(Platform::default(), Platform::desktop());
    }

    #[test]
    fn test_browser_tags() {
        assert_eq!(Browser::Firefox.as_str(), "firefox");
        assert_eq!(Browser::Chrome.as_str(), "chrome");
    }
}
