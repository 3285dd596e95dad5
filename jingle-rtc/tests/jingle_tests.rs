//! Integration tests for initialization, capture and media events

use jingle_rtc::*;
use jingle_rtc_core::testing::*;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Route library logs to the test harness output
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("jingle_rtc=debug")
        .try_init();
}

fn chrome(user_agent: &str, capture: FakeCapture) -> (FakeEnvironment, FakeFactory) {
    let factory = FakeFactory::new();
    (
        FakeEnvironment::chrome(user_agent, factory.clone(), capture),
        factory,
    )
}

fn firefox(capture: FakeCapture) -> (FakeEnvironment, FakeFactory) {
    let factory = FakeFactory::new();
    (
        FakeEnvironment::firefox(FIREFOX_UA, factory.clone(), capture),
        factory,
    )
}

// ============================================================================
// INITIALIZATION
// ============================================================================

#[test]
fn test_init_detects_profile() {
    init_logging();
    let (env, _) = chrome(CHROME_UA, FakeCapture::succeeding(sample_stream("local")));
    let jingle = Jingle::init(&env).unwrap();

    assert!(jingle.is_supported());
    assert_eq!(jingle.profile().browser(), Some(Browser::Chrome));
    assert_eq!(jingle.user_agent(), CHROME_UA);
}

#[test]
fn test_init_on_unsupported_host_succeeds() {
    let jingle = Jingle::init(&FakeEnvironment::unsupported(UNSUPPORTED_UA)).unwrap();
    assert!(!jingle.is_supported());

    let err = jingle.peer_connection(PeerConfig::default()).unwrap_err();
    assert!(matches!(err, JingleError::Unsupported { .. }));
    assert_eq!(err.error_code(), "UNSUPPORTED_ENVIRONMENT");
}

#[test]
fn test_config_overrides_detection_inputs() {
    let (env, _) = chrome(CHROME_UA, FakeCapture::succeeding(sample_stream("local")));
    let config = GlobalConfig {
        user_agent_override: Some(CHROME_ANDROID_UA.to_string()),
        ..Default::default()
    };
    let jingle = Jingle::init_with(config, &env).unwrap();
    assert!(jingle.profile().rtc().unwrap().platform().is_mobile());

    let (env, _) = firefox(FakeCapture::succeeding(sample_stream("local")));
    let config = GlobalConfig::from_json(r#"{"min_firefox_version": 30}"#).unwrap();
    let jingle = Jingle::init_with(config, &env).unwrap();
    assert!(!jingle.is_supported());
}

#[test]
fn test_invalid_config_is_rejected() {
    let env = FakeEnvironment::unsupported(UNSUPPORTED_UA);
    let config = GlobalConfig {
        event_capacity: 0,
        ..Default::default()
    };
    let err = Jingle::init_with(config, &env).unwrap_err();
    assert!(matches!(err, JingleError::Configuration { .. }));
}

#[test]
fn test_peer_connection_uses_profile_constraints() {
    let (env, factory) = chrome(CHROME_UA, FakeCapture::succeeding(sample_stream("local")));
    let jingle = Jingle::init(&env).unwrap();

    let pc = jingle
        .peer_connection(PeerConfig::new(IceConfig::with_stun("stun:stun.example.org")))
        .unwrap();
    assert!(pc.trace().is_empty());
    assert_eq!(
        factory.last_constraints(),
        Some(ConnectionConstraints::dtls_srtp_key_agreement())
    );

    let custom = ConnectionConstraints::empty().with_optional("googIPv6", true);
    jingle
        .peer_connection(PeerConfig::default().with_constraints(custom.clone()))
        .unwrap();
    assert_eq!(factory.last_constraints(), Some(custom));
    assert_eq!(factory.created_count(), 2);
}

#[test]
fn test_firefox_peer_connection_has_no_default_constraints() {
    let (env, factory) = firefox(FakeCapture::succeeding(sample_stream("local")));
    let jingle = Jingle::init(&env).unwrap();
    jingle.peer_connection(PeerConfig::default()).unwrap();
    assert_eq!(factory.last_constraints(), Some(ConnectionConstraints::empty()));
}

// ============================================================================
// CAPTURE
// ============================================================================

#[tokio::test]
async fn test_capture_success_publishes_media_ready() {
    init_logging();
    let capture = FakeCapture::succeeding(sample_stream("local"));
    let (env, _) = chrome(CHROME_UA, capture.clone());
    let jingle = Jingle::init(&env).unwrap();
    let mut events = jingle.events();

    let sent = jingle
        .get_user_media(&ConstraintBuilder::from_tokens(["audio", "video"]).resolution("720"))
        .unwrap();

    let event = events.next().await.unwrap();
    assert_eq!(event.event_type(), MEDIA_READY);
    assert_eq!(event.stream().map(|s| s.id.as_str()), Some("local"));
    assert_eq!(capture.requests(), vec![sent]);
    assert_eq!(events.try_next().unwrap(), None);
}

#[tokio::test]
async fn test_capture_failure_publishes_media_failure() {
    init_logging();
    let capture = FakeCapture::failing(HostError::new("PermissionDeniedError", "denied"));
    let (env, _) = chrome(CHROME_UA, capture);
    let jingle = Jingle::init(&env).unwrap();
    let mut events = jingle.events();

    jingle.get_user_media(&ConstraintBuilder::from_tokens(["video"]));

    let event = events.next().await.unwrap();
    assert_eq!(event, MediaEvent::MediaFailed);
    assert_eq!(event.event_type(), MEDIA_FAILURE);
    assert_eq!(events.try_next().unwrap(), None);
}

#[tokio::test]
async fn test_capture_on_unsupported_host_fails() {
    let jingle = Jingle::init(&FakeEnvironment::unsupported(UNSUPPORTED_UA)).unwrap();
    let mut events = jingle.events();

    assert!(jingle
        .get_user_media(&ConstraintBuilder::from_tokens(["audio"]))
        .is_none());
    assert_eq!(events.next().await, Some(MediaEvent::MediaFailed));
}

#[test]
fn test_capture_uses_detected_platform() {
    let capture = FakeCapture::succeeding(sample_stream("local"));
    let (env, _) = chrome(CHROME_ANDROID_UA, capture.clone());
    let jingle = Jingle::init(&env).unwrap();

    jingle.get_user_media(&ConstraintBuilder::from_tokens(["audio"]));

    let requests = capture.requests();
    let video = requests[0].video.as_ref().expect("mobile fallback adds video");
    assert_eq!(video.mandatory.min_width, Some(320));
    assert_eq!(video.mandatory.max_frame_rate, Some(15));
}

#[test]
fn test_captured_legacy_stream_is_adapted() {
    init_logging();
    let legacy = MediaStream::legacy("legacy", sample_stream("x").video_tracks.unwrap());

    let (env, _) = chrome(CHROME_UA, FakeCapture::succeeding(legacy.clone()));
    let jingle = Jingle::init(&env).unwrap();
    let mut events = jingle.events();
    jingle.get_user_media(&ConstraintBuilder::from_tokens(["video"]));
    let stream = events.try_next().unwrap().unwrap().stream().cloned().unwrap();
    assert_eq!(stream.video_tracks.map(|t| t.len()), Some(1));
    assert_eq!(stream.audio_tracks, Some(Vec::new()));

    let (env, _) = firefox(FakeCapture::succeeding(legacy));
    let jingle = Jingle::init(&env).unwrap();
    let mut events = jingle.events();
    jingle.get_user_media(&ConstraintBuilder::from_tokens(["video"]));
    let stream = events.try_next().unwrap().unwrap().stream().cloned().unwrap();
    assert_eq!(stream.video_tracks, Some(Vec::new()));
}

// ============================================================================
// EVENT DELIVERY
// ============================================================================

#[tokio::test]
async fn test_all_subscribers_see_capture_outcome() {
    let (env, _) = chrome(CHROME_UA, FakeCapture::succeeding(sample_stream("local")));
    let jingle = Jingle::init(&env).unwrap();
    let mut first = jingle.events();
    let mut second = jingle.events();
    assert_eq!(jingle.event_bus().subscriber_count(), 2);

    jingle.get_user_media(&ConstraintBuilder::from_tokens(["audio"]));

    assert!(first.next().await.unwrap().is_ready());
    assert!(second.next().await.unwrap().is_ready());
}

#[tokio::test]
async fn test_callback_handler_receives_events() {
    let (env, _) = chrome(CHROME_UA, FakeCapture::succeeding(sample_stream("local")));
    let jingle = Jingle::init(&env).unwrap();
    let received = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&received);
    let handler = MediaEventHandler::spawn(jingle.events(), move |event| {
        sink.lock().push(event.event_type())
    });

    jingle.get_user_media(&ConstraintBuilder::from_tokens(["video"]));
    jingle.event_bus().publish(MediaEvent::MediaFailed);

    tokio::time::timeout(Duration::from_secs(1), async {
        while received.lock().len() < 2 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("handler saw both events");

    assert_eq!(*received.lock(), vec![MEDIA_READY, MEDIA_FAILURE]);
    handler.stop();
}

// ============================================================================
// ATTACHMENT
// ============================================================================

#[test]
fn test_logging_does_not_change_outcomes() {
    init_logging();
    init_logging();

    let capture = FakeCapture::failing(HostError::new("NotFoundError", "no camera"));
    let (env, _) = chrome(CHROME_UA, capture);
    let jingle = Jingle::init(&env).unwrap();
    let mut events = jingle.events();

    jingle.get_user_media(&ConstraintBuilder::from_tokens(["video"]));
    assert_eq!(events.try_next().unwrap(), Some(MediaEvent::MediaFailed));
    assert_eq!(events.try_next().unwrap(), None);
}

#[test]
fn test_attach_through_entry_point() {
    let (env, _) = chrome(CHROME_UA, FakeCapture::succeeding(sample_stream("local")));
    let jingle = Jingle::init(&env).unwrap();
    let mut element = FakeElement::default();

    jingle
        .attach_media_stream(&mut element, &sample_stream("remote"))
        .unwrap();
    assert_eq!(element.attribute("src"), Some("blob:fake/remote"));

    let unsupported = Jingle::init(&FakeEnvironment::unsupported(UNSUPPORTED_UA)).unwrap();
    let err = unsupported
        .attach_media_stream(&mut element, &sample_stream("remote"))
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Platform);
}
