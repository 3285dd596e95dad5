//! Tests for capture constraint building
//!
//! Covers media kind selection, resolution tiers, the mobile fallback, and the
//! bandwidth / frame-rate hints, checked both as values and as the vendor
//! object sent to the host.

use jingle_rtc_core::VideoSource;
use jingle_rtc_media::*;
use serde_json::json;

// ============================================================================
// MEDIA KINDS
// ============================================================================

#[test]
fn test_hd_video_without_audio() {
    let constraints = build_constraints(&["video"], Some("720"), None, None, Platform::desktop());

    assert!(!constraints.requests_audio());
    let video = constraints.video.as_ref().expect("video requested");
    assert_eq!(video.mandatory.min_width, Some(1280));
    assert_eq!(video.mandatory.min_height, Some(720));
    assert_eq!(video.mandatory.min_aspect_ratio, Some(1.77));
    assert!(!video.is_screen());
}

#[test]
fn test_audio_and_vga_video() {
    for tag in ["vga", "640"] {
        let constraints =
            build_constraints(&["audio", "video"], Some(tag), None, None, Platform::desktop());

        assert!(constraints.requests_audio());
        let video = constraints.video.as_ref().expect("video requested");
        assert_eq!(video.mandatory.min_width, Some(640));
        assert_eq!(video.mandatory.min_height, Some(480));
        assert_eq!(video.mandatory.min_aspect_ratio, None);
    }
}

#[test]
fn test_screen_request_is_screen_directive() {
    for resolution in [None, Some("720"), Some("vga"), Some("unknown")] {
        let constraints =
            build_constraints(&["screen"], resolution, None, None, Platform::desktop());
        let video = constraints.video.as_ref().expect("video requested");
        assert!(video.is_screen());
        assert_eq!(video.mandatory.chrome_media_source, Some(VideoSource::Screen));
    }
}

#[test]
fn test_screen_wins_over_video() {
    for kinds in [["video", "screen"], ["screen", "video"]] {
        let constraints = build_constraints(&kinds, None, None, None, Platform::desktop());
        assert!(constraints.video.as_ref().unwrap().is_screen());
    }
}

#[test]
fn test_audio_only_on_desktop_has_no_video() {
    let constraints = build_constraints(&["audio"], None, None, None, Platform::desktop());
    assert!(constraints.requests_audio());
    assert!(!constraints.requests_video());
    assert_eq!(
        serde_json::to_value(&constraints).unwrap(),
        json!({"audio": {}, "video": false})
    );
}

#[test]
fn test_nothing_requested() {
    let constraints = build_constraints::<&str>(&[], None, None, None, Platform::desktop());
    assert!(constraints.is_empty());
    let mobile = build_constraints::<&str>(&[], None, None, None, Platform::mobile());
    assert!(mobile.is_empty());
}

// ============================================================================
// RESOLUTION TIERS
// ============================================================================

#[test]
fn test_widescreen_tiers() {
    let table = [
        ("1080", 1920, 1080),
        ("fullhd", 1920, 1080),
        ("720", 1280, 720),
        ("hd", 1280, 720),
        ("360", 640, 360),
        ("180", 320, 180),
    ];
    for (tag, width, height) in table {
        let video = build_constraints(&["video"], Some(tag), None, None, Platform::desktop())
            .video
            .unwrap();
        assert_eq!(video.mandatory.min_width, Some(width), "tier {}", tag);
        assert_eq!(video.mandatory.min_height, Some(height), "tier {}", tag);
        assert_eq!(video.mandatory.min_aspect_ratio, Some(1.77), "tier {}", tag);
    }
}

#[test]
fn test_standard_tiers() {
    let table = [("960", 960, 720), ("640", 640, 480), ("vga", 640, 480), ("320", 320, 240)];
    for (tag, width, height) in table {
        let video = build_constraints(&["video"], Some(tag), None, None, Platform::desktop())
            .video
            .unwrap();
        assert_eq!(video.mandatory.min_width, Some(width), "tier {}", tag);
        assert_eq!(video.mandatory.min_height, Some(height), "tier {}", tag);
        assert_eq!(video.mandatory.min_aspect_ratio, None, "tier {}", tag);
    }
}

#[test]
fn test_resolution_forces_video_on() {
    let constraints = build_constraints(&["audio"], Some("360"), None, None, Platform::desktop());
    assert!(constraints.requests_audio());
    assert_eq!(constraints.video.unwrap().mandatory.min_width, Some(640));

    // An unrecognized tier still turns video on, with no size constraint.
    let constraints = build_constraints(&["audio"], Some("8k"), None, None, Platform::desktop());
    let video = constraints.video.unwrap();
    assert_eq!(video.mandatory.min_width, None);
    assert_eq!(video.mandatory.max_frame_rate, None);
}

#[test]
fn test_mobile_fallback() {
    let constraints = build_constraints(&["video"], None, None, None, Platform::mobile());
    let video = constraints.video.unwrap();
    assert_eq!(video.mandatory.min_width, Some(320));
    assert_eq!(video.mandatory.min_height, Some(240));
    assert_eq!(video.mandatory.max_frame_rate, Some(15));

    let constraints = build_constraints(&["video"], Some("8k"), None, None, Platform::mobile());
    assert_eq!(constraints.video.unwrap().mandatory.max_frame_rate, Some(15));

    // Audio-only requests get the low-resolution video default on mobile.
    let constraints = build_constraints(&["audio"], None, None, None, Platform::mobile());
    assert!(constraints.requests_audio());
    assert_eq!(constraints.video.unwrap().mandatory.min_width, Some(320));
}

#[test]
fn test_known_tier_skips_mobile_fallback() {
    let video = build_constraints(&["video"], Some("hd"), None, None, Platform::mobile())
        .video
        .unwrap();
    assert_eq!(video.mandatory.min_width, Some(1280));
    assert_eq!(video.mandatory.max_frame_rate, None);
}

// ============================================================================
// BANDWIDTH AND FRAME RATE
// ============================================================================

#[test]
fn test_frame_rate_forces_video_on() {
    let constraints = build_constraints::<&str>(&[], None, None, Some(30), Platform::desktop());
    let video = constraints.video.expect("frame rate forces video");
    assert_eq!(video.mandatory.min_frame_rate, Some(30));
    assert!(constraints.audio.is_none());
}

#[test]
fn test_bandwidth_is_optional_hint() {
    let constraints =
        build_constraints(&["video"], Some("720"), Some(512), None, Platform::desktop());
    let video = constraints.video.as_ref().unwrap();
    assert_eq!(video.bandwidth(), Some(512));
    assert_eq!(video.mandatory.min_width, Some(1280));

    let bandwidth_only = build_constraints::<&str>(&[], None, Some(256), None, Platform::desktop());
    assert_eq!(bandwidth_only.video.unwrap().bandwidth(), Some(256));
}

#[test]
fn test_full_vendor_object() {
    let constraints = ConstraintBuilder::from_tokens(["audio", "video"])
        .resolution("hd")
        .bandwidth(1000)
        .frame_rate(30)
        .build(Platform::desktop());

    assert_eq!(
        serde_json::to_value(&constraints).unwrap(),
        json!({
            "audio": {},
            "video": {
                "mandatory": {
                    "minWidth": 1280,
                    "minHeight": 720,
                    "minAspectRatio": 1.77,
                    "minFrameRate": 30
                },
                "optional": [{"bandwidth": 1000}]
            }
        })
    );
}

#[test]
fn test_build_is_deterministic() {
    let builder = ConstraintBuilder::from_tokens(["screen", "audio"])
        .resolution("180")
        .frame_rate(5);
    assert_eq!(builder.build(Platform::mobile()), builder.build(Platform::mobile()));
    assert_eq!(builder.build(Platform::desktop()), builder.build(Platform::desktop()));
}
