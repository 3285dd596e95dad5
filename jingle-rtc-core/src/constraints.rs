//! Media capture constraints in the legacy vendor shape
//!
//! Serializes to the object legacy `getUserMedia` implementations expect:
//! `{"audio": false | {}, "video": false | {"mandatory": {..}, "optional": [..]}}`.

use serde::{Serialize, Serializer};

/// Capture source for a video request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoSource {
    /// Whole-screen capture
    Screen,
}

/// Audio capture request; carries no extra constraints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AudioConstraints {}

/// Mandatory video constraints
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MandatoryVideoConstraints {
    /// Non-camera capture source
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chrome_media_source: Option<VideoSource>,
    /// Minimum width in pixels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_width: Option<u32>,
    /// Minimum height in pixels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_height: Option<u32>,
    /// Minimum aspect ratio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_aspect_ratio: Option<f64>,
    /// Maximum frame rate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_frame_rate: Option<u32>,
    /// Minimum frame rate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_frame_rate: Option<u32>,
}

/// Best-effort video hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OptionalVideoConstraint {
    /// Bandwidth cap in kbps; most engines ignore it
    Bandwidth(u32),
}

/// Video capture request
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VideoConstraints {
    /// Constraints the host must satisfy
    pub mandatory: MandatoryVideoConstraints,
    /// Hints the host may ignore
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub optional: Vec<OptionalVideoConstraint>,
}

impl VideoConstraints {
    /// Screen capture directive
    pub fn screen() -> Self {
        Self {
            mandatory: MandatoryVideoConstraints {
                chrome_media_source: Some(VideoSource::Screen),
                ..Default::default()
            },
            optional: Vec::new(),
        }
    }

    /// Whether this requests screen rather than camera capture
    pub fn is_screen(&self) -> bool {
        self.mandatory.chrome_media_source == Some(VideoSource::Screen)
    }

    /// Bandwidth hint, if any
    pub fn bandwidth(&self) -> Option<u32> {
        self.optional
            .iter()
            .map(|hint| match hint {
                OptionalVideoConstraint::Bandwidth(kbps) => *kbps,
            })
            .next()
    }
}

/// Constraints passed to the host capture primitive
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MediaConstraints {
    /// Audio request, `false` on the wire when absent
    #[serde(serialize_with = "false_if_absent")]
    pub audio: Option<AudioConstraints>,
    /// Video request, `false` on the wire when absent
    #[serde(serialize_with = "false_if_absent")]
    pub video: Option<VideoConstraints>,
}

impl MediaConstraints {
    /// Whether audio capture is requested
    pub fn requests_audio(&self) -> bool {
        self.audio.is_some()
    }

    /// Whether video capture is requested
    pub fn requests_video(&self) -> bool {
        self.video.is_some()
    }

    /// Whether nothing is requested
    pub fn is_empty(&self) -> bool {
        self.audio.is_none() && self.video.is_none()
    }
}

fn false_if_absent<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    match value {
        Some(inner) => inner.serialize(serializer),
        None => serializer.serialize_bool(false),
    }
}
