//! Media stream values produced by host capture

use serde::{Deserialize, Serialize};

/// Kind of a media track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Audio track
    Audio,
    /// Video track
    Video,
}

/// A single captured track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaStreamTrack {
    /// Track ID
    pub id: String,
    /// Track kind
    pub kind: MediaKind,
    /// Device label
    pub label: String,
    /// Whether the track is enabled
    pub enabled: bool,
}

impl MediaStreamTrack {
    /// Create an enabled track
    pub fn new(id: impl Into<String>, kind: MediaKind, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            label: label.into(),
            enabled: true,
        }
    }
}

/// Media stream as exposed by the host
///
/// Hosts differ in how they expose a stream's tracks: current engines have
/// accessor methods, older Chromium builds only expose `videoTracks` /
/// `audioTracks` fields, and older Firefox builds expose neither. A `None`
/// accessor means the host stream lacks it; see the track access adapter in
/// the media crate for the normalized view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaStream {
    /// Stream ID
    pub id: String,
    /// Result of the host's video track accessor, if the host has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_tracks: Option<Vec<MediaStreamTrack>>,
    /// Result of the host's audio track accessor, if the host has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_tracks: Option<Vec<MediaStreamTrack>>,
    /// Legacy field-backed video track list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_video_tracks: Option<Vec<MediaStreamTrack>>,
    /// Legacy field-backed audio track list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_audio_tracks: Option<Vec<MediaStreamTrack>>,
}

impl MediaStream {
    /// Stream whose host provides both track accessors
    pub fn new(id: impl Into<String>, tracks: Vec<MediaStreamTrack>) -> Self {
        let (video, audio): (Vec<_>, Vec<_>) = tracks
            .into_iter()
            .partition(|track| track.kind == MediaKind::Video);
        Self {
            id: id.into(),
            video_tracks: Some(video),
            audio_tracks: Some(audio),
            legacy_video_tracks: None,
            legacy_audio_tracks: None,
        }
    }

    /// Stream whose host exposes no track accessors at all
    pub fn bare(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            video_tracks: None,
            audio_tracks: None,
            legacy_video_tracks: None,
            legacy_audio_tracks: None,
        }
    }

    /// Stream whose host only exposes the legacy track fields
    pub fn legacy(id: impl Into<String>, tracks: Vec<MediaStreamTrack>) -> Self {
        let (video, audio): (Vec<_>, Vec<_>) = tracks
            .into_iter()
            .partition(|track| track.kind == MediaKind::Video);
        Self {
            legacy_video_tracks: Some(video),
            legacy_audio_tracks: Some(audio),
            ..Self::bare(id)
        }
    }

    /// Whether both track accessors are present
    pub fn has_track_accessors(&self) -> bool {
        self.video_tracks.is_some() && self.audio_tracks.is_some()
    }
}
