//! Normalized track accessors for host streams

use jingle_rtc_core::{MediaStream, MediaStreamTrack};

/// How to obtain a stream's tracks when its host lacks the accessors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackAccess {
    /// Missing accessors yield no tracks
    EmptyFallback,
    /// Missing accessors read the legacy `videoTracks` / `audioTracks` fields
    LegacyFields,
}

impl TrackAccess {
    /// Fill in whichever accessors `stream` lacks.
    ///
    /// Accessors the host already provides are left untouched, so adapting an
    /// adapted stream is a no-op.
    pub fn adapt(&self, mut stream: MediaStream) -> MediaStream {
        if stream.video_tracks.is_none() {
            stream.video_tracks = Some(self.fallback(stream.legacy_video_tracks.as_ref()));
        }
        if stream.audio_tracks.is_none() {
            stream.audio_tracks = Some(self.fallback(stream.legacy_audio_tracks.as_ref()));
        }
        stream
    }

    /// Video tracks of `stream`
    pub fn video_tracks(&self, stream: &MediaStream) -> Vec<MediaStreamTrack> {
        match &stream.video_tracks {
            Some(tracks) => tracks.clone(),
            None => self.fallback(stream.legacy_video_tracks.as_ref()),
        }
    }

    /// Audio tracks of `stream`
    pub fn audio_tracks(&self, stream: &MediaStream) -> Vec<MediaStreamTrack> {
        match &stream.audio_tracks {
            Some(tracks) => tracks.clone(),
            None => self.fallback(stream.legacy_audio_tracks.as_ref()),
        }
    }

    fn fallback(&self, legacy: Option<&Vec<MediaStreamTrack>>) -> Vec<MediaStreamTrack> {
        match self {
            TrackAccess::EmptyFallback => Vec::new(),
            // A legacy stream without the field reads as empty.
            TrackAccess::LegacyFields => legacy.cloned().unwrap_or_default(),
        }
    }
}
