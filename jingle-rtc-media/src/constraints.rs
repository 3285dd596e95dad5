//! Media constraint builder
//!
//! Turns coarse capture parameters (media kinds, a resolution tier tag, a
//! bandwidth cap, a frame rate) into the vendor [`MediaConstraints`] object.
//! Building is pure: the same inputs and platform always give the same result.

use crate::capability::Platform;
use crate::error::MediaError;
use jingle_rtc_core::{
    AudioConstraints, MediaConstraints, OptionalVideoConstraint, VideoConstraints,
};
use std::str::FromStr;
use tracing::debug;

/// Minimum aspect ratio requested for widescreen tiers
pub const WIDESCREEN_ASPECT_RATIO: f64 = 1.77;

/// Resolution used on mobile when no known tier is requested
const MOBILE_FALLBACK: (u32, u32) = (320, 240);

/// Frame rate cap used on mobile when no known tier is requested
const MOBILE_MAX_FRAME_RATE: u32 = 15;

/// Requested media kind token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestedMedia {
    /// `"audio"`
    Audio,
    /// `"video"`
    Video,
    /// `"screen"`
    Screen,
}

impl RequestedMedia {
    /// Parse a token; unknown tokens yield `None`
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "audio" => Some(RequestedMedia::Audio),
            "video" => Some(RequestedMedia::Video),
            "screen" => Some(RequestedMedia::Screen),
            _ => None,
        }
    }
}

/// Resolution tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionTier {
    /// 1920x1080, 16:9 (`"1080"`, `"fullhd"`)
    FullHd,
    /// 1280x720, 16:9 (`"720"`, `"hd"`)
    Hd,
    /// 640x360, 16:9 (`"360"`)
    Wide360,
    /// 320x180, 16:9 (`"180"`)
    Wide180,
    /// 960x720, 4:3 (`"960"`)
    Standard960,
    /// 640x480, 4:3 (`"640"`, `"vga"`)
    Vga,
    /// 320x240, 4:3 (`"320"`)
    Standard320,
}

impl ResolutionTier {
    /// Parse a tier tag
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "1080" | "fullhd" => Some(ResolutionTier::FullHd),
            "720" | "hd" => Some(ResolutionTier::Hd),
            "360" => Some(ResolutionTier::Wide360),
            "180" => Some(ResolutionTier::Wide180),
            "960" => Some(ResolutionTier::Standard960),
            "640" | "vga" => Some(ResolutionTier::Vga),
            "320" => Some(ResolutionTier::Standard320),
            _ => None,
        }
    }

    /// Minimum (width, height)
    pub fn min_size(&self) -> (u32, u32) {
        match self {
            ResolutionTier::FullHd => (1920, 1080),
            ResolutionTier::Hd => (1280, 720),
            ResolutionTier::Wide360 => (640, 360),
            ResolutionTier::Wide180 => (320, 180),
            ResolutionTier::Standard960 => (960, 720),
            ResolutionTier::Vga => (640, 480),
            ResolutionTier::Standard320 => (320, 240),
        }
    }

    /// Minimum aspect ratio; only widescreen tiers carry one
    pub fn min_aspect_ratio(&self) -> Option<f64> {
        match self {
            ResolutionTier::FullHd
            | ResolutionTier::Hd
            | ResolutionTier::Wide360
            | ResolutionTier::Wide180 => Some(WIDESCREEN_ASPECT_RATIO),
            _ => None,
        }
    }

    fn apply(&self, video: &mut VideoConstraints) {
        let (width, height) = self.min_size();
        video.mandatory.min_width = Some(width);
        video.mandatory.min_height = Some(height);
        if let Some(ratio) = self.min_aspect_ratio() {
            video.mandatory.min_aspect_ratio = Some(ratio);
        }
    }
}

impl FromStr for ResolutionTier {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| MediaError::InvalidConfiguration {
            message: format!("unknown resolution tier '{}'", s),
        })
    }
}

/// Fluent builder for capture constraints
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintBuilder {
    audio: bool,
    video: bool,
    screen: bool,
    resolution: Option<String>,
    bandwidth: Option<u32>,
    frame_rate: Option<u32>,
}

impl ConstraintBuilder {
    /// Empty request
    pub fn new() -> Self {
        Self::default()
    }

    /// Request from kind tokens (`"audio"`, `"video"`, `"screen"`); unknown
    /// tokens are ignored
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new().kinds(tokens)
    }

    /// Add kind tokens
    pub fn kinds<I, S>(self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        tokens
            .into_iter()
            .filter_map(|token| RequestedMedia::from_token(token.as_ref()))
            .fold(self, Self::media)
    }

    /// Add one media kind
    pub fn media(mut self, kind: RequestedMedia) -> Self {
        match kind {
            RequestedMedia::Audio => self.audio = true,
            RequestedMedia::Video => self.video = true,
            RequestedMedia::Screen => self.screen = true,
        }
        self
    }

    /// Set the resolution tier tag; an empty tag counts as none
    pub fn resolution(mut self, tag: &str) -> Self {
        self.resolution = (!tag.is_empty()).then(|| tag.to_string());
        self
    }

    /// Set the bandwidth cap in kbps; zero counts as none
    pub fn bandwidth(mut self, kbps: u32) -> Self {
        self.bandwidth = (kbps > 0).then_some(kbps);
        self
    }

    /// Set the minimum frame rate; zero counts as none
    pub fn frame_rate(mut self, fps: u32) -> Self {
        self.frame_rate = (fps > 0).then_some(fps);
        self
    }

    /// Build the constraints for `platform`
    pub fn build(&self, platform: Platform) -> MediaConstraints {
        let audio = self.audio.then(AudioConstraints::default);
        let mut video = self.video.then(VideoConstraints::default);
        // Evaluated after the camera request so screen wins when both are set.
        if self.screen {
            video = Some(VideoConstraints::screen());
        }

        if self.resolution.is_some() && video.is_none() {
            video = Some(VideoConstraints::default());
        }

        match self.resolution.as_deref().and_then(ResolutionTier::from_tag) {
            Some(tier) => tier.apply(video.get_or_insert_with(VideoConstraints::default)),
            None if platform.is_mobile() && (video.is_some() || audio.is_some()) => {
                let video = video.get_or_insert_with(VideoConstraints::default);
                video.mandatory.min_width = Some(MOBILE_FALLBACK.0);
                video.mandatory.min_height = Some(MOBILE_FALLBACK.1);
                video.mandatory.max_frame_rate = Some(MOBILE_MAX_FRAME_RATE);
            }
            None => {}
        }

        if let Some(kbps) = self.bandwidth {
            let video = video.get_or_insert_with(VideoConstraints::default);
            video.optional = vec![OptionalVideoConstraint::Bandwidth(kbps)];
        }

        if let Some(fps) = self.frame_rate {
            let video = video.get_or_insert_with(VideoConstraints::default);
            video.mandatory.min_frame_rate = Some(fps);
        }

        let constraints = MediaConstraints { audio, video };
        debug!("🎛️ Built media constraints: {:?}", constraints);
        constraints
    }
}

/// Build constraints from the raw parameters in one call
pub fn build_constraints<S: AsRef<str>>(
    kinds: &[S],
    resolution: Option<&str>,
    bandwidth: Option<u32>,
    frame_rate: Option<u32>,
    platform: Platform,
) -> MediaConstraints {
    let mut builder = ConstraintBuilder::from_tokens(kinds);
    if let Some(tag) = resolution {
        builder = builder.resolution(tag);
    }
    if let Some(kbps) = bandwidth {
        builder = builder.bandwidth(kbps);
    }
    if let Some(fps) = frame_rate {
        builder = builder.frame_rate(fps);
    }
    builder.build(platform)
}
