//! Local media capture
//!
//! Capture never reports through a return value: the outcome is published on
//! the [`MediaEventBus`] as either [`MediaEvent::MediaReady`] or
//! [`MediaEvent::MediaFailed`], exactly once per request.

use crate::event::{MediaEvent, MediaEventBus};
use jingle_rtc_core::{HostError, MediaConstraints, MediaStream};
use jingle_rtc_media::{CapabilityProfile, ConstraintBuilder, MediaError};
use tracing::{error, info, warn};

/// Build constraints for `request` and ask the host to capture.
///
/// Returns the constraints handed to the host, or `None` when the profile is
/// unsupported, in which case [`MediaEvent::MediaFailed`] has already been
/// published.
pub fn get_user_media_with_constraints(
    profile: &CapabilityProfile,
    request: &ConstraintBuilder,
    bus: &MediaEventBus,
) -> Option<MediaConstraints> {
    let Some(rtc) = profile.rtc() else {
        warn!("Cannot capture media: browser is not WebRTC-capable");
        bus.publish(MediaEvent::MediaFailed);
        return None;
    };

    let constraints = request.build(rtc.platform());
    info!("🎥 Requesting user media: {:?}", constraints);

    let ready_bus = bus.clone();
    let failed_bus = bus.clone();
    let track_access = rtc.track_access();

    let requested = rtc.media_capture().get_user_media(
        &constraints,
        Box::new(move |stream: MediaStream| {
            info!("🎥 User media ready: stream {}", stream.id);
            ready_bus.publish(MediaEvent::MediaReady {
                stream: track_access.adapt(stream),
            });
        }),
        Box::new(move |source: HostError| {
            let failure = MediaError::CaptureFailed { source };
            warn!("Failed to get access to local media: {}", failure);
            failed_bus.publish(MediaEvent::MediaFailed);
        }),
    );

    if let Err(failure) = requested {
        error!("GUM failed: {}", failure);
        bus.publish(MediaEvent::MediaFailed);
    }

    Some(constraints)
}
