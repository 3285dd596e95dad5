//! Media capture events

use jingle_rtc_core::MediaStream;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Name of the event published when capture succeeds
pub const MEDIA_READY: &str = "mediaready.jingle";

/// Name of the event published when capture fails
pub const MEDIA_FAILURE: &str = "mediafailure.jingle";

/// Outcome of a capture request
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Local media was captured
    MediaReady {
        /// The captured stream, with its track accessors guaranteed
        stream: MediaStream,
    },
    /// Capture failed or was refused; carries no detail
    MediaFailed,
}

impl MediaEvent {
    /// Event name as seen by subscribers
    pub fn event_type(&self) -> &'static str {
        match self {
            MediaEvent::MediaReady { .. } => MEDIA_READY,
            MediaEvent::MediaFailed => MEDIA_FAILURE,
        }
    }

    /// Check if this reports a captured stream
    pub fn is_ready(&self) -> bool {
        matches!(self, MediaEvent::MediaReady { .. })
    }

    /// Captured stream, if any
    pub fn stream(&self) -> Option<&MediaStream> {
        match self {
            MediaEvent::MediaReady { stream } => Some(stream),
            MediaEvent::MediaFailed => None,
        }
    }
}

/// Broadcast bus for [`MediaEvent`]s
///
/// Every subscriber sees every event published after it subscribed.
#[derive(Debug, Clone)]
pub struct MediaEventBus {
    sender: broadcast::Sender<MediaEvent>,
}

impl MediaEventBus {
    /// Create a bus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event, returning how many subscribers will see it
    pub fn publish(&self, event: MediaEvent) -> usize {
        debug!("📡 Publishing {}", event.event_type());
        // Publishing with no subscribers is not an error.
        self.sender.send(event).unwrap_or(0)
    }

    /// Subscribe to events published from now on
    pub fn subscribe(&self) -> MediaEventStream {
        MediaEventStream {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for MediaEventBus {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Subscription to a [`MediaEventBus`]
#[derive(Debug)]
pub struct MediaEventStream {
    receiver: broadcast::Receiver<MediaEvent>,
}

impl MediaEventStream {
    /// Next event; `None` once the bus is gone
    pub async fn next(&mut self) -> Option<MediaEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Media event subscriber lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next event if one is already queued
    pub fn try_next(&mut self) -> Result<Option<MediaEvent>, broadcast::error::TryRecvError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Ok(Some(event)),
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!("Media event subscriber lagged, skipped {} events", skipped);
                }
                Err(closed) => return Err(closed),
            }
        }
    }
}

/// Callback-style subscriber running on a background task
#[derive(Debug)]
pub struct MediaEventHandler {
    task: tokio::task::JoinHandle<()>,
}

impl MediaEventHandler {
    /// Spawn a task feeding every event from `stream` to `callback`.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn spawn<F>(mut stream: MediaEventStream, mut callback: F) -> Self
    where
        F: FnMut(MediaEvent) + Send + 'static,
    {
        let task = tokio::spawn(async move {
            while let Some(event) = stream.next().await {
                debug!("📡 Handling {}", event.event_type());
                callback(event);
            }
        });
        Self { task }
    }

    /// Stop delivering events
    pub fn stop(self) {
        self.task.abort();
    }

    /// Whether the task has ended, which happens once the bus is dropped
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jingle_rtc_core::testing::sample_stream;

    #[test]
    fn test_event_names() {
        let ready = MediaEvent::MediaReady {
            stream: sample_stream("local"),
        };
        assert_eq!(ready.event_type(), "mediaready.jingle");
        assert!(ready.is_ready());
        assert_eq!(ready.stream().map(|s| s.id.as_str()), Some("local"));

        assert_eq!(MediaEvent::MediaFailed.event_type(), "mediafailure.jingle");
        assert!(MediaEvent::MediaFailed.stream().is_none());
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = MediaEventBus::default();
        assert_eq!(bus.publish(MediaEvent::MediaFailed), 0);
    }

    #[tokio::test]
    async fn test_every_subscriber_sees_event() {
        let bus = MediaEventBus::new(8);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        assert_eq!(bus.publish(MediaEvent::MediaFailed), 2);
        assert_eq!(first.next().await, Some(MediaEvent::MediaFailed));
        assert_eq!(second.next().await, Some(MediaEvent::MediaFailed));
        assert_eq!(first.try_next().unwrap(), None);
    }

    #[tokio::test]
    async fn test_stream_ends_with_bus() {
        let bus = MediaEventBus::new(8);
        let mut stream = bus.subscribe();
        drop(bus);
        assert_eq!(stream.next().await, None);
        assert!(stream.try_next().is_err());
    }

    #[tokio::test]
    async fn test_lagging_subscriber_keeps_latest() {
        let bus = MediaEventBus::new(1);
        let mut stream = bus.subscribe();
        bus.publish(MediaEvent::MediaFailed);
        bus.publish(MediaEvent::MediaReady {
            stream: sample_stream("late"),
        });

        let event = stream.try_next().unwrap().expect("latest event kept");
        assert!(event.is_ready());
    }
}
