//! Append-only call trace of a peer connection

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// What a trace entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TraceKind {
    /// Local stream attached
    #[serde(rename = "addStream")]
    AddStream,
    /// Local stream detached
    #[serde(rename = "removeStream")]
    RemoveStream,
    /// Local description requested
    #[serde(rename = "setLocalDescription")]
    SetLocalDescription,
    /// Local description applied
    #[serde(rename = "setLocalDescriptionOnSuccess")]
    SetLocalDescriptionOnSuccess,
    /// Local description rejected
    #[serde(rename = "setLocalDescriptionOnFailure")]
    SetLocalDescriptionOnFailure,
    /// Remote description requested
    #[serde(rename = "setRemoteDescription")]
    SetRemoteDescription,
    /// Remote description applied
    #[serde(rename = "setRemoteDescriptionOnSuccess")]
    SetRemoteDescriptionOnSuccess,
    /// Remote description rejected
    #[serde(rename = "setRemoteDescriptionOnFailure")]
    SetRemoteDescriptionOnFailure,
    /// Offer requested
    #[serde(rename = "createOffer")]
    CreateOffer,
    /// Offer created
    #[serde(rename = "createOfferOnSuccess")]
    CreateOfferOnSuccess,
    /// Offer creation failed
    #[serde(rename = "createOfferOnFailure")]
    CreateOfferOnFailure,
    /// Answer requested
    #[serde(rename = "createAnswer")]
    CreateAnswer,
    /// Answer created
    #[serde(rename = "createAnswerOnSuccess")]
    CreateAnswerOnSuccess,
    /// Answer creation failed
    #[serde(rename = "createAnswerOnFailure")]
    CreateAnswerOnFailure,
    /// Remote candidate added
    #[serde(rename = "addIceCandidate")]
    AddIceCandidate,
    /// Connection closed
    #[serde(rename = "stop")]
    Stop,
}

impl TraceKind {
    /// Wire tag of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            TraceKind::AddStream => "addStream",
            TraceKind::RemoveStream => "removeStream",
            TraceKind::SetLocalDescription => "setLocalDescription",
            TraceKind::SetLocalDescriptionOnSuccess => "setLocalDescriptionOnSuccess",
            TraceKind::SetLocalDescriptionOnFailure => "setLocalDescriptionOnFailure",
            TraceKind::SetRemoteDescription => "setRemoteDescription",
            TraceKind::SetRemoteDescriptionOnSuccess => "setRemoteDescriptionOnSuccess",
            TraceKind::SetRemoteDescriptionOnFailure => "setRemoteDescriptionOnFailure",
            TraceKind::CreateOffer => "createOffer",
            TraceKind::CreateOfferOnSuccess => "createOfferOnSuccess",
            TraceKind::CreateOfferOnFailure => "createOfferOnFailure",
            TraceKind::CreateAnswer => "createAnswer",
            TraceKind::CreateAnswerOnSuccess => "createAnswerOnSuccess",
            TraceKind::CreateAnswerOnFailure => "createAnswerOnFailure",
            TraceKind::AddIceCandidate => "addIceCandidate",
            TraceKind::Stop => "stop",
        }
    }

    /// Whether this kind starts an operation that completes asynchronously
    pub fn is_async_request(&self) -> bool {
        matches!(
            self,
            TraceKind::SetLocalDescription
                | TraceKind::SetRemoteDescription
                | TraceKind::CreateOffer
                | TraceKind::CreateAnswer
        )
    }

    /// Whether this kind records an asynchronous failure
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            TraceKind::SetLocalDescriptionOnFailure
                | TraceKind::SetRemoteDescriptionOnFailure
                | TraceKind::CreateOfferOnFailure
                | TraceKind::CreateAnswerOnFailure
        )
    }

    /// Whether this kind records an asynchronous outcome
    pub fn is_outcome(&self) -> bool {
        self.request().is_some()
    }

    /// Request an outcome kind answers
    pub fn request(&self) -> Option<TraceKind> {
        match self {
            TraceKind::SetLocalDescriptionOnSuccess | TraceKind::SetLocalDescriptionOnFailure => {
                Some(TraceKind::SetLocalDescription)
            }
            TraceKind::SetRemoteDescriptionOnSuccess
            | TraceKind::SetRemoteDescriptionOnFailure => Some(TraceKind::SetRemoteDescription),
            TraceKind::CreateOfferOnSuccess | TraceKind::CreateOfferOnFailure => {
                Some(TraceKind::CreateOffer)
            }
            TraceKind::CreateAnswerOnSuccess | TraceKind::CreateAnswerOnFailure => {
                Some(TraceKind::CreateAnswer)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for TraceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Position in the log, starting at zero
    pub sequence: u64,
    /// Wall-clock time of the observation
    pub time: DateTime<Utc>,
    /// Monotonic offset since the log was created
    pub elapsed: Duration,
    /// What was observed
    #[serde(rename = "type")]
    pub kind: TraceKind,
    /// Associated value (description, candidate, error, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Observer invoked with every entry after it is appended
pub type TraceSink = Arc<dyn Fn(&TraceEntry) + Send + Sync>;

struct TraceLogInner {
    started: Instant,
    entries: Mutex<Vec<TraceEntry>>,
    sink: Option<TraceSink>,
}

impl std::fmt::Debug for TraceLogInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceLogInner")
            .field("started", &self.started)
            .field("entries", &self.entries)
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

/// Shared, append-only trace log
///
/// Clones append to the same log. Entries are never modified or removed.
#[derive(Debug, Clone)]
pub struct TraceLog {
    label: Arc<str>,
    inner: Arc<TraceLogInner>,
}

impl TraceLog {
    /// Create an empty log labelled for log output
    pub fn new(label: impl Into<String>) -> Self {
        Self::build(label.into(), None)
    }

    /// Create an empty log that forwards each appended entry to `sink`
    ///
    /// The sink runs outside the log lock, so it may read the log.
    pub fn with_sink(label: impl Into<String>, sink: TraceSink) -> Self {
        Self::build(label.into(), Some(sink))
    }

    fn build(label: String, sink: Option<TraceSink>) -> Self {
        Self {
            label: Arc::from(label),
            inner: Arc::new(TraceLogInner {
                started: Instant::now(),
                entries: Mutex::new(Vec::new()),
                sink,
            }),
        }
    }

    /// Log label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Append an entry, serializing `value` into the opaque payload
    pub fn record<T: Serialize + ?Sized>(&self, kind: TraceKind, value: Option<&T>) {
        let value = value.map(|v| {
            serde_json::to_value(v).unwrap_or_else(|err| {
                warn!("[{}] {} value not serializable: {}", self.label, kind, err);
                Value::Null
            })
        });
        self.push(kind, value);
    }

    /// Append an entry without a value
    pub fn mark(&self, kind: TraceKind) {
        self.push(kind, None);
    }

    fn push(&self, kind: TraceKind, value: Option<Value>) {
        let entry = {
            let mut entries = self.inner.entries.lock();
            // Timestamps are taken under the lock so they follow append order.
            let sequence = entries.len() as u64;
            let entry = TraceEntry {
                sequence,
                time: Utc::now(),
                elapsed: self.inner.started.elapsed(),
                kind,
                value,
            };
            debug!("📝 [{}] trace #{} {}", self.label, sequence, kind);
            entries.push(entry.clone());
            entry
        };
        if let Some(sink) = &self.inner.sink {
            sink(&entry);
        }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of all entries in append order
    pub fn entries(&self) -> Vec<TraceEntry> {
        self.inner.entries.lock().clone()
    }

    /// Entry tags in append order
    pub fn kinds(&self) -> Vec<TraceKind> {
        self.inner
            .entries
            .lock()
            .iter()
            .map(|entry| entry.kind)
            .collect()
    }

    /// Most recent entry
    pub fn last(&self) -> Option<TraceEntry> {
        self.inner.entries.lock().last().cloned()
    }

    /// Export the log as a JSON array
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&*self.inner.entries.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_append_order_and_monotonic_time() {
        let log = TraceLog::new("pc-test");
        log.record(TraceKind::CreateOffer, Option::<&Value>::None);
        log.record(TraceKind::CreateOfferOnSuccess, Some(&json!({"sdp": "v=0"})));
        log.mark(TraceKind::Stop);

        let entries = log.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(
            log.kinds(),
            vec![
                TraceKind::CreateOffer,
                TraceKind::CreateOfferOnSuccess,
                TraceKind::Stop
            ]
        );
        for pair in entries.windows(2) {
            assert_eq!(pair[1].sequence, pair[0].sequence + 1);
            assert!(pair[1].elapsed >= pair[0].elapsed);
        }
        assert_eq!(entries[1].value, Some(json!({"sdp": "v=0"})));
        assert!(entries[2].value.is_none());
    }

    #[test]
    fn test_clones_share_the_log() {
        let log = TraceLog::new("pc-shared");
        let clone = log.clone();
        clone.mark(TraceKind::AddIceCandidate);
        assert_eq!(log.len(), 1);
        assert_eq!(log.label(), "pc-shared");
    }

    #[test]
    fn test_json_export_uses_wire_tags() {
        let log = TraceLog::new("pc-json");
        log.record(TraceKind::SetRemoteDescription, Some("v=0"));
        let exported: Value = serde_json::from_str(&log.to_json().unwrap()).unwrap();
        assert_eq!(exported[0]["type"], "setRemoteDescription");
        assert_eq!(exported[0]["value"], "v=0");
    }

    #[test]
    fn test_sink_sees_each_appended_entry() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let collected = Arc::clone(&seen);
        let log = TraceLog::with_sink(
            "pc-sink",
            Arc::new(move |entry: &TraceEntry| collected.lock().push((entry.sequence, entry.kind))),
        );
        log.mark(TraceKind::CreateOffer);
        log.record(TraceKind::CreateOfferOnFailure, Some("denied"));

        assert_eq!(
            *seen.lock(),
            vec![(0, TraceKind::CreateOffer), (1, TraceKind::CreateOfferOnFailure)]
        );
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_sink_may_read_the_log() {
        let lengths = Arc::new(Mutex::new(Vec::new()));
        let collected = Arc::clone(&lengths);
        let reader: Arc<Mutex<Option<TraceLog>>> = Arc::new(Mutex::new(None));
        let handle = Arc::clone(&reader);
        let log = TraceLog::with_sink(
            "pc-reentrant",
            Arc::new(move |_: &TraceEntry| {
                if let Some(log) = handle.lock().as_ref() {
                    collected.lock().push(log.len());
                }
            }),
        );
        *reader.lock() = Some(log.clone());
        log.mark(TraceKind::Stop);
        assert_eq!(*lengths.lock(), vec![1]);
    }

    #[test]
    fn test_unserializable_value_is_recorded_as_null() {
        use std::collections::BTreeMap;

        let mut keyed = BTreeMap::new();
        keyed.insert((1, 2), "tuple keys have no JSON form");
        let log = TraceLog::new("pc-null");
        log.record(TraceKind::AddIceCandidate, Some(&keyed));

        let entry = log.last().unwrap();
        assert_eq!(entry.kind, TraceKind::AddIceCandidate);
        assert_eq!(entry.value, Some(Value::Null));
    }

    #[test]
    fn test_outcome_pairs() {
        assert_eq!(
            TraceKind::CreateAnswerOnFailure.request(),
            Some(TraceKind::CreateAnswer)
        );
        assert!(TraceKind::CreateAnswerOnFailure.is_failure());
        assert!(TraceKind::SetLocalDescription.is_async_request());
        assert!(!TraceKind::AddIceCandidate.is_async_request());
        assert!(!TraceKind::Stop.is_outcome());
    }
}
