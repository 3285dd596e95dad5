//! Session negotiation values exchanged with the host engine
//!
//! These are treated as opaque by jingle-rtc: they are carried, traced and
//! forwarded, never interpreted.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// SDP type of a session description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    /// Offer
    Offer,
    /// Provisional answer
    Pranswer,
    /// Answer
    Answer,
    /// Rollback
    Rollback,
}

/// Session description negotiated between peers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    /// Description type
    #[serde(rename = "type")]
    pub sdp_type: SdpType,
    /// Raw SDP body
    pub sdp: String,
}

impl SessionDescription {
    /// Create an offer description
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Offer,
            sdp: sdp.into(),
        }
    }

    /// Create an answer description
    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Answer,
            sdp: sdp.into(),
        }
    }
}

/// ICE candidate exchanged with the remote peer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    /// Candidate line
    pub candidate: String,
    /// Media stream identification tag
    pub sdp_mid: Option<String>,
    /// Index of the m-line the candidate belongs to
    pub sdp_m_line_index: Option<u16>,
}

/// STUN/TURN server entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServer {
    /// Server URLs
    pub urls: Vec<String>,
    /// TURN username
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// TURN credential
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

/// Network traversal configuration handed to the host connection constructor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceConfig {
    /// ICE servers
    #[serde(default)]
    pub ice_servers: Vec<IceServer>,
}

impl IceConfig {
    /// Configuration with a single STUN server
    pub fn with_stun(url: impl Into<String>) -> Self {
        Self {
            ice_servers: vec![IceServer {
                urls: vec![url.into()],
                username: None,
                credential: None,
            }],
        }
    }
}

/// Legacy `{mandatory, optional}` constraint set
///
/// Used both for peer-connection construction (e.g. `DtlsSrtpKeyAgreement`)
/// and for offer/answer creation (e.g. `OfferToReceiveVideo`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConstraints {
    /// Constraints the host must satisfy
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub mandatory: BTreeMap<String, Value>,
    /// Best-effort constraints, one key per entry
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub optional: Vec<BTreeMap<String, Value>>,
}

impl ConnectionConstraints {
    /// Empty constraint set
    pub fn empty() -> Self {
        Self::default()
    }

    /// Chromium default: negotiate DTLS-SRTP keys
    pub fn dtls_srtp_key_agreement() -> Self {
        Self::empty().with_optional("DtlsSrtpKeyAgreement", "true")
    }

    /// Add a mandatory constraint
    pub fn with_mandatory(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.mandatory.insert(key.to_string(), value.into());
        self
    }

    /// Append an optional constraint
    pub fn with_optional(mut self, key: &str, value: impl Into<Value>) -> Self {
        let mut entry = BTreeMap::new();
        entry.insert(key.to_string(), value.into());
        self.optional.push(entry);
        self
    }

    /// Whether no constraint is set
    pub fn is_empty(&self) -> bool {
        self.mandatory.is_empty() && self.optional.is_empty()
    }

    /// Look up an optional constraint by key
    pub fn optional_value(&self, key: &str) -> Option<&Value> {
        self.optional.iter().find_map(|entry| entry.get(key))
    }
}

/// Signaling state of the host connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalingState {
    /// No negotiation in progress
    Stable,
    /// Local offer applied
    HaveLocalOffer,
    /// Remote offer applied
    HaveRemoteOffer,
    /// Local provisional answer applied
    HaveLocalPranswer,
    /// Remote provisional answer applied
    HaveRemotePranswer,
    /// Connection closed
    Closed,
}

/// ICE connection state of the host connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IceConnectionState {
    /// Gathering not started
    New,
    /// Checking candidate pairs
    Checking,
    /// A usable pair was found
    Connected,
    /// Checks finished
    Completed,
    /// No pair works
    Failed,
    /// Connectivity lost
    Disconnected,
    /// Agent shut down
    Closed,
}

/// Statistics report returned by the host, kept opaque
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsReport {
    /// Raw report entries
    pub entries: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtls_constraints_wire_shape() {
        let constraints = ConnectionConstraints::dtls_srtp_key_agreement();
        let value = serde_json::to_value(&constraints).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"optional": [{"DtlsSrtpKeyAgreement": "true"}]})
        );
        assert_eq!(
            constraints.optional_value("DtlsSrtpKeyAgreement"),
            Some(&Value::from("true"))
        );
    }

    #[test]
    fn test_empty_constraints_serialize_to_empty_object() {
        let value = serde_json::to_value(ConnectionConstraints::empty()).unwrap();
        assert_eq!(value, serde_json::json!({}));
    }

    #[test]
    fn test_signaling_state_tags() {
        let value = serde_json::to_value(SignalingState::HaveLocalOffer).unwrap();
        assert_eq!(value, "have-local-offer");
    }
}
