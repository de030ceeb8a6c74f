//! Lifecycle events.
//!
//! Events are emitted by a client's reconnect loop at state transitions and
//! consumed once by whoever drains the registry's event queue.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identifiers::ClientId;

// ============================================================================
// EventKind
// ============================================================================

/// Kind of lifecycle event.
///
/// Serialized as its string tag. Unrecognized tags parse as
/// [`EventKind::Unknown`] instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum EventKind {
    /// Dial and handshake succeeded.
    Connected,
    /// A dial attempt failed.
    ConnectFailed,
    /// The loop stopped after a voluntary disconnect.
    Disconnected,
    /// An established session dropped without a voluntary disconnect.
    ConnectionLost,
    /// Consecutive dial failures exceeded the retry limit.
    RetriesExhausted,
    /// A tag this version does not know.
    Unknown(String),
}

impl EventKind {
    /// Returns the string tag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Connected => "connect_success",
            Self::ConnectFailed => "connect_fail",
            Self::Disconnected => "disconnect",
            Self::ConnectionLost => "disconnect_error",
            Self::RetriesExhausted => "max_retry",
            Self::Unknown(tag) => tag,
        }
    }

    /// Parses a string tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "connect_success" => Self::Connected,
            "connect_fail" => Self::ConnectFailed,
            "disconnect" => Self::Disconnected,
            "disconnect_error" => Self::ConnectionLost,
            "max_retry" => Self::RetriesExhausted,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Returns `true` if the loop has stopped after this event.
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Disconnected | Self::RetriesExhausted)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for EventKind {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag)
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Unknown(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

// ============================================================================
// Event
// ============================================================================

/// A lifecycle notification attributed to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Client that changed state.
    pub client_id: ClientId,
    /// What happened.
    #[serde(rename = "type")]
    pub kind: EventKind,
}

impl Event {
    /// Creates an event.
    #[inline]
    #[must_use]
    pub fn new(client_id: ClientId, kind: EventKind) -> Self {
        Self { client_id, kind }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_round_trip() {
        for kind in [
            EventKind::Connected,
            EventKind::ConnectFailed,
            EventKind::Disconnected,
            EventKind::ConnectionLost,
            EventKind::RetriesExhausted,
        ] {
            assert_eq!(EventKind::from_tag(kind.as_str()), kind);
        }
    }

    #[test]
    fn test_unknown_tag_is_kept() {
        let kind = EventKind::from_tag("resubscribed");
        assert_eq!(kind, EventKind::Unknown("resubscribed".to_string()));
        assert_eq!(kind.as_str(), "resubscribed");
    }

    #[test]
    fn test_event_json() {
        let event = Event::new(ClientId::new(4), EventKind::RetriesExhausted);
        let json = serde_json::to_string(&event).expect("serialize");
        assert_eq!(json, r#"{"client_id":4,"type":"max_retry"}"#);
    }

    #[test]
    fn test_event_parses_unknown_kind() {
        let event: Event =
            serde_json::from_str(r#"{"client_id":1,"type":"paused"}"#).expect("deserialize");
        assert_eq!(event.kind, EventKind::Unknown("paused".to_string()));
    }

    #[test]
    fn test_is_terminal() {
        assert!(EventKind::Disconnected.is_terminal());
        assert!(EventKind::RetriesExhausted.is_terminal());
        assert!(!EventKind::ConnectionLost.is_terminal());
        assert!(!EventKind::Connected.is_terminal());
    }
}
