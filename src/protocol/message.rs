//! Inbound data frames.
//!
//! A [`Frame`] is what the transport yields; a [`Message`] is a frame
//! attributed to the client that received it.

// ============================================================================
// Imports
// ============================================================================

use std::str;

use serde::Serialize;

use crate::identifiers::ClientId;

// ============================================================================
// FrameKind
// ============================================================================

/// Data frame kind as reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameKind {
    /// UTF-8 text frame.
    Text,
    /// Binary frame.
    Binary,
}

// ============================================================================
// Frame
// ============================================================================

/// One data frame read from a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame kind.
    pub kind: FrameKind,
    /// Raw payload.
    pub data: Vec<u8>,
}

impl Frame {
    /// Creates a text frame.
    #[inline]
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: FrameKind::Text,
            data: text.into().into_bytes(),
        }
    }

    /// Creates a binary frame.
    #[inline]
    #[must_use]
    pub fn binary(data: impl Into<Vec<u8>>) -> Self {
        Self {
            kind: FrameKind::Binary,
            data: data.into(),
        }
    }
}

// ============================================================================
// Message
// ============================================================================

/// An inbound frame attributed to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Client that received the frame.
    pub client_id: ClientId,
    /// Frame kind.
    pub kind: FrameKind,
    /// Raw payload.
    pub data: Vec<u8>,
}

impl Message {
    /// Attributes a frame to a client.
    #[inline]
    #[must_use]
    pub fn new(client_id: ClientId, frame: Frame) -> Self {
        Self {
            client_id,
            kind: frame.kind,
            data: frame.data,
        }
    }

    /// Returns the payload as text if it is valid UTF-8.
    #[inline]
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        str::from_utf8(&self.data).ok()
    }

    /// Returns `true` for text frames.
    #[inline]
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.kind == FrameKind::Text
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_from_text_frame() {
        let message = Message::new(ClientId::new(3), Frame::text("hello"));
        assert_eq!(message.client_id, ClientId::new(3));
        assert!(message.is_text());
        assert_eq!(message.text(), Some("hello"));
    }

    #[test]
    fn test_binary_payload_not_utf8() {
        let message = Message::new(ClientId::new(0), Frame::binary(vec![0xff, 0xfe]));
        assert_eq!(message.kind, FrameKind::Binary);
        assert_eq!(message.text(), None);
    }

    #[test]
    fn test_message_json_shape() {
        let message = Message::new(ClientId::new(1), Frame::binary(vec![1, 2]));
        let json = serde_json::to_value(&message).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({ "client_id": 1, "kind": "binary", "data": [1, 2] })
        );
    }
}
