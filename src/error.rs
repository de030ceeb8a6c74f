//! Error types for the client pool.
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use ws_client_pool::{Registry, Result};
//!
//! async fn example(registry: &Registry) -> Result<()> {
//!     let id = registry.add_client("ws://127.0.0.1:9001")?;
//!     registry.disconnect_client(id).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Registry | [`Error::AlreadyExists`], [`Error::NotFound`], [`Error::Shutdown`] |
//! | State | [`Error::AlreadyConnected`], [`Error::NotConnected`] |
//! | Configuration | [`Error::Config`], [`Error::InvalidUrl`] |
//! | Transport | [`Error::Dial`], [`Error::Read`], [`Error::Close`], [`Error::ConnectionClosed`] |
//! | External | [`Error::WebSocket`] |
//!
//! Transport errors raised inside the reconnect loop never reach a caller;
//! they are turned into events and handled by the retry policy. Only close
//! failures surface, through `disconnect`, `close` and `remove_client`.

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::ClientId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Registry Errors
    // ========================================================================
    /// A live entry already uses this address.
    #[error("Client already exists: {url}")]
    AlreadyExists {
        /// The duplicated address.
        url: String,
    },

    /// No entry with this identifier.
    #[error("Client not found: {client_id}")]
    NotFound {
        /// The missing identifier.
        client_id: ClientId,
    },

    /// The registry has been shut down.
    #[error("Registry is shut down")]
    Shutdown,

    // ========================================================================
    // State Errors
    // ========================================================================
    /// Connect requested while the client is connected.
    #[error("Client {client_id} is already connected")]
    AlreadyConnected {
        /// The connected client.
        client_id: ClientId,
    },

    /// Disconnect requested while the client is not connected.
    #[error("Client {client_id} is not connected")]
    NotConnected {
        /// The disconnected client.
        client_id: ClientId,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid configuration value.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Address is not a usable `ws://` or `wss://` URL.
    #[error("Invalid URL {url}: {message}")]
    InvalidUrl {
        /// The rejected address.
        url: String,
        /// Why it was rejected.
        message: String,
    },

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// Dial or handshake failed.
    #[error("Dial to {url} failed: {message}")]
    Dial {
        /// Target address.
        url: String,
        /// Description of the failure.
        message: String,
    },

    /// Reading a frame failed.
    #[error("Read failed: {message}")]
    Read {
        /// Description of the failure.
        message: String,
    },

    /// Closing the transport failed.
    #[error("Close failed: {message}")]
    Close {
        /// Description of the failure.
        message: String,
    },

    /// The peer closed the connection or the stream ended.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // External Errors
    // ========================================================================
    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates an already exists error.
    #[inline]
    pub fn already_exists(url: impl Into<String>) -> Self {
        Self::AlreadyExists { url: url.into() }
    }

    /// Creates a not found error.
    #[inline]
    pub fn not_found(client_id: ClientId) -> Self {
        Self::NotFound { client_id }
    }

    /// Creates an already connected error.
    #[inline]
    pub fn already_connected(client_id: ClientId) -> Self {
        Self::AlreadyConnected { client_id }
    }

    /// Creates a not connected error.
    #[inline]
    pub fn not_connected(client_id: ClientId) -> Self {
        Self::NotConnected { client_id }
    }

    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid URL error.
    #[inline]
    pub fn invalid_url(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a dial error.
    #[inline]
    pub fn dial(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Dial {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a read error.
    #[inline]
    pub fn read(message: impl Into<String>) -> Self {
        Self::Read {
            message: message.into(),
        }
    }

    /// Creates a close error.
    #[inline]
    pub fn close(message: impl Into<String>) -> Self {
        Self::Close {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this error came from the transport.
    #[inline]
    #[must_use]
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            Self::Dial { .. }
                | Self::Read { .. }
                | Self::Close { .. }
                | Self::ConnectionClosed
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if the reconnect loop retries after this error.
    ///
    /// Close failures are reported, never retried.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Dial { .. } | Self::Read { .. } | Self::ConnectionClosed | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this is a not found error.
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::already_exists("ws://a");
        assert_eq!(err.to_string(), "Client already exists: ws://a");

        let err = Error::not_found(ClientId::new(7));
        assert_eq!(err.to_string(), "Client not found: 7");
    }

    #[test]
    fn test_dial_display() {
        let err = Error::dial("ws://127.0.0.1:1", "connection refused");
        assert_eq!(
            err.to_string(),
            "Dial to ws://127.0.0.1:1 failed: connection refused"
        );
    }

    #[test]
    fn test_is_transport_error() {
        assert!(Error::dial("ws://a", "x").is_transport_error());
        assert!(Error::read("x").is_transport_error());
        assert!(Error::close("x").is_transport_error());
        assert!(Error::ConnectionClosed.is_transport_error());
        assert!(!Error::Shutdown.is_transport_error());
        assert!(!Error::not_found(ClientId::new(0)).is_transport_error());
    }

    #[test]
    fn test_is_retryable() {
        assert!(Error::dial("ws://a", "x").is_retryable());
        assert!(Error::ConnectionClosed.is_retryable());
        assert!(!Error::close("x").is_retryable());
        assert!(!Error::already_connected(ClientId::new(1)).is_retryable());
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::not_found(ClientId::new(3)).is_not_found());
        assert!(!Error::not_connected(ClientId::new(3)).is_not_found());
    }

    #[test]
    fn test_from_ws_error() {
        let err: Error = WsError::ConnectionClosed.into();
        assert!(matches!(err, Error::WebSocket(_)));
        assert!(err.is_transport_error());
    }
}
