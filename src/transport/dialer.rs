//! Transport traits.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;

use crate::error::Result;
use crate::protocol::Frame;

// ============================================================================
// Transport
// ============================================================================

/// A live connection to one remote endpoint.
#[async_trait]
pub trait Transport: Send {
    /// Reads the next data frame.
    ///
    /// Control frames are handled internally and never returned. Must be
    /// cancellation-safe: the caller races it against its command channel.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`](crate::Error::ConnectionClosed) when the peer closes or the stream ends
    /// - [`Error::Read`](crate::Error::Read) or [`Error::WebSocket`](crate::Error::WebSocket) on failure
    async fn read_frame(&mut self) -> Result<Frame>;

    /// Closes the connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Close`](crate::Error::Close) if the close handshake cannot be sent.
    async fn close(&mut self) -> Result<()>;
}

// ============================================================================
// Dialer
// ============================================================================

/// Opens transports.
#[async_trait]
pub trait Dialer: Send + Sync {
    /// Dials `url` and completes the handshake.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dial`](crate::Error::Dial) if the endpoint cannot be reached.
    async fn dial(&self, url: &str) -> Result<Box<dyn Transport>>;
}
