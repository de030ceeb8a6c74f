//! tokio-tungstenite client transport.
//!
//! Handshake, framing, masking and ping/pong are handled by tungstenite.
//! This module only adapts its stream to [`Transport`].

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::protocol::Frame;

use super::dialer::{Dialer, Transport};

// ============================================================================
// Types
// ============================================================================

/// Client-side WebSocket stream.
type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================================================
// TungsteniteDialer
// ============================================================================

/// Dials endpoints with [`tokio_tungstenite::connect_async`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TungsteniteDialer;

impl TungsteniteDialer {
    /// Creates a new dialer.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Dialer for TungsteniteDialer {
    async fn dial(&self, url: &str) -> Result<Box<dyn Transport>> {
        let (stream, response) = connect_async(url)
            .await
            .map_err(|e| Error::dial(url, e.to_string()))?;

        debug!(url, status = %response.status(), "WebSocket handshake completed");

        Ok(Box::new(TungsteniteTransport { stream }))
    }
}

// ============================================================================
// TungsteniteTransport
// ============================================================================

/// A connected tokio-tungstenite stream.
pub struct TungsteniteTransport {
    stream: WsStream,
}

#[async_trait]
impl Transport for TungsteniteTransport {
    async fn read_frame(&mut self) -> Result<Frame> {
        loop {
            match self.stream.next().await {
                Some(Ok(WsMessage::Text(text))) => return Ok(Frame::text(text.as_str())),

                Some(Ok(WsMessage::Binary(data))) => return Ok(Frame::binary(data.to_vec())),

                Some(Ok(WsMessage::Close(frame))) => {
                    debug!(?frame, "WebSocket closed by remote");
                    return Err(Error::ConnectionClosed);
                }

                // Ping, Pong, raw frames
                Some(Ok(other)) => {
                    trace!(len = other.len(), "Control frame skipped");
                }

                Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) | None => {
                    return Err(Error::ConnectionClosed);
                }

                Some(Err(e)) => return Err(e.into()),
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self.stream.close(None).await {
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Ok(()),
            Err(e) => Err(Error::close(e.to_string())),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
