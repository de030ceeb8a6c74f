//! WS Client Pool - Self-healing WebSocket clients behind one pair of queues.
//!
//! This library keeps many outbound WebSocket connections alive at once and
//! funnels everything they receive into two shared queues.
//!
//! # Architecture
//!
//! The pool is split into two layers:
//!
//! - **Client**: One endpoint, one reconnect loop, bounded retries with a
//!   fixed interval between attempts
//! - **Registry**: Allocates identifiers, starts and stops clients, owns the
//!   message and event queues every client feeds
//!
//! Key design principles:
//!
//! - Each [`Client`] owns: endpoint address + retry policy + reconnect loop
//! - Every queued item carries the [`ClientId`] that produced it
//! - Queues are bounded; a full queue pauses producers until it drains
//! - Nothing is delivered for a client once its removal returns
//!
//! # Quick Start
//!
//! ```no_run
//! use ws_client_pool::{EventKind, Registry, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let registry = Registry::new();
//!     let id = registry.add_client("ws://127.0.0.1:9001")?;
//!
//!     let events = registry.events();
//!     while let Some(event) = events.recv().await {
//!         if event.client_id == id && event.kind == EventKind::Connected {
//!             break;
//!         }
//!     }
//!
//!     if let Some(message) = registry.messages().recv().await {
//!         println!("client {} sent {:?}", message.client_id, message.text());
//!     }
//!
//!     registry.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Reconnect loop and retry options |
//! | [`registry`] | Client registry and builder |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Client identifiers and targets |
//! | [`protocol`] | Messages and lifecycle events |
//! | [`queue`] | Consumer side of the shared queues |
//! | [`transport`] | Dialer and transport traits, tokio-tungstenite backend |

// ============================================================================
// Modules
// ============================================================================

/// Reconnect loop and retry options.
///
/// - [`Client`] - One supervised connection
/// - [`ClientOptions`] - Retry limit and interval
pub mod client;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for pooled clients.
pub mod identifiers;

/// Items delivered to the application.
pub mod protocol;

/// Bounded fan-in queues.
pub mod queue;

/// Client registry.
///
/// Use [`Registry::builder()`] to create a configured registry.
pub mod registry;

/// WebSocket transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{Client, ClientOptions, ConnectionState, RetryLimit};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{ClientId, Target};

// Protocol types
pub use protocol::{Event, EventKind, Frame, FrameKind, Message};

// Queue types
pub use queue::Inbox;

// Registry types
pub use registry::{Registry, RegistryBuilder};

// Transport types
pub use transport::{Dialer, Transport, TungsteniteDialer};
