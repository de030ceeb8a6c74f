//! WebSocket transport layer.
//!
//! The reconnect loop only needs three primitives from a transport: dial,
//! read one data frame, and close. They are expressed as the [`Dialer`] and
//! [`Transport`] traits so the loop can be driven by the real
//! tokio-tungstenite client or by any other implementation.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `dialer` | [`Dialer`] and [`Transport`] traits |
//! | `websocket` | tokio-tungstenite implementation |

// ============================================================================
// Submodules
// ============================================================================

/// Transport traits.
pub mod dialer;

/// tokio-tungstenite client transport.
pub mod websocket;

/// Scripted in-memory transport for tests.
#[cfg(test)]
pub(crate) mod mock;

// ============================================================================
// Re-exports
// ============================================================================

pub use dialer::{Dialer, Transport};
pub use websocket::{TungsteniteDialer, TungsteniteTransport};
