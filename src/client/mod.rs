//! Resilient WebSocket clients.
//!
//! A [`Client`] owns one logical connection to one endpoint and runs a
//! reconnect-and-receive loop that feeds inbound frames and lifecycle events
//! into queues supplied by its owner.
//!
//! # State Machine
//!
//! ```text
//! Disconnected ──► Connecting ──► Connected
//!      ▲               │              │
//!      └── backoff ◄───┴──────────────┘
//!                      │
//!                      ▼
//!                  Terminated   (voluntary stop, retries exhausted)
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Retry configuration.
pub mod options;

/// The reconnect loop.
pub mod supervisor;

// ============================================================================
// Re-exports
// ============================================================================

pub use options::{ClientOptions, RetryLimit};
pub use supervisor::{Client, ConnectionState};
