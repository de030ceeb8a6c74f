//! Items delivered to the application.
//!
//! Every client feeds two shared queues owned by its registry:
//!
//! | Item | Produced when | Queue |
//! |------|---------------|-------|
//! | [`Message`] | A data frame arrives on a connected client | messages |
//! | [`Event`] | The client changes lifecycle state | events |
//!
//! Both carry the originating [`ClientId`](crate::ClientId) so a single
//! consumer can demultiplex by client.
//!
//! # Event Tags
//!
//! | Kind | Tag |
//! |------|-----|
//! | [`EventKind::Connected`] | `connect_success` |
//! | [`EventKind::ConnectFailed`] | `connect_fail` |
//! | [`EventKind::Disconnected`] | `disconnect` |
//! | [`EventKind::ConnectionLost`] | `disconnect_error` |
//! | [`EventKind::RetriesExhausted`] | `max_retry` |

// ============================================================================
// Submodules
// ============================================================================

/// Lifecycle events.
pub mod event;

/// Inbound frames and messages.
pub mod message;

// ============================================================================
// Re-exports
// ============================================================================

pub use event::{Event, EventKind};
pub use message::{Frame, FrameKind, Message};
