//! Registry of supervised clients.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                  Registry                    │
//! │  ┌────────────────────────────────────────┐  │
//! │  │ ClientId=0 → Client (ws://a) ──┐       │  │
//! │  │ ClientId=1 → Client (ws://b) ──┼─► messages
//! │  │ ClientId=2 → Client (ws://c) ──┴─► events │
//! │  └────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Registry`] | Owns the clients and the two shared queues |
//! | [`RegistryBuilder`] | Queue capacity, default retry policy, dialer |

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder for registry configuration.
pub mod builder;

/// Registry implementation.
pub mod core;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::RegistryBuilder;
pub use core::Registry;
