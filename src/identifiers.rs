//! Type-safe identifiers for pooled clients.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ClientId`] | Registry-unique client identifier |
//! | [`Target`] | One client, or every client currently registered |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// ClientId
// ============================================================================

/// Identifier of a client within one registry.
///
/// Allocated by the registry as the lowest value not in use, so identifiers
/// of removed clients are reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(u32);

impl ClientId {
    /// First identifier handed out by a registry.
    pub const FIRST: Self = Self(0);

    /// Creates a client ID from a raw value.
    #[inline]
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    /// Returns the following identifier, or `None` on overflow.
    #[inline]
    #[must_use]
    pub const fn next(&self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ClientId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

// ============================================================================
// Target
// ============================================================================

/// Selects the clients a bulk setter applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Every client registered when the call is made.
    All,
    /// A single client.
    Client(ClientId),
}

impl From<ClientId> for Target {
    #[inline]
    fn from(id: ClientId) -> Self {
        Self::Client(id)
    }
}

// ============================================================================
// Tests
// ============================================================================
