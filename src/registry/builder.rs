//! Builder pattern for registry configuration.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use ws_client_pool::{Registry, RetryLimit};
//!
//! # fn example() -> ws_client_pool::Result<()> {
//! let registry = Registry::builder()
//!     .queue_capacity(1024)
//!     .max_retry(RetryLimit::Unlimited)
//!     .retry_interval(Duration::from_secs(1))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use crate::client::{ClientOptions, RetryLimit};
use crate::error::{Error, Result};
use crate::transport::{Dialer, TungsteniteDialer};

use super::core::Registry;

// ============================================================================
// Constants
// ============================================================================

/// Default capacity of each shared queue.
pub const DEFAULT_QUEUE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(10_240) {
    Some(capacity) => capacity,
    None => panic!("default queue capacity must be non-zero"),
};

// ============================================================================
// RegistryBuilder
// ============================================================================

/// Builder for configuring a [`Registry`].
///
/// Use [`Registry::builder()`] to create a new builder.
#[derive(Clone)]
pub struct RegistryBuilder {
    /// Capacity of the message queue and of the event queue.
    queue_capacity: usize,
    /// Retry policy given to every new client.
    options: ClientOptions,
    /// Transport used by every client.
    dialer: Option<Arc<dyn Dialer>>,
}

impl fmt::Debug for RegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryBuilder")
            .field("queue_capacity", &self.queue_capacity)
            .field("options", &self.options)
            .field("custom_dialer", &self.dialer.is_some())
            .finish()
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// RegistryBuilder Implementation
// ============================================================================

impl RegistryBuilder {
    /// Creates a builder with the default configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY.get(),
            options: ClientOptions::default(),
            dialer: None,
        }
    }

    /// Sets the capacity of each shared queue.
    #[inline]
    #[must_use]
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Sets the default retry limit for new clients.
    #[inline]
    #[must_use]
    pub fn max_retry(mut self, max_retry: impl Into<RetryLimit>) -> Self {
        self.options.max_retry = max_retry.into();
        self
    }

    /// Sets the default retry interval for new clients.
    #[inline]
    #[must_use]
    pub fn retry_interval(mut self, retry_interval: Duration) -> Self {
        self.options.retry_interval = retry_interval;
        self
    }

    /// Sets the default retry policy for new clients.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the dialer. Defaults to [`TungsteniteDialer`].
    #[inline]
    #[must_use]
    pub fn dialer(mut self, dialer: Arc<dyn Dialer>) -> Self {
        self.dialer = Some(dialer);
        self
    }

    /// Builds the registry with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the queue capacity is zero
    /// - [`Error::Config`] if the retry interval is zero
    pub fn build(self) -> Result<Registry> {
        let capacity = NonZeroUsize::new(self.queue_capacity).ok_or_else(|| {
            Error::config("Queue capacity must be greater than zero. Use .queue_capacity(n) with n > 0")
        })?;
        self.options.validate()?;

        let dialer = self
            .dialer
            .unwrap_or_else(|| Arc::new(TungsteniteDialer::new()));

        Ok(Registry::from_parts(capacity, self.options, dialer))
    }
}

// ============================================================================
// Tests
// ============================================================================
