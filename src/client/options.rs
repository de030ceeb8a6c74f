//! Per-client retry configuration.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use ws_client_pool::{ClientOptions, RetryLimit};
//!
//! let options = ClientOptions::new()
//!     .with_max_retry(RetryLimit::Unlimited)
//!     .with_retry_interval(Duration::from_millis(500));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default retry limit.
pub const DEFAULT_MAX_RETRY: u32 = 3;

/// Default delay between attempts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(3);

// ============================================================================
// RetryLimit
// ============================================================================

/// How many consecutive dial failures a client tolerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetryLimit {
    /// Give up once consecutive failures exceed this count.
    Limited(u32),
    /// Retry forever.
    Unlimited,
}

impl RetryLimit {
    /// Converts a raw limit where any negative value means unlimited.
    #[must_use]
    pub fn from_raw(raw: i64) -> Self {
        if raw < 0 {
            Self::Unlimited
        } else {
            Self::Limited(u32::try_from(raw).unwrap_or(u32::MAX))
        }
    }

    /// Returns `true` if `failures` consecutive failures exceed the limit.
    #[inline]
    #[must_use]
    pub const fn is_exceeded(&self, failures: u32) -> bool {
        match self {
            Self::Limited(limit) => failures > *limit,
            Self::Unlimited => false,
        }
    }
}

impl Default for RetryLimit {
    fn default() -> Self {
        Self::Limited(DEFAULT_MAX_RETRY)
    }
}

impl From<u32> for RetryLimit {
    #[inline]
    fn from(limit: u32) -> Self {
        Self::Limited(limit)
    }
}

// ============================================================================
// ClientOptions
// ============================================================================

/// Retry policy of one client.
///
/// Both values may be changed while the reconnect loop runs; the loop reads
/// them again on every attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    /// Consecutive dial failures tolerated before giving up.
    pub max_retry: RetryLimit,

    /// Fixed delay between attempts.
    pub retry_interval: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientOptions {
    /// Creates options with the default policy (3 retries, 3 seconds apart).
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_retry: RetryLimit::Limited(DEFAULT_MAX_RETRY),
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }

    /// Sets the retry limit.
    #[inline]
    #[must_use]
    pub fn with_max_retry(mut self, max_retry: impl Into<RetryLimit>) -> Self {
        self.max_retry = max_retry.into();
        self
    }

    /// Sets the delay between attempts.
    #[inline]
    #[must_use]
    pub const fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the retry interval is zero.
    pub fn validate(&self) -> Result<()> {
        if self.retry_interval.is_zero() {
            return Err(Error::config("Retry interval must be greater than zero"));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ClientOptions::new();
        assert_eq!(options.max_retry, RetryLimit::Limited(3));
        assert_eq!(options.retry_interval, Duration::from_secs(3));
        assert_eq!(options, ClientOptions::default());
    }

    #[test]
    fn test_builder_chain() {
        let options = ClientOptions::new()
            .with_max_retry(RetryLimit::Unlimited)
            .with_retry_interval(Duration::from_millis(250));
        assert_eq!(options.max_retry, RetryLimit::Unlimited);
        assert_eq!(options.retry_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_from_raw() {
        assert_eq!(RetryLimit::from_raw(-1), RetryLimit::Unlimited);
        assert_eq!(RetryLimit::from_raw(0), RetryLimit::Limited(0));
        assert_eq!(RetryLimit::from_raw(5), RetryLimit::Limited(5));
    }

    #[test]
    fn test_is_exceeded() {
        assert!(RetryLimit::Limited(0).is_exceeded(1));
        assert!(!RetryLimit::Limited(2).is_exceeded(2));
        assert!(RetryLimit::Limited(2).is_exceeded(3));
        assert!(!RetryLimit::Unlimited.is_exceeded(u32::MAX));
    }

    #[test]
    fn test_validate_zero_interval() {
        let options = ClientOptions::new().with_retry_interval(Duration::ZERO);
        assert!(matches!(options.validate(), Err(Error::Config { .. })));
        assert!(ClientOptions::new().validate().is_ok());
    }
}
