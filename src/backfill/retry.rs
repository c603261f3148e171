//! Bounded per-window retry policy
//!
//! Delays are fixed per error class; only a rate-limit response can change
//! the wait, and only to what the server asked for. Nothing grows
//! exponentially: the attempt bound alone limits how long a bad day can stall
//! the run.

use crate::fetcher::FetchError;
use std::time::Duration;

/// Attempts per window.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Wait after a network failure or malformed body.
pub const DEFAULT_ERROR_DELAY: Duration = Duration::from_secs(3);

/// Wait after an HTTP error status.
pub const DEFAULT_HTTP_ERROR_DELAY: Duration = Duration::from_secs(6);

/// Wait after a 429 that carried no usable `Retry-After`.
pub const DEFAULT_RATE_LIMIT_FALLBACK: Duration = Duration::from_secs(6);

/// Retry bound and delays applied uniformly to every window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per window, including the first
    pub max_attempts: u32,
    /// Wait after network failures and malformed responses
    pub error_delay: Duration,
    /// Wait after HTTP error statuses other than 429
    pub http_error_delay: Duration,
    /// Wait after a 429 without a `Retry-After` hint
    pub rate_limit_fallback: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            error_delay: DEFAULT_ERROR_DELAY,
            http_error_delay: DEFAULT_HTTP_ERROR_DELAY,
            rate_limit_fallback: DEFAULT_RATE_LIMIT_FALLBACK,
        }
    }
}

impl RetryPolicy {
    /// Derive delays from the inter-request delay: errors wait one base delay,
    /// HTTP errors and unhinted rate limits wait two.
    ///
    /// Returns `None` when the doubled delay does not fit in a [`Duration`].
    pub fn from_base_delay(max_attempts: u32, base_delay: Duration) -> Option<Self> {
        let doubled = base_delay.checked_mul(2)?;
        Some(Self {
            max_attempts,
            error_delay: base_delay,
            http_error_delay: doubled,
            rate_limit_fallback: doubled,
        })
    }

    /// Whether another attempt may follow attempt number `attempt` (1-based).
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// How long to wait after `error` before the next attempt.
    pub fn delay_for(&self, error: &FetchError) -> Duration {
        match error {
            FetchError::RateLimited { retry_after } => {
                retry_after.unwrap_or(self.rate_limit_fallback)
            }
            FetchError::HttpError { .. } => self.http_error_delay,
            _ => self.error_delay,
        }
    }
}
