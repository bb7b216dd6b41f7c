//! Retry and backoff policy
//!
//! Pure decision functions over response status codes and attempt
//! counters. The request executor owns the loop; this module only
//! classifies and computes waits.

use std::collections::HashMap;
use std::time::Duration;

/// Fallback wait when a 429 carries no usable Retry-After header
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Retry policy for one logical request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt
    pub max_retries: u32,
    /// Base delay for linear backoff
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    /// Create a policy
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Whether a response status warrants another attempt.
    ///
    /// False once the attempt budget is spent; otherwise true for
    /// server errors (5xx) and rate limiting (429).
    pub fn should_retry(&self, status: u16, attempt: u32) -> bool {
        if attempt >= self.max_retries {
            return false;
        }
        status >= 500 || status == 429
    }

    /// Linear backoff: wait `base_delay * attempt` before the next try
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

/// Check if a response status indicates rate limiting
pub fn is_rate_limited(status: u16) -> bool {
    status == 429
}

/// Extract the Retry-After wait (seconds) from response headers.
///
/// Defaults to [`DEFAULT_RETRY_AFTER_SECS`] when the header is absent
/// or unparsable. This wait takes precedence over linear backoff.
pub fn retry_after(headers: &HashMap<String, String>) -> u64 {
    headers
        .get("retry-after")
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}
