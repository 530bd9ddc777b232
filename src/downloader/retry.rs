//! Retry policies
//!
//! Two policies nest inside every job:
//!
//! - [`RateLimitBackoff`] (inner): the fetcher pauses for a fixed cooldown
//!   after every HTTP 429 and tries the same download again.
//! - [`JobAttempt`] (outer): the job re-runs the whole fetch after a
//!   connection-level failure (DNS, connect, timeout, reset), backing off
//!   exponentially. HTTP error statuses other than 429 are never retried.

use std::time::Duration;

use super::config::{
    INITIAL_BACKOFF_MS, JOB_MAX_ATTEMPTS, MAX_BACKOFF_MS, RATE_LIMIT_COOLDOWN,
    RATE_LIMIT_MAX_ATTEMPTS,
};
use super::DownloadError;

/// Fixed-delay retry on "too many requests"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitBackoff {
    /// Total fetch attempts, the first one included
    pub max_attempts: u32,
    /// Pause between attempts
    pub cooldown: Duration,
}

impl Default for RateLimitBackoff {
    fn default() -> Self {
        Self::new(RATE_LIMIT_MAX_ATTEMPTS, RATE_LIMIT_COOLDOWN)
    }
}

impl RateLimitBackoff {
    /// Create a policy (at least one attempt)
    pub fn new(max_attempts: u32, cooldown: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            cooldown,
        }
    }

    /// Whether another attempt may follow attempt number `attempt` (1-based)
    pub fn allows_retry_after(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

/// Outer job attempts, spent on connection-level failures only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobAttempt {
    /// Total attempts, the first one included
    pub max_attempts: u32,
    /// Delay after the first failed attempt
    pub initial_backoff: Duration,
    /// Upper bound of the exponential delay
    pub max_backoff: Duration,
}

impl Default for JobAttempt {
    fn default() -> Self {
        Self {
            max_attempts: JOB_MAX_ATTEMPTS,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
            max_backoff: Duration::from_millis(MAX_BACKOFF_MS),
        }
    }
}

impl JobAttempt {
    /// Create a policy (at least one attempt)
    pub fn new(max_attempts: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            max_backoff,
        }
    }

    /// Delay after failed attempt number `attempt` (1-based), doubling each time
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }

    /// Whether `error` after attempt number `attempt` warrants another attempt
    pub fn should_retry(&self, attempt: u32, error: &DownloadError) -> bool {
        attempt < self.max_attempts && error.is_transient()
    }
}
