//! Download configuration constants and the run configuration

use crate::shutdown::SharedShutdown;
use crate::FileFormat;
use std::time::Duration;

use super::retry::{JobAttempt, RateLimitBackoff};

/// Maximum number of per-language jobs running at once.
/// The registry throttles per client; more parallel jobs only buy more 429s.
pub const MAX_CONCURRENT_JOBS: usize = 25;

/// Attempts the fetcher makes while the registry keeps answering 429.
pub const RATE_LIMIT_MAX_ATTEMPTS: u32 = 40;

/// Fixed pause after a 429 before the same fetch is tried again.
pub const RATE_LIMIT_COOLDOWN: Duration = Duration::from_secs(10);

/// Outer attempts per job, spent only on connection-level failures.
pub const JOB_MAX_ATTEMPTS: u32 = 40;

/// Initial backoff delay in milliseconds for connection-level failures.
pub const INITIAL_BACKOFF_MS: u64 = 1000; // 1 second

/// Maximum backoff delay in milliseconds.
pub const MAX_BACKOFF_MS: u64 = 30000; // 30 seconds

/// Configuration of one bulk download run
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Concurrency cap (at least 1)
    pub concurrency: usize,
    /// Format every publication is downloaded in
    pub format: FileFormat,
    /// Inner retry policy for HTTP 429
    pub rate_limit: RateLimitBackoff,
    /// Outer retry policy for connection failures
    pub job_attempts: JobAttempt,
    /// Cancellation handle shared by all jobs
    pub shutdown: Option<SharedShutdown>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            concurrency: MAX_CONCURRENT_JOBS,
            format: FileFormat::Json,
            rate_limit: RateLimitBackoff::default(),
            job_attempts: JobAttempt::default(),
            shutdown: None,
        }
    }
}

impl DownloadConfig {
    /// Set the concurrency cap (clamped to at least 1)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set the download format
    pub fn with_format(mut self, format: FileFormat) -> Self {
        self.format = format;
        self
    }

    /// Override the rate-limit policy
    pub fn with_rate_limit_backoff(mut self, policy: RateLimitBackoff) -> Self {
        self.rate_limit = policy;
        self
    }

    /// Override the outer attempt policy
    pub fn with_job_attempts(mut self, policy: JobAttempt) -> Self {
        self.job_attempts = policy;
        self
    }

    /// Attach a shared shutdown handle for cancellation
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }
}
