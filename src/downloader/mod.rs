//! Download orchestration
//!
//! This module turns a list of languages into one publication file each.
//!
//! # Overview
//!
//! 1. **Bulk run**: [`executor::BulkDownloader`] creates the output directory
//!    and starts one job per language behind a concurrency gate
//! 2. **Per-language job**: [`job::LanguageJob`] picks the newest publication,
//!    opens a sink and drives the fetcher under the outer [`JobAttempt`] policy
//! 3. **Retrying fetch**: [`fetcher::RetryingFetcher`] streams the file and
//!    rides out HTTP 429 with the fixed-cooldown [`RateLimitBackoff`] policy
//! 4. **Events**: every job reports `started`, `paused`, `retrying` and one
//!    terminal event through [`progress::JobEvent`]
//!
//! # Quick Start
//!
//! ```no_run
//! use gpc_downloader::catalog::GpcHttpClient;
//! use gpc_downloader::downloader::{BulkDownloader, DownloadConfig};
//! use gpc_downloader::Language;
//! use std::sync::Arc;
//!
//! # async fn example(languages: Vec<Language>) -> Result<(), Box<dyn std::error::Error>> {
//! let (events, mut rx) = tokio::sync::mpsc::unbounded_channel();
//! let downloader = BulkDownloader::new(Arc::new(GpcHttpClient::new()), DownloadConfig::default())
//!     .with_events(events);
//!
//! tokio::spawn(async move {
//!     while let Some(event) = rx.recv().await {
//!         println!("{event}");
//!     }
//! });
//!
//! let report = downloader.run("./gpc-dump", &languages).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! Rate-limit errors never leave the fetcher. Every other error ends only the
//! job that hit it and is recorded in that job's [`JobOutcome`]; the bulk run
//! itself fails only when the output directory cannot be created.

pub mod config;
pub mod executor;
pub mod fetcher;
pub mod job;
pub mod progress;
pub mod retry;

pub use config::DownloadConfig;
pub use executor::{BulkDownloader, DownloadReport};
pub use fetcher::RetryingFetcher;
pub use job::{JobOutcome, JobReport, JobStatus, LanguageJob};
pub use progress::{EventSender, EventTally, JobEvent, JobReporter, LanguageEvent};
pub use retry::{JobAttempt, RateLimitBackoff};

use crate::catalog::CatalogError;
use crate::output::OutputError;

/// Download errors
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// Catalog request failed
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// The registry lists no publication for the language
    #[error("no publication available for language {language}")]
    NoPublications {
        /// Language code
        language: String,
    },

    /// Sink or output directory error
    #[error("output error: {0}")]
    Output(#[from] OutputError),

    /// Still rate limited after the last allowed attempt
    #[error("still rate limited after {attempts} attempts")]
    RateLimitExhausted {
        /// Attempts made
        attempts: u32,
    },

    /// Shutdown was requested before the job finished
    #[error("cancelled")]
    Cancelled,
}

impl DownloadError {
    /// Whether re-running the whole fetch may succeed (connection-level failures)
    pub fn is_transient(&self) -> bool {
        matches!(self, DownloadError::Catalog(e) if e.is_connection_failure())
    }
}
