//! Bulk download executor
//!
//! Starts one [`LanguageJob`] per language and lets at most
//! `config.concurrency` of them hold a slot at once. Jobs share nothing but
//! the gate and the event channel, so one failing language never stops the
//! others.

use futures::future::join_all;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::info;

use super::config::DownloadConfig;
use super::job::{JobOutcome, JobReport, JobStatus, LanguageJob};
use super::progress::EventSender;
use super::DownloadError;
use crate::catalog::CatalogService;
use crate::output::ensure_output_dir;
use crate::Language;

/// Outcomes of a bulk run, in the order the languages were given
#[derive(Debug, Default)]
pub struct DownloadReport {
    /// One report per language
    pub jobs: Vec<JobReport>,
}

impl DownloadReport {
    fn count(&self, status: JobStatus) -> usize {
        self.jobs
            .iter()
            .filter(|job| job.outcome.status() == status)
            .count()
    }

    /// Number of languages written
    pub fn finished(&self) -> usize {
        self.count(JobStatus::Completed)
    }

    /// Number of languages that failed
    pub fn failed(&self) -> usize {
        self.count(JobStatus::Failed)
    }

    /// Number of languages cancelled
    pub fn cancelled(&self) -> usize {
        self.count(JobStatus::Cancelled)
    }

    /// Total bytes written
    pub fn total_bytes(&self) -> u64 {
        self.jobs
            .iter()
            .map(|job| match job.outcome {
                JobOutcome::Finished { bytes, .. } => bytes,
                _ => 0,
            })
            .sum()
    }

    /// Failed jobs with their errors
    pub fn failures(&self) -> impl Iterator<Item = (&JobReport, &DownloadError)> {
        self.jobs.iter().filter_map(|job| match &job.outcome {
            JobOutcome::Failed(e) => Some((job, e)),
            _ => None,
        })
    }
}

/// Downloads the newest publication of many languages concurrently
pub struct BulkDownloader<C: ?Sized> {
    catalog: Arc<C>,
    config: DownloadConfig,
    events: Option<EventSender>,
}

impl<C: CatalogService + ?Sized> BulkDownloader<C> {
    /// Create a downloader over `catalog`
    pub fn new(catalog: Arc<C>, config: DownloadConfig) -> Self {
        Self {
            catalog,
            config,
            events: None,
        }
    }

    /// Send every job's events to `events`
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Run configuration
    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Download every language in `languages` into `output_dir`
    ///
    /// Creates the directory first; that is the only failure returned here.
    /// Per-language failures are part of the report.
    pub async fn run(
        &self,
        output_dir: impl AsRef<Path>,
        languages: &[Language],
    ) -> Result<DownloadReport, DownloadError> {
        let output_dir = output_dir.as_ref();
        ensure_output_dir(output_dir).await?;

        let concurrency = self.config.concurrency.max(1);
        info!(
            languages = languages.len(),
            concurrency,
            format = %self.config.format,
            output_dir = %output_dir.display(),
            "Starting bulk download"
        );

        let gate = Semaphore::new(concurrency);
        let job = LanguageJob::new(self.catalog.clone(), output_dir, &self.config)
            .with_events(self.events.clone());

        let jobs = join_all(languages.iter().map(|language| job.run(&gate, language))).await;
        let report = DownloadReport { jobs };

        info!(
            finished = report.finished(),
            failed = report.failed(),
            cancelled = report.cancelled(),
            bytes = report.total_bytes(),
            "Bulk download complete"
        );

        Ok(report)
    }
}
