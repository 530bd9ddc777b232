//! Per-language download job and its outcome

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, warn, Instrument};

use super::config::DownloadConfig;
use super::fetcher::RetryingFetcher;
use super::progress::{EventSender, JobEvent, JobReporter};
use super::retry::JobAttempt;
use super::DownloadError;
use crate::catalog::CatalogService;
use crate::metrics::{self, JobMetrics};
use crate::output::{FileSink, OutputPathBuilder};
use crate::shutdown::{run_unless_shutdown, SharedShutdown};
use crate::{FileFormat, Language};

/// Final job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Publication written
    Completed,
    /// Job gave up
    Failed,
    /// Shutdown requested before the job finished
    Cancelled,
}

/// How a job ended
#[derive(Debug)]
pub enum JobOutcome {
    /// Publication written
    Finished {
        /// Publication version (e.g. "v20230605")
        version: String,
        /// Final file path
        path: PathBuf,
        /// File size
        bytes: u64,
    },
    /// Job gave up
    Failed(DownloadError),
    /// Shutdown requested before the job finished
    Cancelled,
}

impl JobOutcome {
    /// Status of this outcome
    pub fn status(&self) -> JobStatus {
        match self {
            JobOutcome::Finished { .. } => JobStatus::Completed,
            JobOutcome::Failed(_) => JobStatus::Failed,
            JobOutcome::Cancelled => JobStatus::Cancelled,
        }
    }
}

/// Outcome of one language's job
#[derive(Debug)]
pub struct JobReport {
    /// Language identifier
    pub language_id: u32,
    /// Lowercased language code
    pub language_code: String,
    /// How the job ended
    pub outcome: JobOutcome,
}

struct Downloaded {
    version: String,
    path: PathBuf,
    bytes: u64,
}

/// Downloads the newest publication of one language
pub struct LanguageJob<C: ?Sized> {
    catalog: Arc<C>,
    fetcher: RetryingFetcher<C>,
    output_dir: PathBuf,
    format: FileFormat,
    attempts: JobAttempt,
    shutdown: Option<SharedShutdown>,
    events: Option<EventSender>,
}

impl<C: CatalogService + ?Sized> LanguageJob<C> {
    /// Create a job writing into `output_dir`
    pub fn new(catalog: Arc<C>, output_dir: impl Into<PathBuf>, config: &DownloadConfig) -> Self {
        let fetcher = RetryingFetcher::new(catalog.clone(), config.rate_limit)
            .with_shutdown(config.shutdown.clone());
        Self {
            catalog,
            fetcher,
            output_dir: output_dir.into(),
            format: config.format,
            attempts: config.job_attempts,
            shutdown: config.shutdown.clone(),
            events: None,
        }
    }

    /// Send job events to `events`
    pub fn with_events(mut self, events: Option<EventSender>) -> Self {
        self.events = events;
        self
    }

    /// Output directory
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Run the job for `language` once a slot on `gate` is free
    ///
    /// Never fails: errors are reported in the returned [`JobReport`].
    pub async fn run(&self, gate: &Semaphore, language: &Language) -> JobReport {
        let reporter = JobReporter::new(language, self.events.clone());
        let span = tracing::info_span!(
            "language_job",
            language = %reporter.language_code(),
            language_id = language.language_id,
        );

        let outcome = self.run_gated(gate, language, &reporter).instrument(span).await;

        JobReport {
            language_id: language.language_id,
            language_code: reporter.language_code().to_string(),
            outcome,
        }
    }

    async fn run_gated(&self, gate: &Semaphore, language: &Language, reporter: &JobReporter) -> JobOutcome {
        let permit = match run_unless_shutdown(self.shutdown.as_ref(), gate.acquire()).await {
            Some(Ok(permit)) => permit,
            // Closed gate or shutdown while queued
            Some(Err(_)) | None => {
                reporter.emit(JobEvent::Cancelled);
                return JobOutcome::Cancelled;
            }
        };

        reporter.emit(JobEvent::Started);
        let job_metrics = JobMetrics::start(reporter.language_code());
        info!("Language download started");

        let outcome = match self.download(language, reporter).await {
            Ok(Downloaded {
                version,
                path,
                bytes,
            }) => {
                job_metrics.record_success(bytes);
                reporter.emit(JobEvent::Finished {
                    path: path.clone(),
                    bytes,
                });
                JobOutcome::Finished {
                    version,
                    path,
                    bytes,
                }
            }
            Err(DownloadError::Cancelled) => {
                job_metrics.record_cancelled();
                reporter.emit(JobEvent::Cancelled);
                JobOutcome::Cancelled
            }
            Err(e) => {
                job_metrics.record_failure(&e.to_string());
                reporter.emit(JobEvent::Failed {
                    reason: e.to_string(),
                });
                JobOutcome::Failed(e)
            }
        };

        // The slot is held until the terminal event is out
        drop(permit);
        outcome
    }

    async fn download(&self, language: &Language, reporter: &JobReporter) -> Result<Downloaded, DownloadError> {
        let publications = run_unless_shutdown(
            self.shutdown.as_ref(),
            self.catalog.list_publications(language.language_id),
        )
        .await
        .ok_or(DownloadError::Cancelled)??;

        // The registry lists the newest publication first
        let publication = publications
            .into_iter()
            .next()
            .ok_or_else(|| DownloadError::NoPublications {
                language: reporter.language_code().to_string(),
            })?;

        let path = OutputPathBuilder::new(&self.output_dir, language, &publication)
            .with_format(self.format)
            .build();
        let mut sink = FileSink::create(&path).await?;

        let mut attempt = 0;
        let bytes = loop {
            attempt += 1;
            match self
                .fetcher
                .fetch(&mut sink, publication.publication_id, self.format, reporter)
                .await
            {
                Ok(bytes) => break bytes,
                Err(e) if self.attempts.should_retry(attempt, &e) => {
                    let backoff = self.attempts.backoff(attempt);
                    warn!(
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Connection failure, retrying download"
                    );
                    metrics::record_transport_retry(reporter.language_code(), attempt, backoff);
                    reporter.emit(JobEvent::Retrying {
                        attempt,
                        backoff,
                        reason: e.to_string(),
                    });

                    if run_unless_shutdown(self.shutdown.as_ref(), tokio::time::sleep(backoff))
                        .await
                        .is_none()
                    {
                        sink.discard().await;
                        return Err(DownloadError::Cancelled);
                    }
                }
                Err(e) => {
                    sink.discard().await;
                    return Err(e);
                }
            }
        };

        let path = sink.commit().await?;
        Ok(Downloaded {
            version: publication.version,
            path,
            bytes,
        })
    }
}
