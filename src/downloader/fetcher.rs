//! Rate-limit aware publication fetcher

use futures::StreamExt;
use std::sync::Arc;
use tracing::{debug, warn};

use super::progress::{JobEvent, JobReporter};
use super::retry::RateLimitBackoff;
use super::DownloadError;
use crate::catalog::{CatalogError, CatalogService};
use crate::metrics;
use crate::output::DownloadSink;
use crate::shutdown::{run_unless_shutdown, SharedShutdown};
use crate::FileFormat;

/// Streams one publication into a sink, pausing on HTTP 429
///
/// Every attempt starts from an empty sink. On 429 the fetcher emits a
/// `Paused` event, sleeps for the cooldown and tries again, up to the
/// policy's attempt limit. Any other error is returned at once.
pub struct RetryingFetcher<C: ?Sized> {
    catalog: Arc<C>,
    policy: RateLimitBackoff,
    shutdown: Option<SharedShutdown>,
}

impl<C: CatalogService + ?Sized> RetryingFetcher<C> {
    /// Create a fetcher over `catalog`
    pub fn new(catalog: Arc<C>, policy: RateLimitBackoff) -> Self {
        Self {
            catalog,
            policy,
            shutdown: None,
        }
    }

    /// Abort waits and streams once shutdown is requested
    pub fn with_shutdown(mut self, shutdown: Option<SharedShutdown>) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Download `publication_id` into `sink`, returning the byte count
    pub async fn fetch<S>(
        &self,
        sink: &mut S,
        publication_id: u32,
        format: FileFormat,
        reporter: &JobReporter,
    ) -> Result<u64, DownloadError>
    where
        S: DownloadSink + ?Sized,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            sink.reset().await?;

            let result =
                run_unless_shutdown(self.shutdown.as_ref(), self.fetch_once(sink, publication_id, format))
                    .await
                    .ok_or(DownloadError::Cancelled)?;

            match result {
                Ok(bytes) => {
                    debug!(publication_id, attempt, bytes, "Publication streamed");
                    return Ok(bytes);
                }
                Err(DownloadError::Catalog(CatalogError::RateLimited)) => {
                    if !self.policy.allows_retry_after(attempt) {
                        warn!(
                            publication_id,
                            attempts = attempt,
                            "Giving up, still rate limited"
                        );
                        return Err(DownloadError::RateLimitExhausted { attempts: attempt });
                    }

                    let cooldown = self.policy.cooldown;
                    reporter.emit(JobEvent::Paused { attempt, cooldown });
                    metrics::record_rate_limit_pause(reporter.language_code(), attempt, cooldown);

                    run_unless_shutdown(self.shutdown.as_ref(), tokio::time::sleep(cooldown))
                        .await
                        .ok_or(DownloadError::Cancelled)?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once<S>(
        &self,
        sink: &mut S,
        publication_id: u32,
        format: FileFormat,
    ) -> Result<u64, DownloadError>
    where
        S: DownloadSink + ?Sized,
    {
        let mut stream = self.catalog.stream_file(publication_id, format).await?;
        while let Some(chunk) = stream.next().await {
            sink.write_chunk(&chunk?).await?;
        }
        Ok(sink.bytes_written())
    }
}
