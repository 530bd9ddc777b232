//! Production observability metrics
//!
//! Counters and histograms for catalog requests, rate-limit pauses and
//! per-language jobs.
//!
//! ## Architecture
//!
//! - Uses the `metrics` crate facade; without an installed recorder every
//!   call is a no-op, so library users pay nothing
//! - [`init_metrics`] installs the Prometheus exporter and its scrape endpoint

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Global metrics registry initialization flag
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Correlation ID generator for request tracing
static CORRELATION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Initialize metrics system with Prometheus exporter
///
/// Idempotent: later calls return `Ok(())` without rebinding. Must run inside
/// a tokio runtime, the exporter spawns its HTTP listener on it.
pub fn init_metrics(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        debug!("Metrics already initialized, skipping");
        return Ok(());
    }

    info!("Initializing metrics system on {}", addr);

    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        METRICS_INITIALIZED.store(false, Ordering::SeqCst);
        return Err(format!("Failed to install Prometheus exporter: {e}").into());
    }

    describe_counter!(
        "http_requests_total",
        Unit::Count,
        "Total number of HTTP requests made to the GPC API"
    );

    describe_counter!(
        "http_429_errors_total",
        Unit::Count,
        "Total number of 429 rate limit errors received"
    );

    describe_histogram!(
        "http_request_duration_seconds",
        Unit::Seconds,
        "HTTP request duration in seconds"
    );

    describe_counter!(
        "rate_limit_pauses_total",
        Unit::Count,
        "Total number of cooldown pauses after a rate limit error"
    );

    describe_counter!(
        "transport_retries_total",
        Unit::Count,
        "Total number of job attempts retried after a connection failure"
    );

    describe_counter!(
        "jobs_finished_total",
        Unit::Count,
        "Total number of languages downloaded successfully"
    );

    describe_counter!(
        "jobs_failed_total",
        Unit::Count,
        "Total number of languages whose download failed"
    );

    describe_counter!(
        "jobs_cancelled_total",
        Unit::Count,
        "Total number of languages cancelled before completion"
    );

    describe_counter!(
        "bytes_downloaded_total",
        Unit::Bytes,
        "Total bytes written to publication files"
    );

    info!("Metrics system initialized successfully on {}", addr);
    Ok(())
}

/// Check if metrics system is initialized
pub fn is_initialized() -> bool {
    METRICS_INITIALIZED.load(Ordering::SeqCst)
}

/// Generate a new correlation ID for request tracing
pub fn generate_correlation_id() -> String {
    let id = CORRELATION_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
    format!("req-{id:08x}")
}

/// Record an HTTP request with timing
pub struct HttpRequestMetrics {
    endpoint: String,
    start_time: Instant,
    correlation_id: String,
    attempt: u32,
}

impl HttpRequestMetrics {
    /// Start recording a new HTTP request
    pub fn start(endpoint: impl Into<String>, attempt: u32) -> Self {
        Self {
            endpoint: endpoint.into(),
            start_time: Instant::now(),
            correlation_id: generate_correlation_id(),
            attempt,
        }
    }

    /// Record completion of the HTTP request
    pub fn record_complete(&self, status_code: u16) {
        let duration = self.start_time.elapsed();

        counter!(
            "http_requests_total",
            "endpoint" => self.endpoint.clone(),
            "status" => status_code.to_string(),
        )
        .increment(1);

        histogram!(
            "http_request_duration_seconds",
            "endpoint" => self.endpoint.clone(),
        )
        .record(duration.as_secs_f64());

        if status_code == 429 {
            counter!(
                "http_429_errors_total",
                "endpoint" => self.endpoint.clone(),
            )
            .increment(1);

            warn!(
                correlation_id = %self.correlation_id,
                endpoint = %self.endpoint,
                attempt = self.attempt,
                duration_ms = duration.as_millis(),
                "Rate limit error (429) recorded"
            );
        }

        debug!(
            correlation_id = %self.correlation_id,
            endpoint = %self.endpoint,
            status = status_code,
            duration_ms = duration.as_millis(),
            "HTTP request completed"
        );
    }

    /// Record a network error (no status code)
    pub fn record_network_error(&self) {
        let duration = self.start_time.elapsed();

        counter!(
            "http_requests_total",
            "endpoint" => self.endpoint.clone(),
            "status" => "network_error",
        )
        .increment(1);

        warn!(
            correlation_id = %self.correlation_id,
            endpoint = %self.endpoint,
            attempt = self.attempt,
            duration_ms = duration.as_millis(),
            "Network error recorded"
        );
    }

    /// Get the correlation ID for this request
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }
}

/// Record a cooldown pause after HTTP 429
pub fn record_rate_limit_pause(language: &str, attempt: u32, cooldown: Duration) {
    counter!("rate_limit_pauses_total", "language" => language.to_string()).increment(1);
    debug!(
        language = %language,
        attempt = attempt,
        cooldown_ms = cooldown.as_millis(),
        "Rate limit pause recorded"
    );
}

/// Record a job attempt retried after a connection failure
pub fn record_transport_retry(language: &str, attempt: u32, backoff: Duration) {
    counter!("transport_retries_total", "language" => language.to_string()).increment(1);
    debug!(
        language = %language,
        attempt = attempt,
        backoff_ms = backoff.as_millis(),
        "Transport retry recorded"
    );
}

/// Per-language job metrics
pub struct JobMetrics {
    language: String,
    start_time: Instant,
}

impl JobMetrics {
    /// Start tracking a job
    pub fn start(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            start_time: Instant::now(),
        }
    }

    /// Record successful completion
    pub fn record_success(&self, bytes: u64) {
        counter!("jobs_finished_total").increment(1);
        counter!("bytes_downloaded_total", "language" => self.language.clone()).increment(bytes);

        info!(
            language = %self.language,
            bytes = bytes,
            duration_secs = self.start_time.elapsed().as_secs(),
            "Language download completed"
        );
    }

    /// Record a failed job
    pub fn record_failure(&self, error: &str) {
        counter!("jobs_failed_total", "language" => self.language.clone()).increment(1);

        error!(
            language = %self.language,
            error = %error,
            duration_secs = self.start_time.elapsed().as_secs(),
            "Language download failed"
        );
    }

    /// Record a cancelled job
    pub fn record_cancelled(&self) {
        counter!("jobs_cancelled_total").increment(1);

        warn!(
            language = %self.language,
            duration_secs = self.start_time.elapsed().as_secs(),
            "Language download cancelled"
        );
    }
}
