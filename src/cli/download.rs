//! Download command implementation

use crate::catalog::{find_language, CatalogService, GpcHttpClient, LanguageSelector};
use crate::downloader::config::{MAX_CONCURRENT_JOBS, RATE_LIMIT_MAX_ATTEMPTS};
use crate::downloader::{
    BulkDownloader, DownloadConfig, DownloadReport, EventTally, LanguageEvent, RateLimitBackoff,
};
use crate::shutdown::SharedShutdown;
use crate::FileFormat;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tracing::info;

use super::{CliError, InspectCommand, LanguagesCommand};

/// Parse and validate concurrency value
fn parse_concurrency(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if value == 0 {
        return Err("concurrency must be at least 1".to_string());
    }
    if value > MAX_CONCURRENT_JOBS {
        return Err(format!(
            "concurrency {value} exceeds maximum of {MAX_CONCURRENT_JOBS}"
        ));
    }
    Ok(value)
}

/// GS1 GPC downloader CLI
#[derive(Parser, Debug)]
#[command(name = "gpc-downloader")]
#[command(about = "Download GS1 Global Product Classification publications", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Publication file format: json, xml or xlsx
    #[arg(long, global = true, default_value = "json")]
    pub file_format: FileFormat,

    /// Number of languages downloaded at once (default: 25, max: 25)
    ///
    /// The registry throttles per client; higher values only trade
    /// throughput for more rate-limit pauses.
    #[arg(long, global = true, default_value = "25", value_parser = parse_concurrency)]
    pub concurrency: usize,

    /// Seconds to wait after a "too many requests" response
    #[arg(long, global = true, default_value_t = 10)]
    pub cooldown_secs: u64,

    /// Serve Prometheus metrics on this address (e.g. 127.0.0.1:9000)
    #[arg(long, global = true)]
    pub metrics_addr: Option<SocketAddr>,
}

impl Cli {
    /// Download configuration derived from the global options
    pub fn download_config(&self, shutdown: SharedShutdown) -> DownloadConfig {
        DownloadConfig::default()
            .with_concurrency(self.concurrency)
            .with_format(self.file_format)
            .with_rate_limit_backoff(RateLimitBackoff::new(
                RATE_LIMIT_MAX_ATTEMPTS,
                Duration::from_secs(self.cooldown_secs),
            ))
            .with_shutdown(shutdown)
    }
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download the latest publication of one or all languages
    Download(DownloadArgs),

    /// List the languages the registry publishes in
    Languages(LanguagesCommand),

    /// Summarize a downloaded JSON publication
    Inspect(InspectCommand),
}

/// Download command arguments
#[derive(Parser, Debug)]
pub struct DownloadArgs {
    /// Language to download: id, language code, country code, culture or name.
    /// All languages when omitted.
    #[arg(long)]
    pub lang: Option<String>,

    /// Output directory
    #[arg(long, short, default_value = "gpc-dump")]
    pub output: PathBuf,
}

impl DownloadArgs {
    /// Execute the download against the GS1 registry
    pub async fn execute(&self, cli: &Cli, shutdown: SharedShutdown) -> Result<DownloadReport, CliError> {
        self.execute_with(Arc::new(GpcHttpClient::new()), cli, shutdown)
            .await
    }

    /// Execute the download against `catalog`
    ///
    /// Fails with [`CliError::UnknownLanguage`] before any job starts when
    /// `--lang` matches nothing. Per-language failures are only reported.
    pub async fn execute_with<C>(
        &self,
        catalog: Arc<C>,
        cli: &Cli,
        shutdown: SharedShutdown,
    ) -> Result<DownloadReport, CliError>
    where
        C: CatalogService + ?Sized,
    {
        let languages = catalog.list_languages().await?;
        let languages = match &self.lang {
            Some(raw) => {
                let selector = LanguageSelector::parse(raw);
                let language = find_language(&languages, &selector)
                    .cloned()
                    .ok_or_else(|| CliError::UnknownLanguage(raw.clone()))?;
                vec![language]
            }
            None => languages,
        };

        info!(
            languages = languages.len(),
            output = %self.output.display(),
            "Downloading publications"
        );

        let total = languages.len() as u64;
        let (events, rx) = unbounded_channel();
        let downloader = BulkDownloader::new(catalog, cli.download_config(shutdown)).with_events(events);

        let (report, tally) = tokio::join!(
            async move {
                let report = downloader.run(&self.output, &languages).await;
                // Closes the event channel
                drop(downloader);
                report
            },
            print_events(rx, total)
        );
        let report = report?;

        println!(
            "\nDone: {} finished, {} failed, {} cancelled, {} rate-limit pauses",
            tally.finished, tally.failed, tally.cancelled, tally.paused
        );
        for (job, error) in report.failures() {
            println!("  {}: {error}", job.language_code);
        }

        Ok(report)
    }
}

/// Print events as they arrive until every sender is gone
async fn print_events(mut rx: UnboundedReceiver<LanguageEvent>, total: u64) -> EventTally {
    let pb = create_progress_bar(total);
    let mut tally = EventTally::default();

    while let Some(event) = rx.recv().await {
        tally.record(&event.event);
        if event.event.is_terminal() {
            pb.inc(1);
        }
        pb.suspend(|| println!("{event}"));
    }

    pb.finish_and_clear();
    tally
}

/// Create progress bar with style
fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} languages")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.enable_steady_tick(Duration::from_millis(200));
    pb
}
