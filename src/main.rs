//! Main entry point for the gpc-downloader CLI

use clap::Parser;
use gpc_downloader::cli::{Cli, CliError, Commands};
use gpc_downloader::metrics;
use gpc_downloader::shutdown::ShutdownCoordinator;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber with optional JSON formatting
fn init_tracing() {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("gpc_downloader=info"));

    // Logs go to stderr, stdout carries command output
    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    if let Some(addr) = cli.metrics_addr {
        if let Err(e) = metrics::init_metrics(addr) {
            error!("Failed to start metrics exporter: {}", e);
            std::process::exit(1);
        }
    }

    // Ctrl+C cancels queued and running jobs; partial files are removed
    let shutdown = ShutdownCoordinator::shared();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Ctrl+C received - cancelling downloads...");
                shutdown.request_shutdown();
            }
        }
    });

    let result: anyhow::Result<()> = match cli.command {
        Commands::Download(ref args) => args
            .execute(&cli, shutdown.clone())
            .await
            .map(|_| ())
            .map_err(anyhow::Error::from),
        Commands::Languages(ref cmd) => cmd.execute().await.map_err(anyhow::Error::from),
        Commands::Inspect(ref cmd) => cmd.execute().map_err(anyhow::Error::from),
    };

    if let Err(e) = result {
        if let Some(CliError::UnknownLanguage(_)) = e.downcast_ref::<CliError>() {
            eprintln!("Unknown language");
        } else {
            error!("Command failed: {}", e);
            eprintln!("Error: {e}");
        }
        std::process::exit(1);
    }
}
