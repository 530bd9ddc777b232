//! Integration tests for the concurrency gate

use crate::support::fake_catalog::{drain, fast_config, FakeCatalog};
use gpc_downloader::downloader::{BulkDownloader, JobEvent, LanguageEvent};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc::unbounded_channel;

/// Highest number of jobs between `Started` and their terminal event
fn max_running(events: &[LanguageEvent]) -> usize {
    let mut running = 0usize;
    let mut max = 0usize;
    for event in events {
        match event.event {
            JobEvent::Started => {
                running += 1;
                max = max.max(running);
            }
            ref e if e.is_terminal() => running = running.saturating_sub(1),
            _ => {}
        }
    }
    max
}

fn catalog_with(languages: u32) -> FakeCatalog {
    (1..=languages).fold(
        FakeCatalog::new().with_stream_delay(Duration::from_millis(30)),
        |catalog, id| catalog.with_language(id, &format!("L{id}")),
    )
}

#[tokio::test]
async fn test_thirty_languages_never_exceed_twenty_five() {
    let dir = TempDir::new().unwrap();
    let catalog = Arc::new(catalog_with(30));
    let languages = catalog.languages();
    let (tx, mut rx) = unbounded_channel();

    let report = BulkDownloader::new(catalog.clone(), fast_config().with_concurrency(25))
        .with_events(tx)
        .run(dir.path(), &languages)
        .await
        .unwrap();

    assert_eq!(report.finished(), 30);
    assert!(catalog.max_in_flight() <= 25);

    let events = drain(&mut rx);
    assert_eq!(max_running(&events), 25);
}

#[tokio::test]
async fn test_concurrency_of_one_runs_serially() {
    let dir = TempDir::new().unwrap();
    let catalog = Arc::new(catalog_with(4));
    let languages = catalog.languages();
    let (tx, mut rx) = unbounded_channel();

    let report = BulkDownloader::new(catalog.clone(), fast_config().with_concurrency(1))
        .with_events(tx)
        .run(dir.path(), &languages)
        .await
        .unwrap();

    assert_eq!(report.finished(), 4);
    assert_eq!(catalog.max_in_flight(), 1);
    assert_eq!(max_running(&drain(&mut rx)), 1);
}
