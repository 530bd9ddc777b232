//! Integration tests for the bulk download of many languages

use crate::support::fake_catalog::{
    default_body, drain, fast_config, files_in, publication, FakeCatalog, Reply,
};
use gpc_downloader::catalog::CatalogError;
use gpc_downloader::downloader::{BulkDownloader, DownloadError, JobEvent, JobOutcome};
use gpc_downloader::FileFormat;
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::mpsc::unbounded_channel;

#[tokio::test]
async fn test_every_language_is_written() {
    let dir = TempDir::new().unwrap();
    let catalog = Arc::new(
        FakeCatalog::new()
            .with_language(1, "EN")
            .with_language(2, "FR")
            .with_language(30, "HR"),
    );
    let languages = catalog.languages();

    let report = BulkDownloader::new(catalog.clone(), fast_config())
        .run(dir.path(), &languages)
        .await
        .unwrap();

    assert_eq!(report.finished(), 3);
    assert_eq!(report.failed(), 0);
    assert_eq!(
        files_in(dir.path()),
        vec!["en-v20230001.json", "fr-v20230002.json", "hr-v20230030.json"]
    );
    assert_eq!(
        std::fs::read(dir.path().join("hr-v20230030.json")).unwrap(),
        default_body(3000)
    );

    let expected: u64 = [100, 200, 3000]
        .iter()
        .map(|&id| default_body(id).len() as u64)
        .sum();
    assert_eq!(report.total_bytes(), expected);
}

#[tokio::test]
async fn test_report_keeps_input_order() {
    let dir = TempDir::new().unwrap();
    let catalog = Arc::new(
        FakeCatalog::new()
            .with_language(5, "DE")
            .with_language(3, "NL")
            .with_language(9, "ES"),
    );
    let languages = catalog.languages();

    let report = BulkDownloader::new(catalog, fast_config())
        .run(dir.path(), &languages)
        .await
        .unwrap();

    let codes: Vec<_> = report.jobs.iter().map(|j| j.language_code.as_str()).collect();
    assert_eq!(codes, vec!["de", "nl", "es"]);
}

#[tokio::test]
async fn test_first_listed_publication_is_chosen() {
    let dir = TempDir::new().unwrap();
    let catalog = Arc::new(FakeCatalog::new().with_language(1, "EN").with_publications(
        1,
        vec![
            publication(12, 1, "v20231130"),
            publication(11, 1, "v20230605"),
            publication(10, 1, "v20221130"),
        ],
    ));
    let languages = catalog.languages();

    let report = BulkDownloader::new(catalog.clone(), fast_config())
        .run(dir.path(), &languages)
        .await
        .unwrap();

    assert_eq!(report.finished(), 1);
    assert_eq!(catalog.calls(12), 1);
    assert_eq!(catalog.calls(11), 0);
    assert_eq!(files_in(dir.path()), vec!["en-v20231130.json"]);
}

#[tokio::test]
async fn test_http_error_fails_one_language_only() {
    let dir = TempDir::new().unwrap();
    let catalog = Arc::new(
        FakeCatalog::new()
            .with_language(1, "EN")
            .with_language(2, "FR")
            .with_language(3, "IT")
            .script(200, vec![Reply::Status(500)]),
    );
    let languages = catalog.languages();

    let report = BulkDownloader::new(catalog.clone(), fast_config())
        .run(dir.path(), &languages)
        .await
        .unwrap();

    assert_eq!(report.finished(), 2);
    assert_eq!(report.failed(), 1);
    assert_eq!(catalog.calls(200), 1);

    let (failed, error) = report.failures().next().unwrap();
    assert_eq!(failed.language_code, "fr");
    assert!(matches!(
        error,
        DownloadError::Catalog(CatalogError::Transport {
            status: Some(500),
            ..
        })
    ));
    assert_eq!(
        files_in(dir.path()),
        vec!["en-v20230001.json", "it-v20230003.json"]
    );
}

#[tokio::test]
async fn test_language_without_publications_fails() {
    let dir = TempDir::new().unwrap();
    let catalog = Arc::new(
        FakeCatalog::new()
            .with_language(1, "EN")
            .with_language(2, "FR")
            .with_publications(2, Vec::new()),
    );
    let languages = catalog.languages();

    let report = BulkDownloader::new(catalog.clone(), fast_config())
        .run(dir.path(), &languages)
        .await
        .unwrap();

    assert_eq!(report.finished(), 1);
    assert!(matches!(
        report.jobs[1].outcome,
        JobOutcome::Failed(DownloadError::NoPublications { .. })
    ));
    assert_eq!(catalog.total_calls(), 1);
}

#[tokio::test]
async fn test_format_drives_extension() {
    let dir = TempDir::new().unwrap();
    let catalog = Arc::new(FakeCatalog::new().with_language(1, "EN"));
    let languages = catalog.languages();

    BulkDownloader::new(catalog, fast_config().with_format(FileFormat::Xlsx))
        .run(dir.path(), &languages)
        .await
        .unwrap();

    assert_eq!(files_in(dir.path()), vec!["en-v20230001.xlsx"]);
}

#[tokio::test]
async fn test_events_follow_job_lifecycle() {
    let dir = TempDir::new().unwrap();
    let catalog = Arc::new(
        FakeCatalog::new()
            .with_language(1, "EN")
            .with_language(2, "FR")
            .script(100, vec![Reply::RateLimited, Reply::Body(b"{}".to_vec())])
            .script(200, vec![Reply::Status(404)]),
    );
    let languages = catalog.languages();
    let (tx, mut rx) = unbounded_channel();

    BulkDownloader::new(catalog, fast_config())
        .with_events(tx)
        .run(dir.path(), &languages)
        .await
        .unwrap();

    let mut per_language: HashMap<String, Vec<JobEvent>> = HashMap::new();
    for event in drain(&mut rx) {
        per_language
            .entry(event.language_code)
            .or_default()
            .push(event.event);
    }

    let en = &per_language["en"];
    assert_eq!(en.len(), 3);
    assert_eq!(en[0], JobEvent::Started);
    assert!(matches!(en[1], JobEvent::Paused { attempt: 1, .. }));
    assert!(matches!(&en[2], JobEvent::Finished { bytes: 2, .. }));

    let fr = &per_language["fr"];
    assert_eq!(fr[0], JobEvent::Started);
    assert!(matches!(&fr[1], JobEvent::Failed { reason } if reason.contains("404")));
    assert_eq!(fr.len(), 2);
}

#[tokio::test]
async fn test_connection_failures_retry_whole_download() {
    let dir = TempDir::new().unwrap();
    let catalog = Arc::new(FakeCatalog::new().with_language(1, "EN").script(
        100,
        vec![
            Reply::Disconnect,
            Reply::Truncated(b"{\"Schema\":".to_vec()),
            Reply::Body(b"{\"Schema\":[]}".to_vec()),
        ],
    ));
    let languages = catalog.languages();
    let (tx, mut rx) = unbounded_channel();

    let report = BulkDownloader::new(catalog.clone(), fast_config())
        .with_events(tx)
        .run(dir.path(), &languages)
        .await
        .unwrap();

    assert_eq!(report.finished(), 1);
    assert_eq!(catalog.calls(100), 3);
    assert_eq!(
        std::fs::read(dir.path().join("en-v20230001.json")).unwrap(),
        b"{\"Schema\":[]}"
    );

    let retries = drain(&mut rx)
        .into_iter()
        .filter(|e| matches!(e.event, JobEvent::Retrying { .. }))
        .count();
    assert_eq!(retries, 2);
}

#[tokio::test]
async fn test_failed_download_leaves_no_partial_file() {
    let dir = TempDir::new().unwrap();
    let catalog = Arc::new(
        FakeCatalog::new()
            .with_language(1, "EN")
            .script(100, vec![Reply::Truncated(b"{\"Sch".to_vec()), Reply::Status(503)]),
    );
    let languages = catalog.languages();

    let report = BulkDownloader::new(catalog, fast_config())
        .run(dir.path(), &languages)
        .await
        .unwrap();

    assert_eq!(report.failed(), 1);
    assert!(files_in(dir.path()).is_empty());
}
