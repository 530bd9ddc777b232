//! In-memory catalog service with scripted download replies

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use gpc_downloader::catalog::{ByteStream, CatalogError, CatalogResult, CatalogService};
use gpc_downloader::downloader::{DownloadConfig, JobAttempt, LanguageEvent, RateLimitBackoff};
use gpc_downloader::{FileFormat, Language, Publication};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

/// One scripted answer to `stream_file`
#[derive(Debug, Clone)]
pub enum Reply {
    /// Stream the body in two chunks
    Body(Vec<u8>),
    /// HTTP 429
    RateLimited,
    /// Any other HTTP status
    Status(u16),
    /// Connection failure before the first byte
    Disconnect,
    /// First chunk of a body, then a connection reset
    Truncated(Vec<u8>),
}

/// Catalog fake. Replies per publication are consumed in order, the last one repeats.
#[derive(Default)]
pub struct FakeCatalog {
    languages: Vec<Language>,
    publications: HashMap<u32, Vec<Publication>>,
    scripts: Mutex<HashMap<u32, VecDeque<Reply>>>,
    calls: Mutex<HashMap<u32, u32>>,
    stream_delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a language with one publication `id * 100`, version `v2023{id:04}`
    pub fn with_language(mut self, id: u32, code: &str) -> Self {
        self.languages.push(language(id, code));
        self.publications
            .insert(id, vec![publication(id * 100, id, &format!("v2023{id:04}"))]);
        self
    }

    /// Replace the publications listed for a language
    pub fn with_publications(mut self, language_id: u32, publications: Vec<Publication>) -> Self {
        self.publications.insert(language_id, publications);
        self
    }

    /// Script the replies for one publication
    pub fn script(self, publication_id: u32, replies: Vec<Reply>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(publication_id, replies.into());
        self
    }

    /// Hold every `stream_file` call for `delay` before answering
    pub fn with_stream_delay(mut self, delay: Duration) -> Self {
        self.stream_delay = delay;
        self
    }

    pub fn languages(&self) -> Vec<Language> {
        self.languages.clone()
    }

    /// `stream_file` calls made for a publication
    pub fn calls(&self, publication_id: u32) -> u32 {
        self.calls
            .lock()
            .unwrap()
            .get(&publication_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> u32 {
        self.calls.lock().unwrap().values().sum()
    }

    /// Most `stream_file` calls seen at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_reply(&self, publication_id: u32) -> Reply {
        *self.calls.lock().unwrap().entry(publication_id).or_insert(0) += 1;

        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(&publication_id) {
            Some(replies) if replies.len() > 1 => replies.pop_front().unwrap(),
            Some(replies) => replies.front().cloned().unwrap(),
            None => Reply::Body(default_body(publication_id)),
        }
    }
}

#[async_trait]
impl CatalogService for FakeCatalog {
    async fn list_languages(&self) -> CatalogResult<Vec<Language>> {
        Ok(self.languages.clone())
    }

    async fn list_publications(&self, language_id: u32) -> CatalogResult<Vec<Publication>> {
        Ok(self
            .publications
            .get(&language_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn stream_file(&self, publication_id: u32, _format: FileFormat) -> CatalogResult<ByteStream> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if !self.stream_delay.is_zero() {
            tokio::time::sleep(self.stream_delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let items: Vec<CatalogResult<Bytes>> = match self.next_reply(publication_id) {
            Reply::Body(body) => {
                let (head, tail) = body.split_at(body.len() / 2);
                vec![Ok(Bytes::copy_from_slice(head)), Ok(Bytes::copy_from_slice(tail))]
            }
            Reply::RateLimited => return Err(CatalogError::RateLimited),
            Reply::Status(status) => return Err(CatalogError::from_status(status, "scripted failure")),
            Reply::Disconnect => return Err(CatalogError::network("connection refused")),
            Reply::Truncated(head) => vec![
                Ok(Bytes::from(head)),
                Err(CatalogError::network("connection reset by peer")),
            ],
        };
        Ok(Box::pin(futures::stream::iter(items)))
    }
}

pub fn default_body(publication_id: u32) -> Vec<u8> {
    format!(
        "{{\"LanguageCode\":\"XX\",\"DateUtc\":\"05/06/2023\",\"Publication\":{publication_id},\"Schema\":[]}}"
    )
    .into_bytes()
}

pub fn language(id: u32, code: &str) -> Language {
    serde_json::from_value(serde_json::json!({
        "languageId": id,
        "languageCode": code,
        "countryCode": code,
        "languageName": format!("Language {id}"),
        "culture": format!("{}-{}", code.to_lowercase(), code),
        "isActive": true,
        "freeToDownload": true,
        "rightToLeft": false,
        "showInBrowser": true,
        "usePublicationBlobs": false,
        "lastUpdate": "2023-06-05T00:00:00"
    }))
    .unwrap()
}

pub fn publication(id: u32, language_id: u32, version: &str) -> Publication {
    serde_json::from_value(serde_json::json!({
        "publicationId": id,
        "languageId": language_id,
        "publicationName": "GPC",
        "version": version,
        "browser": true,
        "isGDSN": false,
        "publicationDate": "2023-06-05T00:00:00",
        "insertDate": "2023-06-05T00:00:00",
        "lastUpdate": "2023-06-05T00:00:00"
    }))
    .unwrap()
}

/// Default config without waits between attempts
pub fn fast_config() -> DownloadConfig {
    DownloadConfig::default()
        .with_rate_limit_backoff(RateLimitBackoff::new(40, Duration::ZERO))
        .with_job_attempts(JobAttempt::new(40, Duration::ZERO, Duration::ZERO))
}

/// Drain every event already sent
pub fn drain(rx: &mut UnboundedReceiver<LanguageEvent>) -> Vec<LanguageEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Names of the files left in `dir`, sorted
pub fn files_in(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
