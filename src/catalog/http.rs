//! HTTP implementation of the catalog service
//!
//! Listing endpoints answer with an envelope:
//!
//! ```json
//! { "statusCode": 200, "isSuccess": true, "result": [ ... ] }
//! ```
//!
//! Both flags are checked before the payload is trusted. Downloads are
//! streamed straight from the response body.

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::REFERER;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

use super::gs1_config::Gs1ApiConfig;
use super::shared_resources::global_http_client;
use super::{ByteStream, CatalogError, CatalogResult, CatalogService};
use crate::metrics::HttpRequestMetrics;
use crate::{FileFormat, Language, Publication};

/// Response envelope of the listing endpoints
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    /// Status echoed in the body
    pub status_code: u16,
    /// Success flag
    pub is_success: bool,
    /// Payload
    pub result: Option<T>,
}

impl<T> Envelope<T> {
    /// Validate both flags and unwrap the payload
    pub fn into_result(self) -> CatalogResult<T> {
        if self.status_code != 200 {
            return Err(CatalogError::ProtocolViolation(format!(
                "envelope statusCode is {}, expected 200",
                self.status_code
            )));
        }
        if !self.is_success {
            return Err(CatalogError::ProtocolViolation(
                "envelope isSuccess is false".to_string(),
            ));
        }
        self.result
            .ok_or_else(|| CatalogError::ProtocolViolation("envelope has no result".to_string()))
    }
}

/// GS1 GPC API client
#[derive(Clone)]
pub struct GpcHttpClient {
    client: Arc<Client>,
    config: Gs1ApiConfig,
}

impl Default for GpcHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GpcHttpClient {
    /// Client for the production API using the shared connection pool
    pub fn new() -> Self {
        Self::with_config(global_http_client(), Gs1ApiConfig::default())
    }

    /// Client with an explicit HTTP client and endpoint layout
    pub fn with_config(client: Arc<Client>, config: Gs1ApiConfig) -> Self {
        Self { client, config }
    }

    /// Endpoint layout in use
    pub fn config(&self) -> &Gs1ApiConfig {
        &self.config
    }

    async fn send(&self, url: &str, endpoint: &str) -> CatalogResult<Response> {
        let metrics = HttpRequestMetrics::start(endpoint, 1);
        debug!(correlation_id = %metrics.correlation_id(), url = %url, "Making GET request");

        match self
            .client
            .get(url)
            .header(REFERER, &self.config.referer)
            .send()
            .await
        {
            Ok(response) => {
                metrics.record_complete(response.status().as_u16());
                Ok(response)
            }
            Err(e) => {
                metrics.record_network_error();
                Err(classify_reqwest_error(&e))
            }
        }
    }

    /// GET a listing endpoint and unwrap its envelope
    async fn get_envelope<T>(&self, url: &str, endpoint: &str) -> CatalogResult<T>
    where
        T: DeserializeOwned,
    {
        let response = ensure_success(self.send(url, endpoint).await?).await?;

        let envelope: Envelope<T> = response.json().await.map_err(|e| {
            if e.is_decode() {
                CatalogError::ProtocolViolation(format!("Failed to decode envelope: {e}"))
            } else {
                classify_reqwest_error(&e)
            }
        })?;

        envelope.into_result()
    }
}

/// Map a non-success response to a catalog error
async fn ensure_success(response: Response) -> CatalogResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = if body.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {}", truncate(&body, 200))
    };
    Err(CatalogError::from_status(status.as_u16(), message))
}

fn classify_reqwest_error(err: &reqwest::Error) -> CatalogError {
    match err.status() {
        Some(status) => CatalogError::from_status(status.as_u16(), err.to_string()),
        None => CatalogError::network(err.to_string()),
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[async_trait]
impl CatalogService for GpcHttpClient {
    async fn list_languages(&self) -> CatalogResult<Vec<Language>> {
        let url = self.config.languages_url();
        self.get_envelope(&url, self.config.languages_endpoint).await
    }

    async fn list_publications(&self, language_id: u32) -> CatalogResult<Vec<Publication>> {
        let url = self.config.publications_url(language_id);
        self.get_envelope(&url, self.config.publications_endpoint)
            .await
    }

    async fn stream_file(&self, publication_id: u32, format: FileFormat) -> CatalogResult<ByteStream> {
        let url = self.config.download_url(publication_id, format);
        let mut response = self.send(&url, self.config.download_endpoint).await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            let fallback = self.config.dynamic_download_url(publication_id, format);
            info!(
                publication_id = publication_id,
                url = %fallback,
                "Publication blob not found, trying dynamic download"
            );
            response = self
                .send(&fallback, self.config.dynamic_download_endpoint)
                .await?;
        }

        let response = ensure_success(response).await?;
        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| classify_reqwest_error(&e)));
        Ok(Box::pin(stream))
    }
}
