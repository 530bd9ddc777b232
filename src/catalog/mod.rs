//! Remote catalog access
//!
//! The GS1 GPC registry exposes three operations: list the supported
//! languages, list the publications of one language (newest first), and
//! download a publication file. [`CatalogService`] is the seam the
//! downloader works against; [`GpcHttpClient`] is the production
//! implementation.

use crate::{FileFormat, Language, Publication};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;
use std::pin::Pin;

pub mod gs1_config;
pub mod http;
pub mod selector;
pub mod shared_resources;

pub use gs1_config::Gs1ApiConfig;
pub use http::GpcHttpClient;
pub use selector::{find_language, LanguageSelector};

/// HTTP status the registry answers with when throttling
pub const TOO_MANY_REQUESTS: u16 = 429;

/// Catalog errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// HTTP 429, recoverable by waiting
    #[error("rate limit exceeded")]
    RateLimited,

    /// Any other HTTP or network failure
    #[error("transport error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Transport {
        /// HTTP status, absent for connection-level failures
        status: Option<u16>,
        /// Error details
        message: String,
    },

    /// Response envelope or payload did not match the documented shape
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),
}

impl CatalogError {
    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        if status == TOO_MANY_REQUESTS {
            CatalogError::RateLimited
        } else {
            CatalogError::Transport {
                status: Some(status),
                message: message.into(),
            }
        }
    }

    /// Network failure with no HTTP status attached
    pub fn network(message: impl Into<String>) -> Self {
        CatalogError::Transport {
            status: None,
            message: message.into(),
        }
    }

    /// Whether this is a rate-limit signal
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, CatalogError::RateLimited)
    }

    /// Whether the failure happened below HTTP (DNS, connect, timeout, reset)
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, CatalogError::Transport { status: None, .. })
    }
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Byte stream of a publication file
pub type ByteStream = Pin<Box<dyn Stream<Item = CatalogResult<Bytes>> + Send>>;

/// Remote catalog of languages and publications
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// List every language the registry publishes in
    async fn list_languages(&self) -> CatalogResult<Vec<Language>>;

    /// List publications of one language, newest first
    async fn list_publications(&self, language_id: u32) -> CatalogResult<Vec<Publication>>;

    /// Open a publication file in the requested format
    ///
    /// Errors raised before the first byte (including HTTP 429) are returned
    /// directly; errors while streaming surface as stream items.
    async fn stream_file(&self, publication_id: u32, format: FileFormat) -> CatalogResult<ByteStream>;
}

/// Resolve a user-supplied selector against the registry's language list
///
/// Returns `Ok(None)` when nothing matches.
pub async fn resolve_language<C>(catalog: &C, selector: &str) -> CatalogResult<Option<Language>>
where
    C: CatalogService + ?Sized,
{
    let languages = catalog.list_languages().await?;
    let selector = LanguageSelector::parse(selector);
    Ok(find_language(&languages, &selector).cloned())
}
