//! CLI error types and conversions

use crate::catalog::CatalogError;
use crate::downloader::DownloadError;
use crate::output::OutputError;
use crate::taxonomy::TaxonomyError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The language selector matched nothing
    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    /// Catalog error
    #[error("catalog error: {0}")]
    CatalogError(#[from] CatalogError),

    /// Download error
    #[error("download error: {0}")]
    DownloadError(#[from] DownloadError),

    /// Taxonomy error
    #[error("taxonomy error: {0}")]
    TaxonomyError(#[from] TaxonomyError),

    /// Output error
    #[error("output error: {0}")]
    OutputError(#[from] OutputError),

    /// JSON rendering of command output failed
    #[error("failed to render JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}
