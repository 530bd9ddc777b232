//! # GPC Downloader Library
//!
//! Bulk downloader for the GS1 Global Product Classification (GPC). The GS1
//! registry publishes the taxonomy once per supported language; this crate
//! fetches the latest publication of every requested language and writes it
//! to disk, and parses the JSON publication back into a typed category tree.
//!
//! ## Features
//!
//! - **Bounded fan-out**: one download job per language, at most 25 in flight
//! - **Rate-limit aware**: HTTP 429 responses pause the job and retry after a
//!   fixed cooldown instead of failing it
//! - **Isolated failures**: a failing language never aborts its siblings
//! - **Typed taxonomy**: depth-guarded parser for the nested `Childs` document
//!
//! ## Quick Start
//!
//! ```no_run
//! use gpc_downloader::catalog::{CatalogService, GpcHttpClient};
//! use gpc_downloader::downloader::{BulkDownloader, DownloadConfig};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = Arc::new(GpcHttpClient::new());
//! let languages = catalog.list_languages().await?;
//!
//! let downloader = BulkDownloader::new(catalog, DownloadConfig::default());
//! let report = downloader.run("./gpc-dump", &languages).await?;
//! println!("{} finished, {} failed", report.finished(), report.failed());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`catalog`] - Remote catalog service trait and its HTTP implementation
//! - [`downloader`] - Retrying fetcher, per-language jobs and the bulk orchestrator
//! - [`output`] - Download sinks and output file naming
//! - [`taxonomy`] - Category tree model and builder
//! - [`shutdown`] - Cooperative cancellation shared by all jobs
//! - [`metrics`] - Prometheus counters for requests, pauses and jobs

#![warn(missing_docs)]
#![warn(clippy::all)]

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// CLI command implementations
pub mod cli;

/// Remote catalog access
pub mod catalog;

/// Download orchestration
pub mod downloader;

/// Production metrics
pub mod metrics;

/// Download sinks and output paths
pub mod output;

/// Graceful shutdown coordination shared across modules
pub mod shutdown;

/// Category tree model and parser
pub mod taxonomy;

pub use taxonomy::{Categories, Category};

/// A language the registry publishes the taxonomy in.
///
/// Decoded from one entry of the `language/all` listing. Identity is
/// [`Language::language_id`]; every other field is descriptive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Language {
    /// Numeric identifier (e.g. 30)
    pub language_id: u32,
    /// Language code (e.g. "HR")
    pub language_code: String,
    /// Country code (e.g. "HR")
    pub country_code: String,
    /// Display name (e.g. "Croatian")
    pub language_name: String,
    /// Locale tag (e.g. "hr-HR")
    pub culture: String,
    /// Whether the language is active in the registry
    pub is_active: bool,
    /// Whether publications can be downloaded without an account
    pub free_to_download: bool,
    /// Whether the language is written right-to-left
    pub right_to_left: bool,
    /// Whether the language is listed in the GPC browser
    pub show_in_browser: bool,
    /// Whether publications are served from blob storage
    pub use_publication_blobs: bool,
    /// Whether publications carry attributes and values
    #[serde(default)]
    pub include_attribute_and_values: bool,
    /// Member organisation contact address
    #[serde(default)]
    pub mo_contact_email: Option<String>,
    /// Last time the registry touched this language
    pub last_update: NaiveDateTime,
}

/// One dated, versioned release of the taxonomy for a language.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Publication {
    /// Numeric identifier (e.g. 130)
    pub publication_id: u32,
    /// Owning language identifier
    pub language_id: u32,
    /// Human-readable name (e.g. "GPC as of May 2023")
    pub publication_name: String,
    /// Version tag (e.g. "v20230605")
    pub version: String,
    /// Whether the publication is browsable online
    pub browser: bool,
    /// Whether this is the GDSN variant of the publication
    #[serde(rename = "isGDSN")]
    pub is_gdsn: bool,
    /// Archive the publication belongs to, if any
    #[serde(default)]
    pub publication_archive_id: Option<u32>,
    /// Link or name of the release notes attachment
    #[serde(default)]
    pub release_note_attachment: Option<String>,
    /// Publication timestamp
    pub publication_date: NaiveDateTime,
    /// Insertion timestamp
    pub insert_date: NaiveDateTime,
    /// Last update timestamp
    pub last_update: NaiveDateTime,
    /// Uploader identity
    #[serde(default)]
    pub user_id: Option<String>,
    /// Uploader display name
    #[serde(default)]
    pub user_name: Option<String>,
}

/// File format a publication can be downloaded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// JSON document (parseable with [`taxonomy::parse_document`])
    #[default]
    Json,
    /// XML document
    Xml,
    /// Excel workbook
    Xlsx,
}

impl FileFormat {
    /// Path segment used by the download endpoint, also the file extension.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Json => "json",
            FileFormat::Xml => "xml",
            FileFormat::Xlsx => "xlsx",
        }
    }

    /// File extension of downloaded files in this format.
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(FileFormat::Json),
            "xml" => Ok(FileFormat::Xml),
            "xlsx" => Ok(FileFormat::Xlsx),
            _ => Err(format!(
                "Invalid file format: {s}. Valid options: json, xml, xlsx"
            )),
        }
    }
}
