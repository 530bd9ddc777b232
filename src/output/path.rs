//! Output file naming
//!
//! Every language's publication lands directly in the output directory as
//! `{language code}-{version}.{ext}`, e.g. `gpc-dump/hr-v20230605.json`.
//! Files are streamed into a sibling `.part` file first and renamed once the
//! download completes.

use super::{OutputError, OutputResult};
use crate::{FileFormat, Language, Publication};
use std::path::{Path, PathBuf};

/// Path builder for one language's publication file
#[derive(Debug, Clone)]
pub struct OutputPathBuilder {
    root_dir: PathBuf,
    language_code: String,
    version: String,
    format: FileFormat,
}

impl OutputPathBuilder {
    /// Create a new path builder
    ///
    /// # Security
    ///
    /// Language code and version come from the remote service and are
    /// sanitized: `/`, `\`, `:` and `..` are replaced with `_`.
    pub fn new(root_dir: impl Into<PathBuf>, language: &Language, publication: &Publication) -> Self {
        Self {
            root_dir: root_dir.into(),
            language_code: sanitize_component(&language.language_code.to_lowercase()),
            version: sanitize_component(&publication.version),
            format: FileFormat::default(),
        }
    }

    /// Set the file format (drives the extension)
    pub fn with_format(mut self, format: FileFormat) -> Self {
        self.format = format;
        self
    }

    /// File stem, also used to name the job in progress output (e.g. `hr-v20230605`)
    pub fn stem(&self) -> String {
        format!("{}-{}", self.language_code, self.version)
    }

    /// Build the final file path
    pub fn build(&self) -> PathBuf {
        self.root_dir
            .join(format!("{}.{}", self.stem(), self.format.extension()))
    }

    /// Build the temporary path written during the download
    pub fn build_partial(&self) -> PathBuf {
        partial_path(&self.build())
    }
}

/// Temporary sibling used while `path` is being downloaded
pub fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

/// Create the output directory and its parents
pub async fn ensure_output_dir(dir: &Path) -> OutputResult<()> {
    tokio::fs::create_dir_all(dir).await.map_err(|e| {
        OutputError::IoError(format!("Failed to create directory {}: {}", dir.display(), e))
    })
}

fn sanitize_component(name: &str) -> String {
    name.replace("..", "__").replace(['/', '\\', ':'], "_")
}
