//! Download sinks
//!
//! A sink receives the bytes of one publication as they stream in. The
//! retrying fetcher calls [`DownloadSink::reset`] before every attempt so a
//! rate-limited attempt never leaves stale bytes in front of the next one.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, warn};

pub mod path;

pub use path::{ensure_output_dir, partial_path, OutputPathBuilder};

/// Output errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// Buffer flush error
    #[error("flush error: {0}")]
    FlushError(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for a streamed publication
#[async_trait]
pub trait DownloadSink: Send {
    /// Discard everything written so far
    async fn reset(&mut self) -> OutputResult<()>;

    /// Append one chunk
    async fn write_chunk(&mut self, chunk: &[u8]) -> OutputResult<()>;

    /// Bytes currently held by the sink
    fn bytes_written(&self) -> u64;
}

#[async_trait]
impl DownloadSink for Vec<u8> {
    async fn reset(&mut self) -> OutputResult<()> {
        self.clear();
        Ok(())
    }

    async fn write_chunk(&mut self, chunk: &[u8]) -> OutputResult<()> {
        self.extend_from_slice(chunk);
        Ok(())
    }

    fn bytes_written(&self) -> u64 {
        self.len() as u64
    }
}

/// File sink writing to `{path}.part` and renamed to `path` on commit
#[derive(Debug)]
pub struct FileSink {
    file: File,
    final_path: PathBuf,
    partial_path: PathBuf,
    bytes_written: u64,
}

impl FileSink {
    /// Create (or truncate) the partial file for `final_path`
    pub async fn create(final_path: impl Into<PathBuf>) -> OutputResult<Self> {
        let final_path = final_path.into();
        let partial_path = partial_path(&final_path);

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&partial_path)
            .await
            .map_err(|e| {
                OutputError::IoError(format!("Failed to open {}: {e}", partial_path.display()))
            })?;

        debug!(path = %partial_path.display(), "Opened download sink");

        Ok(Self {
            file,
            final_path,
            partial_path,
            bytes_written: 0,
        })
    }

    /// Path the file is renamed to on commit
    pub fn final_path(&self) -> &Path {
        &self.final_path
    }

    /// Flush, close and move the partial file into place
    ///
    /// On failure the partial file is removed before the error is returned.
    pub async fn commit(mut self) -> OutputResult<PathBuf> {
        if let Err(e) = self.sync().await {
            self.discard().await;
            return Err(e);
        }

        let Self {
            file,
            final_path,
            partial_path,
            ..
        } = self;
        drop(file);

        if let Err(e) = tokio::fs::rename(&partial_path, &final_path).await {
            remove_partial(&partial_path).await;
            return Err(OutputError::IoError(format!(
                "Failed to move {} to {}: {e}",
                partial_path.display(),
                final_path.display()
            )));
        }

        Ok(final_path)
    }

    /// Close the file and remove the partial download
    pub async fn discard(self) {
        drop(self.file);
        remove_partial(&self.partial_path).await;
    }

    async fn sync(&mut self) -> OutputResult<()> {
        self.file
            .flush()
            .await
            .map_err(|e| OutputError::FlushError(e.to_string()))?;
        self.file
            .sync_all()
            .await
            .map_err(|e| OutputError::FlushError(e.to_string()))
    }
}

async fn remove_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!(
            path = %path.display(),
            error = %e,
            "Failed to remove partial download"
        );
    }
}

#[async_trait]
impl DownloadSink for FileSink {
    async fn reset(&mut self) -> OutputResult<()> {
        self.file
            .set_len(0)
            .await
            .map_err(|e| OutputError::IoError(format!("Failed to truncate: {e}")))?;
        self.file
            .rewind()
            .await
            .map_err(|e| OutputError::IoError(format!("Failed to rewind: {e}")))?;
        self.bytes_written = 0;
        Ok(())
    }

    async fn write_chunk(&mut self, chunk: &[u8]) -> OutputResult<()> {
        self.file
            .write_all(chunk)
            .await
            .map_err(|e| OutputError::IoError(format!("Failed to write: {e}")))?;
        self.bytes_written += chunk.len() as u64;
        Ok(())
    }

    fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}
