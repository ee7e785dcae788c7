//! Streaming archive download.

use std::path::{Path, PathBuf};

use coob_schema::PackageReference;
use futures::StreamExt;
use reqwest::Client;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::Reporter;

/// Errors from downloading an archive.
#[derive(Error, Debug)]
pub enum DownloadError {
    /// Network error or timeout.
    #[error("HTTP error fetching {url}: {source}")]
    Http {
        /// Archive URL.
        url: String,
        /// Transport error.
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP status.
    #[error("{url} returned HTTP {status}")]
    Status {
        /// Archive URL.
        url: String,
        /// Status received.
        status: reqwest::StatusCode,
    },

    /// The local file could not be written.
    #[error("IO error writing {}: {source}", .path.display())]
    Io {
        /// File being written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Stream `url` into `dest`, reporting progress against `reference`.
///
/// Returns the number of bytes written. A partially written file is removed
/// before an error is returned.
///
/// # Errors
///
/// Returns [`DownloadError::Http`] on a network error or timeout,
/// [`DownloadError::Status`] on a non-success status, and
/// [`DownloadError::Io`] if `dest` cannot be written.
pub async fn download_to_file(
    client: &Client,
    url: &str,
    dest: &Path,
    reference: &PackageReference,
    reporter: &dyn Reporter,
) -> Result<u64, DownloadError> {
    let result = stream_to_file(client, url, dest, reference, reporter).await;
    if result.is_err() {
        tokio::fs::remove_file(dest).await.ok();
    }
    result
}

async fn stream_to_file(
    client: &Client,
    url: &str,
    dest: &Path,
    reference: &PackageReference,
    reporter: &dyn Reporter,
) -> Result<u64, DownloadError> {
    let http = |source| DownloadError::Http {
        url: url.to_string(),
        source,
    };
    let io = |source| DownloadError::Io {
        path: dest.to_path_buf(),
        source,
    };

    let response = client.get(url).send().await.map_err(http)?;
    if !response.status().is_success() {
        return Err(DownloadError::Status {
            url: url.to_string(),
            status: response.status(),
        });
    }

    let total_size = response.content_length();
    reporter.downloading(&reference.id, &reference.version, 0, total_size);

    let mut file = File::create(dest).await.map_err(io)?;
    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(http)?;
        file.write_all(&chunk).await.map_err(io)?;
        downloaded += chunk.len() as u64;
        reporter.downloading(&reference.id, &reference.version, downloaded, total_size);
    }

    file.flush().await.map_err(io)?;
    file.sync_all().await.map_err(io)?;

    debug!(url, bytes = downloaded, dest = %dest.display(), "download complete");
    Ok(downloaded)
}
