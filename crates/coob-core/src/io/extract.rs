//! Archive extraction.
//!
//! Extraction is a capability: the fetcher depends on [`Extractor`] and the
//! default [`ZipExtractor`] is a thin adapter over the `zip` crate. The
//! target folder is always cleared first so files from a previously
//! extracted version never linger.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

/// Errors from unpacking an archive.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The archive is not a readable zip container.
    #[error("corrupt or unreadable archive {}: {source}", .path.display())]
    Archive {
        /// Archive file.
        path: PathBuf,
        /// Zip error.
        #[source]
        source: zip::result::ZipError,
    },

    /// A filesystem operation failed.
    #[error("IO error extracting into {}: {source}", .path.display())]
    Io {
        /// Path being read or written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The blocking extraction task panicked or was cancelled.
    #[error("extraction task failed: {0}")]
    Task(String),
}

/// Unpacks an archive file into a directory.
pub trait Extractor: Send + Sync {
    /// Extract `archive` into the existing, empty directory `dest`.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive is unreadable or a file cannot be
    /// written.
    fn extract(&self, archive: &Path, dest: &Path) -> Result<(), ExtractError>;
}

/// Extracts standard zip containers (the `.coob` payload format).
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipExtractor;

impl Extractor for ZipExtractor {
    fn extract(&self, archive: &Path, dest: &Path) -> Result<(), ExtractError> {
        let file = File::open(archive).map_err(|source| ExtractError::Io {
            path: archive.to_path_buf(),
            source,
        })?;
        let corrupt = |source| ExtractError::Archive {
            path: archive.to_path_buf(),
            source,
        };

        let mut zip = zip::ZipArchive::new(file).map_err(corrupt)?;
        let entries = zip.len();
        zip.extract(dest).map_err(corrupt)?;

        debug!(archive = %archive.display(), entries, "zip extracted");
        Ok(())
    }
}

/// Remove `dest` if present and recreate it empty.
///
/// # Errors
///
/// Returns an error if the old folder cannot be removed or the new one
/// cannot be created.
pub async fn reset_dir(dest: &Path) -> Result<(), ExtractError> {
    let io = |source| ExtractError::Io {
        path: dest.to_path_buf(),
        source,
    };

    match tokio::fs::remove_dir_all(dest).await {
        Ok(()) => debug!(dest = %dest.display(), "cleared previous contents"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(io(e)),
    }
    tokio::fs::create_dir_all(dest).await.map_err(io)
}

/// Clear `dest`, then run `extractor` on a blocking thread.
///
/// # Errors
///
/// Returns any error from [`reset_dir`] or the extractor.
pub async fn extract_replacing(
    extractor: Arc<dyn Extractor>,
    archive: &Path,
    dest: &Path,
) -> Result<(), ExtractError> {
    reset_dir(dest).await?;

    let archive = archive.to_path_buf();
    let dest = dest.to_path_buf();
    tokio::task::spawn_blocking(move || extractor.extract(&archive, &dest))
        .await
        .map_err(|e| ExtractError::Task(e.to_string()))?
}
