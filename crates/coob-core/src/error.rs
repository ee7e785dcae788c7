//! Restore errors.
//!
//! Each stage has its own error type. [`RestoreError`] folds them into the
//! fixed restore taxonomy so a run can be matched on by category.

use std::fmt;

use coob_schema::{PackageId, PackageVersion, ReferenceError};
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::io::download::DownloadError;
use crate::io::extract::ExtractError;
use crate::io::fetch::FetchError;
use crate::manifest::ManifestError;

/// Why a restore run stopped.
#[derive(Error, Debug)]
pub enum RestoreError {
    /// The listing could not be retrieved.
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(CatalogError),

    /// The listing body is not a JSON object.
    #[error("Catalog malformed: {0}")]
    CatalogMalformed(CatalogError),

    /// No listed version qualifies.
    #[error("No version of {package} available{}", below(.ceiling.as_ref()))]
    NoVersionAvailable {
        /// Requested root package.
        package: PackageId,
        /// Exclusive upper bound in effect, if any.
        ceiling: Option<PackageVersion>,
    },

    /// An archive could not be downloaded.
    #[error("Download failed: {0}")]
    DownloadFailed(#[from] DownloadError),

    /// An archive could not be unpacked.
    #[error("Extraction failed: {0}")]
    ExtractFailed(#[from] ExtractError),

    /// A package reference does not yield a folder name.
    #[error("Cannot derive package folder: {0}")]
    NameParseFailed(#[from] ReferenceError),

    /// The root package has no manifest.
    #[error("Manifest not found: {0}")]
    ManifestNotFound(ManifestError),

    /// The root manifest is unreadable or incomplete.
    #[error("Manifest malformed: {0}")]
    ManifestMalformed(ManifestError),

    /// A declared dependency is not a valid reference.
    #[error("Dependency malformed: {0}")]
    DependencyMalformed(ManifestError),
}

fn below(ceiling: Option<&PackageVersion>) -> String {
    ceiling.map(|c| format!(" below {c}")).unwrap_or_default()
}

/// Category of a [`RestoreError`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RestoreErrorKind {
    /// [`RestoreError::CatalogUnavailable`]
    CatalogUnavailable,
    /// [`RestoreError::CatalogMalformed`]
    CatalogMalformed,
    /// [`RestoreError::NoVersionAvailable`]
    NoVersionAvailable,
    /// [`RestoreError::DownloadFailed`]
    DownloadFailed,
    /// [`RestoreError::ExtractFailed`]
    ExtractFailed,
    /// [`RestoreError::NameParseFailed`]
    NameParseFailed,
    /// [`RestoreError::ManifestNotFound`]
    ManifestNotFound,
    /// [`RestoreError::ManifestMalformed`]
    ManifestMalformed,
    /// [`RestoreError::DependencyMalformed`]
    DependencyMalformed,
}

impl fmt::Display for RestoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl RestoreError {
    /// The category of this error.
    pub fn kind(&self) -> RestoreErrorKind {
        match self {
            Self::CatalogUnavailable(_) => RestoreErrorKind::CatalogUnavailable,
            Self::CatalogMalformed(_) => RestoreErrorKind::CatalogMalformed,
            Self::NoVersionAvailable { .. } => RestoreErrorKind::NoVersionAvailable,
            Self::DownloadFailed(_) => RestoreErrorKind::DownloadFailed,
            Self::ExtractFailed(_) => RestoreErrorKind::ExtractFailed,
            Self::NameParseFailed(_) => RestoreErrorKind::NameParseFailed,
            Self::ManifestNotFound(_) => RestoreErrorKind::ManifestNotFound,
            Self::ManifestMalformed(_) => RestoreErrorKind::ManifestMalformed,
            Self::DependencyMalformed(_) => RestoreErrorKind::DependencyMalformed,
        }
    }
}

impl From<CatalogError> for RestoreError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Malformed { .. } => Self::CatalogMalformed(err),
            CatalogError::Unavailable { .. } | CatalogError::Status { .. } => {
                Self::CatalogUnavailable(err)
            }
        }
    }
}

impl From<FetchError> for RestoreError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Download(e) => Self::DownloadFailed(e),
            FetchError::Extract(e) => Self::ExtractFailed(e),
            FetchError::NameParse(e) => Self::NameParseFailed(e),
        }
    }
}

impl From<ManifestError> for RestoreError {
    fn from(err: ManifestError) -> Self {
        match err {
            ManifestError::NotFound { .. } => Self::ManifestNotFound(err),
            ManifestError::Malformed { .. } => Self::ManifestMalformed(err),
            ManifestError::Dependency { .. } => Self::DependencyMalformed(err),
        }
    }
}
