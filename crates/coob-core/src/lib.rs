//! Core library for coob package restore.
//!
//! Given a root package identifier, the [`Restorer`] picks a version
//! (explicit, or the latest published under an optional ceiling), fetches
//! and extracts the root archive, reads its manifest, and fetches each
//! declared dependency in order. Every stage is awaited before the next one
//! starts, and any failure aborts the run.
//!
//! Side effects live here (network, filesystem). Pure types live in
//! [`coob_schema`].

pub mod catalog;
pub mod error;
pub mod io;
pub mod manifest;
pub mod paths;
pub mod reporter;
pub mod restore;
pub mod settings;

pub use catalog::{Catalog, CatalogError, CatalogListing};
pub use error::{RestoreError, RestoreErrorKind};
pub use io::extract::{Extractor, ZipExtractor};
pub use manifest::Manifest;
pub use paths::*;
pub use reporter::{NullReporter, Reporter};
pub use restore::{RestoreRequest, RestoreResult, RestoreStage, Restorer};
pub use settings::FetchSettings;

/// User Agent string for core operations
pub const USER_AGENT: &str = concat!("coob/", env!("CARGO_PKG_VERSION"));
