//! Shared types for coob packages.
//!
//! This crate has no I/O. It defines the version model used to select
//! packages from a catalog, and the identifier/reference types that name a
//! package archive (`<id>.<version>.coob`) or a manifest dependency
//! (`<id>.<major>.<minor>.<patch>`).

pub mod reference;
pub mod version;

// Re-exports
pub use reference::{PackageId, PackageReference, ReferenceError, split_name_version};
pub use version::{PackageVersion, VersionError};

/// File extension of a published package archive.
pub const COOB_EXTENSION: &str = "coob";

/// File extension used for the local copy of a downloaded archive.
pub const DOWNLOAD_EXTENSION: &str = "zip";
