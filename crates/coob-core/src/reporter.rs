//! Reporter trait for dependency injection
//!
//! Core logic reports progress and status through this trait instead of
//! writing to a global sink, so the CLI can render it and tests can record
//! it.

use std::path::Path;

use coob_schema::{PackageId, PackageVersion};

/// Progress sink for catalog, fetch and restore operations.
pub trait Reporter: Send + Sync {
    /// Indicates a new phase has started (e.g. "Resolving", "Fetching").
    fn section(&self, title: &str);

    /// The latest version of a package is being looked up in the catalog.
    fn resolving(&self, id: &PackageId);

    /// A version was selected for a package.
    fn resolved(&self, id: &PackageId, version: &PackageVersion);

    /// Updates the progress of a download.
    fn downloading(
        &self,
        id: &PackageId,
        version: &PackageVersion,
        current: u64,
        total: Option<u64>,
    );

    /// A downloaded archive is being extracted.
    fn extracting(&self, id: &PackageId, version: &PackageVersion);

    /// Marks a package as fetched and extracted into `path`.
    fn done(&self, id: &PackageId, version: &PackageVersion, path: &Path);

    /// Marks a package operation as failed with a specific reason.
    fn failed(&self, id: &PackageId, version: &PackageVersion, reason: &str);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);

    /// Log an error message.
    fn error(&self, msg: &str);

    /// Display a final summary.
    fn summary(&self, count: usize, elapsed_secs: f64);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn section(&self, title: &str) {
        (**self).section(title);
    }
    fn resolving(&self, id: &PackageId) {
        (**self).resolving(id);
    }
    fn resolved(&self, id: &PackageId, version: &PackageVersion) {
        (**self).resolved(id, version);
    }
    fn downloading(
        &self,
        id: &PackageId,
        version: &PackageVersion,
        current: u64,
        total: Option<u64>,
    ) {
        (**self).downloading(id, version, current, total);
    }
    fn extracting(&self, id: &PackageId, version: &PackageVersion) {
        (**self).extracting(id, version);
    }
    fn done(&self, id: &PackageId, version: &PackageVersion, path: &Path) {
        (**self).done(id, version, path);
    }
    fn failed(&self, id: &PackageId, version: &PackageVersion, reason: &str) {
        (**self).failed(id, version, reason);
    }
    fn info(&self, msg: &str) {
        (**self).info(msg);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
    fn error(&self, msg: &str) {
        (**self).error(msg);
    }
    fn summary(&self, count: usize, elapsed_secs: f64) {
        (**self).summary(count, elapsed_secs);
    }
}

/// A no-op reporter for silent operations (e.g., scripting, testing).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn section(&self, _: &str) {}
    fn resolving(&self, _: &PackageId) {}
    fn resolved(&self, _: &PackageId, _: &PackageVersion) {}
    fn downloading(&self, _: &PackageId, _: &PackageVersion, _: u64, _: Option<u64>) {}
    fn extracting(&self, _: &PackageId, _: &PackageVersion) {}
    fn done(&self, _: &PackageId, _: &PackageVersion, _: &Path) {}
    fn failed(&self, _: &PackageId, _: &PackageVersion, _: &str) {}
    fn info(&self, _: &str) {}
    fn warning(&self, _: &str) {}
    fn error(&self, _: &str) {}
    fn summary(&self, _: usize, _: f64) {}
}
