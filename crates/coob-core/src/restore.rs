//! Restore orchestration.
//!
//! A run moves through fixed stages and stops at the first failure:
//!
//! ```text
//! Start -> VersionResolved -> RootFetched -> ManifestRead -> DependenciesFetched
//!   \____________\_______________\______________\___________> Failed
//! ```
//!
//! Nothing is rolled back on failure. Packages already extracted stay on
//! disk, and the next successful run replaces each package folder it
//! fetches.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use coob_schema::{PackageId, PackageReference, PackageVersion};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::error::RestoreError;
use crate::io::extract::{Extractor, ZipExtractor};
use crate::io::fetch::FetchRequest;
use crate::manifest::Manifest;
use crate::paths::coobs_dir;
use crate::reporter::Reporter;
use crate::settings::FetchSettings;

/// Input for one restore run.
#[derive(Debug, Clone)]
pub struct RestoreRequest {
    /// Root package to restore.
    pub package: PackageId,
    /// Exact version to restore. When set, the catalog is not contacted.
    pub version: Option<PackageVersion>,
    /// Exclusive upper bound for automatic version selection.
    pub ceiling: Option<PackageVersion>,
    /// Repository base URI for both the listing and archive downloads.
    pub catalog_url: String,
    /// Output root. Packages are extracted into `<out_dir>/Coobs`.
    pub out_dir: PathBuf,
}

impl RestoreRequest {
    /// Restore the latest version of `package`, with no ceiling.
    pub fn new(
        package: PackageId,
        catalog_url: impl Into<String>,
        out_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            package,
            version: None,
            ceiling: None,
            catalog_url: catalog_url.into(),
            out_dir: out_dir.into(),
        }
    }

    /// Pin the root version. `None` resolves through the catalog.
    pub fn with_version(mut self, version: Option<PackageVersion>) -> Self {
        self.version = version;
        self
    }

    /// Set the exclusive upper bound used when resolving through the catalog.
    pub fn with_ceiling(mut self, ceiling: Option<PackageVersion>) -> Self {
        self.ceiling = ceiling;
        self
    }
}

/// Outcome of a successful restore run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreResult {
    /// The root package at its resolved version.
    pub root: PackageReference,
    /// Dependencies fetched, in manifest order.
    pub dependencies: Vec<PackageReference>,
    /// Folder containing every extracted package.
    pub coobs_dir: PathBuf,
}

impl RestoreResult {
    /// The resolved root version.
    pub fn version(&self) -> &PackageVersion {
        &self.root.version
    }

    /// Number of packages fetched, root included.
    pub fn package_count(&self) -> usize {
        1 + self.dependencies.len()
    }
}

/// Stages of a restore run, used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreStage {
    /// Nothing done yet.
    Start,
    /// The root version is known.
    VersionResolved,
    /// The root package is extracted.
    RootFetched,
    /// The root manifest is parsed.
    ManifestRead,
    /// Every dependency is extracted. Terminal.
    DependenciesFetched,
}

impl fmt::Display for RestoreStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::VersionResolved => "version-resolved",
            Self::RootFetched => "root-fetched",
            Self::ManifestRead => "manifest-read",
            Self::DependenciesFetched => "dependencies-fetched",
        };
        f.write_str(name)
    }
}

/// Drives restore runs. One run at a time per output directory.
#[derive(Clone)]
pub struct Restorer {
    client: Client,
    extractor: Arc<dyn Extractor>,
    reporter: Arc<dyn Reporter>,
}

impl fmt::Debug for Restorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Restorer")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

impl Restorer {
    /// Create a restorer with a client built from `settings` and the zip extractor.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        settings: &FetchSettings,
        reporter: Arc<dyn Reporter>,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(settings.client()?, reporter))
    }

    /// Create a restorer around an existing client and the zip extractor.
    pub fn with_client(client: Client, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            client,
            extractor: Arc::new(ZipExtractor),
            reporter,
        }
    }

    /// Replace the extraction capability.
    pub fn with_extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Run a restore to completion.
    ///
    /// # Errors
    ///
    /// Returns the first stage failure. See [`RestoreError`] for the
    /// taxonomy. Packages fetched before the failure are left on disk.
    pub async fn restore(&self, request: &RestoreRequest) -> Result<RestoreResult, RestoreError> {
        let started = Instant::now();
        debug!(stage = %RestoreStage::Start, package = %request.package, "restore started");

        let result = self.run(request).await;
        match &result {
            Ok(restored) => {
                info!(
                    stage = %RestoreStage::DependenciesFetched,
                    package = %restored.root,
                    dependencies = restored.dependencies.len(),
                    "restore complete"
                );
                self.reporter
                    .summary(restored.package_count(), started.elapsed().as_secs_f64());
            }
            // The caller owns presenting the error.
            Err(e) => {
                warn!(package = %request.package, kind = %e.kind(), error = %e, "restore failed");
            }
        }
        result
    }

    async fn run(&self, request: &RestoreRequest) -> Result<RestoreResult, RestoreError> {
        let version = self.resolve_version(request).await?;
        let root = PackageReference::new(request.package.clone(), version);
        debug!(stage = %RestoreStage::VersionResolved, package = %root);

        let coobs = coobs_dir(&request.out_dir);

        self.reporter.section("Fetching");
        let root_dir = self.fetch(&root, &request.catalog_url, &coobs).await?;
        debug!(stage = %RestoreStage::RootFetched, dir = %root_dir.display());

        let manifest = Manifest::load(&root_dir).await?;
        if manifest.id != root.id {
            self.reporter
                .warning(&format!("{root} declares itself as {}", manifest.id));
        }
        debug!(
            stage = %RestoreStage::ManifestRead,
            dependencies = manifest.dependencies.len()
        );

        for dependency in &manifest.dependencies {
            self.fetch(dependency, &request.catalog_url, &coobs).await?;
        }

        Ok(RestoreResult {
            root,
            dependencies: manifest.dependencies,
            coobs_dir: coobs,
        })
    }

    async fn resolve_version(
        &self,
        request: &RestoreRequest,
    ) -> Result<PackageVersion, RestoreError> {
        if let Some(version) = &request.version {
            return Ok(version.clone());
        }

        self.reporter.section("Resolving");
        self.reporter.resolving(&request.package);

        let catalog = Catalog::new(self.client.clone(), request.catalog_url.as_str());
        let listing = catalog.fetch_listing().await?;
        let version = listing
            .latest_version(&request.package, request.ceiling.as_ref())
            .ok_or_else(|| RestoreError::NoVersionAvailable {
                package: request.package.clone(),
                ceiling: request.ceiling.clone(),
            })?;

        self.reporter.resolved(&request.package, &version);
        Ok(version)
    }

    async fn fetch(
        &self,
        reference: &PackageReference,
        base_url: &str,
        coobs: &Path,
    ) -> Result<PathBuf, RestoreError> {
        FetchRequest::new(
            &self.client,
            reference,
            base_url,
            coobs,
            Arc::clone(&self.extractor),
            self.reporter.as_ref(),
        )
        .execute()
        .await
        .map_err(|e| {
            self.reporter.failed(&reference.id, &reference.version, &e.to_string());
            RestoreError::from(e)
        })
    }
}
