use anyhow::{Context, Result};
use coob_core::{NullReporter, Reporter, RestoreRequest, Restorer};
use coob_schema::{PackageId, PackageVersion};
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::ui::ConsoleReporter;

/// Restore `package` and its dependencies into `<out_dir>/Coobs`.
pub async fn restore(
    config: &Config,
    package: PackageId,
    version: Option<PackageVersion>,
    ceiling: Option<PackageVersion>,
    overwrite: bool,
    quiet: bool,
) -> Result<()> {
    prepare_out_dir(&config.out_dir, overwrite).await?;

    let reporter: Arc<dyn Reporter> = if quiet {
        Arc::new(NullReporter)
    } else {
        Arc::new(ConsoleReporter::new())
    };
    let restorer =
        Restorer::new(&config.fetch, reporter).context("Failed to build HTTP client")?;

    let request = RestoreRequest::new(package, config.catalog_url.as_str(), &config.out_dir)
        .with_version(version)
        .with_ceiling(ceiling);

    let result = restorer.restore(&request).await?;
    tracing::info!(
        root = %result.root,
        dir = %result.coobs_dir.display(),
        "restore finished"
    );
    Ok(())
}

/// Create the output root, clearing it first when `overwrite` is set.
pub async fn prepare_out_dir(out_dir: &Path, overwrite: bool) -> Result<()> {
    if overwrite && tokio::fs::try_exists(out_dir).await.unwrap_or(false) {
        tokio::fs::remove_dir_all(out_dir)
            .await
            .with_context(|| format!("Failed to clear {}", out_dir.display()))?;
    }
    tokio::fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("Failed to create {}", out_dir.display()))
}
