use anyhow::{Context, Result};
use coob_core::{Catalog, CatalogListing};
use coob_schema::{PackageId, PackageVersion};
use crossterm::style::Stylize;

use crate::config::Config;
use crate::ui::Theme;

/// Print the published versions of `package`, latest last.
pub async fn versions(
    config: &Config,
    package: &PackageId,
    ceiling: Option<&PackageVersion>,
) -> Result<()> {
    let client = config
        .fetch
        .client()
        .context("Failed to build HTTP client")?;
    let listing = Catalog::new(client, config.catalog_url.as_str())
        .fetch_listing()
        .await?;

    let versions = select(&listing, package, ceiling);
    if versions.is_empty() {
        println!();
        println!("  No versions of {package} in the catalog.");
        return Ok(());
    }

    let theme = Theme::default();
    for version in &versions {
        println!(
            "  {} {}",
            package.as_str().with(theme.colors.package_name),
            version.to_string().with(theme.colors.version)
        );
    }
    Ok(())
}

/// Versions of `package` in ascending order, filtered by the ceiling with
/// the same rule the restore uses.
pub fn select(
    listing: &CatalogListing,
    package: &PackageId,
    ceiling: Option<&PackageVersion>,
) -> Vec<PackageVersion> {
    listing
        .versions(package)
        .into_iter()
        .filter(|v| ceiling.is_none_or(|c| v.compare(c) == Some(std::cmp::Ordering::Less)))
        .collect()
}
