//! coob - package restore CLI
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! Restores a package and its declared dependencies from a coob repository
//! into `<out-dir>/Coobs`.
//!
//! # Directory Layout
//!
//! ```text
//! <out-dir>/
//! └── Coobs/
//!     ├── Coral.Atoll/     # root package
//!     └── Coral.Common/    # one folder per dependency
//!
//! ~/.coob/
//! └── config.toml          # optional user config
//! ```

pub mod cmd;
pub mod config;
pub mod ui;

use clap::{Parser, Subcommand};
use coob_schema::{PackageId, PackageVersion};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "coob")]
#[command(author, version, about = "coob - restore packages from a coob repository")]
pub struct Cli {
    /// Path to a TOML config file (default: ./coob.toml, then ~/.coob/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Repository base URL serving the catalog listing and package archives
    #[arg(long, global = true, env = "COOB_CATALOG_URL")]
    pub catalog_url: Option<String>,

    /// Read timeout for each request, in seconds
    #[arg(long, global = true, env = "COOB_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Show debug logging for coob crates
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress progress output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Restore a package and its dependencies
    Restore {
        /// Package identifier (e.g. Coral.Atoll)
        package: PackageId,
        /// Exact version to restore; skips the catalog lookup
        version: Option<PackageVersion>,
        /// Pick the latest version strictly below this one
        #[arg(long, conflicts_with = "version")]
        ceiling: Option<PackageVersion>,
        /// Clear the output directory before restoring
        #[arg(long)]
        overwrite: bool,
        /// Output directory; packages land in <out-dir>/Coobs
        #[arg(long, env = "COOB_OUT_DIR")]
        out_dir: Option<PathBuf>,
    },
    /// List the versions of a package published in the catalog
    Versions {
        /// Package identifier
        package: PackageId,
        /// Only list versions strictly below this one
        #[arg(long)]
        ceiling: Option<PackageVersion>,
    },
}
