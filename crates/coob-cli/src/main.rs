//! coob - package restore CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use coob_cli::cmd;
use coob_cli::config::{Config, FileConfig, Overrides};
use coob_cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // --verbose wins over RUST_LOG for our own crates
    let filter = if cli.verbose {
        EnvFilter::from_default_env()
            .add_directive("coob_core=debug".parse()?)
            .add_directive("coob_cli=debug".parse()?)
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let file = FileConfig::load(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Restore {
            package,
            version,
            ceiling,
            overwrite,
            out_dir,
        } => {
            let config = Config::resolve(
                Overrides {
                    catalog_url: cli.catalog_url,
                    out_dir,
                    timeout_secs: cli.timeout_secs,
                },
                file,
            )?;
            cmd::restore::restore(&config, package, version, ceiling, overwrite, cli.quiet).await
        }
        Commands::Versions { package, ceiling } => {
            let config = Config::resolve(
                Overrides {
                    catalog_url: cli.catalog_url,
                    out_dir: None,
                    timeout_secs: cli.timeout_secs,
                },
                file,
            )?;
            cmd::versions::versions(&config, &package, ceiling.as_ref()).await
        }
    }
}
