//! download-dependencies - fetch the pinned archive of every manifest entry.

use anyhow::{Context, Result};
use clap::Parser;
use package_sync::{cli::CommonArgs, downloader, manifest, utils, RegistryClient};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// Directory archives are written to (overrides config)
    #[arg(long, value_name = "DIR")]
    resources: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = args.common.load_config()?;
    if let Some(dir) = args.resources {
        config.resources.dir = dir;
    }

    // Initialize logging
    utils::logger::init(&config.log.level)?;

    tracing::info!(
        "Starting download-dependencies v{} (registry: {})",
        env!("CARGO_PKG_VERSION"),
        config.registry.url
    );

    let manifest = manifest::read(&config.manifest.path)?;
    let registry = RegistryClient::new(&config.registry)?;

    let written = downloader::download_all(&registry, &manifest, &config.resources.dir)
        .await
        .with_context(|| format!("downloading into {}", config.resources.dir.display()))?;

    tracing::info!("Downloaded {} archives", written.len());
    Ok(())
}
