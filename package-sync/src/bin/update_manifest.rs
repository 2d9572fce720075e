//! update-manifest - move every manifest entry to the registry's latest version.

use anyhow::{Context, Result};
use clap::Parser;
use package_sync::{cli::CommonArgs, updater, utils, RegistryClient};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = args.common.load_config()?;

    // Initialize logging
    utils::logger::init(&config.log.level)?;

    tracing::info!(
        "Starting update-manifest v{} (registry: {})",
        env!("CARGO_PKG_VERSION"),
        config.registry.url
    );

    let registry = RegistryClient::new(&config.registry)?;
    let stdout = std::io::stdout();

    updater::update_manifest_file(&registry, &config.manifest.path, stdout.lock())
        .await
        .with_context(|| format!("updating {}", config.manifest.path.display()))?;

    Ok(())
}
