//! Command-line arguments shared by both tools.

use crate::config::Config;
use crate::utils::errors::Result;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Manifest file (overrides config)
    #[arg(short, long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Registry base URL (overrides config)
    #[arg(short, long, value_name = "URL")]
    pub registry: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    pub log_level: Option<String>,
}

impl CommonArgs {
    /// Load the config file if one was given, then apply command-line overrides.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(manifest) = &self.manifest {
            config.manifest.path = manifest.clone();
        }
        if let Some(registry) = &self.registry {
            config.registry.url = registry.clone();
        }
        if let Some(level) = &self.log_level {
            config.log.level = level.clone();
        }

        Ok(config)
    }
}
