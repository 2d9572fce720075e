//! Package Sync Library
//!
//! Keeps a JSON package manifest in step with a remote package registry:
//! download the pinned archives, or bump every entry to the registry's
//! `latest` dist-tag.

pub mod cli;
pub mod config;
pub mod downloader;
pub mod manifest;
pub mod registry;
pub mod updater;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use manifest::{Manifest, PackageEntry};
pub use registry::{PackageMetadata, Registry, RegistryClient};
pub use utils::errors::SyncError;
pub type Result<T> = std::result::Result<T, SyncError>;
