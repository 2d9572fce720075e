//! Archive downloader.
//!
//! Fetches the pinned archive of every manifest entry, one at a time, and
//! stores it as `<packageName>-<version>.tgz` in the resources directory.

use crate::manifest::Manifest;
use crate::registry::Registry;
use crate::utils::errors::{Result, SyncError};
use std::path::{Path, PathBuf};
use tracing::info;

/// File name an archive is stored under.
pub fn archive_file_name(package_name: &str, version: &str) -> String {
    format!("{}-{}.tgz", package_name, version)
}

/// Download every archive in manifest order.
///
/// Stops at the first failed fetch or write. Archives written before the
/// failure are left in place. Returns the written paths in manifest order.
pub async fn download_all<R: Registry>(
    registry: &R,
    manifest: &Manifest,
    resources_dir: &Path,
) -> Result<Vec<PathBuf>> {
    manifest.validate()?;

    let mut written = Vec::with_capacity(manifest.len());
    for entry in manifest.iter() {
        let bytes = registry
            .fetch_archive(&entry.package_name, &entry.version)
            .await?;

        let path = resources_dir.join(archive_file_name(&entry.package_name, &entry.version));
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|source| SyncError::ArchiveWrite {
                path: path.clone(),
                source,
            })?;

        info!(
            "Downloaded {}@{} -> {} ({} bytes)",
            entry.package_name,
            entry.version,
            path.display(),
            bytes.len()
        );
        written.push(path);
    }

    Ok(written)
}
