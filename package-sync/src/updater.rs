//! Manifest version updater.
//!
//! Moves every manifest entry to the registry's `latest` dist-tag and reports
//! each change as `name: old -> new`.

use crate::manifest::{self, validate_version, Manifest};
use crate::registry::Registry;
use crate::utils::errors::Result;
use std::fmt;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Old and new version of one manifest entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionChange {
    pub package_name: String,
    pub old_version: String,
    pub new_version: String,
}

impl VersionChange {
    pub fn is_changed(&self) -> bool {
        self.old_version != self.new_version
    }
}

impl fmt::Display for VersionChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} -> {}",
            self.package_name, self.old_version, self.new_version
        )
    }
}

/// Set every entry's version to the registry's latest, in manifest order.
///
/// One line per entry is written to `out`. The version is overwritten even
/// when it is already current. On error the manifest may be partially
/// updated in memory, so callers must not persist it.
pub async fn update_versions<R: Registry, W: Write>(
    registry: &R,
    manifest: &mut Manifest,
    mut out: W,
) -> Result<Vec<VersionChange>> {
    manifest.validate()?;

    let mut changes = Vec::with_capacity(manifest.len());
    for entry in manifest.iter_mut() {
        let metadata = registry.fetch_metadata(&entry.package_name).await?;
        let latest = metadata.latest(&entry.package_name)?;
        validate_version(&entry.package_name, latest)?;

        let change = VersionChange {
            package_name: entry.package_name.clone(),
            old_version: std::mem::replace(&mut entry.version, latest.to_string()),
            new_version: latest.to_string(),
        };
        writeln!(out, "{}", change)?;
        debug!("{} resolved to {}", change.package_name, change.new_version);

        changes.push(change);
    }

    Ok(changes)
}

/// Read the manifest at `path`, update every entry, and write it back once.
///
/// The file is only written after all entries were resolved; any failure
/// leaves it untouched.
pub async fn update_manifest_file<R: Registry, W: Write>(
    registry: &R,
    path: &Path,
    out: W,
) -> Result<Vec<VersionChange>> {
    let mut manifest = manifest::read(path)?;
    let changes = update_versions(registry, &mut manifest, out).await?;
    manifest::write(path, &manifest)?;

    info!(
        "Updated {} ({} of {} packages changed)",
        path.display(),
        changes.iter().filter(|c| c.is_changed()).count(),
        changes.len()
    );
    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::PackageEntry;
    use crate::registry::PackageMetadata;
    use crate::SyncError;
    use bytes::Bytes;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Answers metadata from a fixed table; unknown packages get a 404.
    struct FakeRegistry {
        latest: HashMap<String, String>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeRegistry {
        fn new(latest: &[(&str, &str)]) -> Self {
            Self {
                latest: latest
                    .iter()
                    .map(|(name, version)| (name.to_string(), version.to_string()))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Registry for FakeRegistry {
        async fn fetch_archive(&self, _package_name: &str, _version: &str) -> Result<Bytes> {
            unreachable!("updater never downloads archives")
        }

        async fn fetch_metadata(&self, package_name: &str) -> Result<PackageMetadata> {
            self.calls.lock().unwrap().push(package_name.to_string());

            match self.latest.get(package_name) {
                Some(version) => Ok(PackageMetadata {
                    dist_tags: HashMap::from([("latest".to_string(), version.clone())]),
                }),
                None => Err(SyncError::Status {
                    url: format!("http://registry/{}", package_name),
                    status: reqwest::StatusCode::NOT_FOUND,
                }),
            }
        }
    }

    fn write_manifest(dir: &TempDir, manifest: &Manifest) -> std::path::PathBuf {
        let path = dir.path().join("manifest.json");
        manifest::write(&path, manifest).unwrap();
        path
    }

    #[test]
    fn test_version_change_display() {
        let change = VersionChange {
            package_name: "left-pad".to_string(),
            old_version: "1.0.0".to_string(),
            new_version: "1.3.0".to_string(),
        };
        assert_eq!(change.to_string(), "left-pad: 1.0.0 -> 1.3.0");
        assert!(change.is_changed());
    }

    #[tokio::test]
    async fn test_left_pad_scenario() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let path = write_manifest(
            &temp_dir,
            &Manifest::new(vec![PackageEntry::new("left-pad", "1.0.0")]),
        );
        let registry = FakeRegistry::new(&[("left-pad", "1.3.0")]);

        let mut out = Vec::new();
        update_manifest_file(&registry, &path, &mut out).await?;

        assert_eq!(String::from_utf8(out).unwrap(), "left-pad: 1.0.0 -> 1.3.0\n");
        assert_eq!(
            manifest::read(&path)?,
            Manifest::new(vec![PackageEntry::new("left-pad", "1.3.0")])
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_every_entry_moves_to_latest_in_order() -> Result<()> {
        let registry = FakeRegistry::new(&[
            ("uk.nhsdigital.r4", "2.10.0"),
            ("hl7.fhir.r4.core", "4.0.1"),
            ("uk.core.r4", "2.0.1"),
        ]);
        let mut manifest = Manifest::new(vec![
            PackageEntry::new("uk.nhsdigital.r4", "2.8.0"),
            PackageEntry::new("hl7.fhir.r4.core", "4.0.1"),
            PackageEntry::new("uk.core.r4", "1.4.0"),
        ]);

        let mut out = Vec::new();
        let changes = update_versions(&registry, &mut manifest, &mut out).await?;

        assert_eq!(
            registry.calls(),
            vec!["uk.nhsdigital.r4", "hl7.fhir.r4.core", "uk.core.r4"]
        );
        let names: Vec<_> = manifest.iter().map(|e| e.package_name.as_str()).collect();
        assert_eq!(names, vec!["uk.nhsdigital.r4", "hl7.fhir.r4.core", "uk.core.r4"]);
        let versions: Vec<_> = manifest.iter().map(|e| e.version.as_str()).collect();
        assert_eq!(versions, vec!["2.10.0", "4.0.1", "2.0.1"]);

        // unchanged entries are still reported
        assert_eq!(changes.len(), 3);
        assert!(!changes[1].is_changed());
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "uk.nhsdigital.r4: 2.8.0 -> 2.10.0\n\
             hl7.fhir.r4.core: 4.0.1 -> 4.0.1\n\
             uk.core.r4: 1.4.0 -> 2.0.1\n"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let path = write_manifest(
            &temp_dir,
            &Manifest::new(vec![
                PackageEntry::new("left-pad", "1.0.0"),
                PackageEntry::new("uk.core.r4", "1.4.0"),
            ]),
        );
        let registry = FakeRegistry::new(&[("left-pad", "1.3.0"), ("uk.core.r4", "2.0.1")]);

        update_manifest_file(&registry, &path, std::io::sink()).await?;
        let first = std::fs::read(&path).unwrap();

        let changes = update_manifest_file(&registry, &path, std::io::sink()).await?;
        let second = std::fs::read(&path).unwrap();

        assert_eq!(first, second);
        assert!(changes.iter().all(|c| !c.is_changed()));
        Ok(())
    }

    #[tokio::test]
    async fn test_failure_leaves_file_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_manifest(
            &temp_dir,
            &Manifest::new(vec![
                PackageEntry::new("left-pad", "1.0.0"),
                PackageEntry::new("unpublished", "0.1.0"),
                PackageEntry::new("uk.core.r4", "1.4.0"),
            ]),
        );
        let before = std::fs::read(&path).unwrap();
        let registry = FakeRegistry::new(&[("left-pad", "1.3.0"), ("uk.core.r4", "2.0.1")]);

        let mut out = Vec::new();
        let err = update_manifest_file(&registry, &path, &mut out)
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Status { .. }));
        assert_eq!(registry.calls(), vec!["left-pad", "unpublished"]);
        assert_eq!(std::fs::read(&path).unwrap(), before);
        // progress already printed for the first entry
        assert_eq!(String::from_utf8(out).unwrap(), "left-pad: 1.0.0 -> 1.3.0\n");
    }

    #[tokio::test]
    async fn test_unsafe_latest_version_rejected() {
        let registry = FakeRegistry::new(&[("left-pad", "../../1.3.0")]);
        let mut manifest = Manifest::new(vec![PackageEntry::new("left-pad", "1.0.0")]);

        let err = update_versions(&registry, &mut manifest, std::io::sink())
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::InvalidPackage { .. }));
        assert_eq!(manifest.entries[0].version, "1.0.0");
    }

    #[tokio::test]
    async fn test_missing_manifest_makes_no_requests() {
        let temp_dir = TempDir::new().unwrap();
        let registry = FakeRegistry::new(&[]);

        let err = update_manifest_file(
            &registry,
            &temp_dir.path().join("manifest.json"),
            std::io::sink(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, SyncError::ManifestRead { .. }));
        assert!(registry.calls().is_empty());
    }

    #[tokio::test]
    async fn test_extra_fields_preserved_through_update() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("manifest.json");
        std::fs::write(
            &path,
            r#"[{"packageName":"left-pad","version":"1.0.0","note":"keep"}]"#,
        )
        .unwrap();

        update_manifest_file(&FakeRegistry::new(&[("left-pad", "1.3.0")]), &path, std::io::sink())
            .await?;

        let manifest = manifest::read(&path)?;
        assert_eq!(manifest.entries[0].version, "1.3.0");
        assert_eq!(manifest.entries[0].extra["note"], "keep");
        Ok(())
    }
}
