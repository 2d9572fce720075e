//! Package manifest types and file handling.
//!
//! The manifest is a JSON array of `{ "packageName", "version" }` objects.
//! Entry order is kept as-is across read and write.

use crate::utils::errors::{Result, SyncError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Ordered list of managed packages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    pub entries: Vec<PackageEntry>,
}

const PACKAGE_NAME_KEY: &str = "packageName";
const VERSION_KEY: &str = "version";

/// A single pinned package.
///
/// Serialized as a JSON object. Keys are written back in the order they were
/// read, so rewriting an entry only changes its values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct PackageEntry {
    /// Registry identifier
    pub package_name: String,

    /// Pinned version
    pub version: String,

    /// Any other keys found on the entry, written back untouched
    pub extra: Map<String, Value>,

    /// Positions of `packageName` and `version` among the object's keys
    key_slots: Option<(usize, usize)>,
}

impl PartialEq for PackageEntry {
    fn eq(&self, other: &Self) -> bool {
        self.package_name == other.package_name
            && self.version == other.version
            && self.extra == other.extra
    }
}

impl TryFrom<Map<String, Value>> for PackageEntry {
    type Error = String;

    fn try_from(object: Map<String, Value>) -> std::result::Result<Self, Self::Error> {
        let mut package_name = None;
        let mut version = None;
        let mut slots = (0, 0);
        let mut extra = Map::new();

        for (index, (key, value)) in object.into_iter().enumerate() {
            match key.as_str() {
                PACKAGE_NAME_KEY => {
                    package_name = Some(into_string(PACKAGE_NAME_KEY, value)?);
                    slots.0 = index;
                }
                VERSION_KEY => {
                    version = Some(into_string(VERSION_KEY, value)?);
                    slots.1 = index;
                }
                _ => {
                    extra.insert(key, value);
                }
            }
        }

        Ok(Self {
            package_name: package_name.ok_or("missing field `packageName`")?,
            version: version.ok_or("missing field `version`")?,
            extra,
            key_slots: Some(slots),
        })
    }
}

impl From<PackageEntry> for Map<String, Value> {
    fn from(entry: PackageEntry) -> Self {
        let mut object = Map::new();
        let (name_slot, version_slot) = entry.key_slots.unwrap_or((0, 1));
        let mut extra = entry.extra.into_iter();
        let mut name = Some(Value::String(entry.package_name));
        let mut version = Some(Value::String(entry.version));

        for index in 0.. {
            if index == name_slot {
                if let Some(value) = name.take() {
                    object.insert(PACKAGE_NAME_KEY.to_string(), value);
                }
            } else if index == version_slot {
                if let Some(value) = version.take() {
                    object.insert(VERSION_KEY.to_string(), value);
                }
            } else if let Some((key, value)) = extra.next() {
                object.insert(key, value);
            } else if name.is_none() && version.is_none() {
                break;
            }
        }

        object
    }
}

fn into_string(key: &str, value: Value) -> std::result::Result<String, String> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(format!("field `{}` must be a string, found {}", key, other)),
    }
}

impl PackageEntry {
    pub fn new(package_name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            version: version.into(),
            extra: Map::new(),
            key_slots: None,
        }
    }

    /// Reject names and versions that are unsafe as a path component or URL segment.
    pub fn validate(&self) -> Result<()> {
        validate_package_name(&self.package_name)?;
        validate_version(&self.package_name, &self.version)
    }
}

impl Manifest {
    pub fn new(entries: Vec<PackageEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PackageEntry> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, PackageEntry> {
        self.entries.iter_mut()
    }

    /// Validate every entry, stopping at the first bad one.
    pub fn validate(&self) -> Result<()> {
        self.entries.iter().try_for_each(PackageEntry::validate)
    }

    /// Parse a manifest from JSON text.
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }

    /// Serialize with 2-space indentation and no trailing newline.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Read and parse the manifest at `path`.
pub fn read(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path).map_err(|source| SyncError::ManifestRead {
        path: path.to_path_buf(),
        source,
    })?;

    let manifest = Manifest::from_json(&content).map_err(|source| SyncError::ManifestParse {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!("Read {} entries from {}", manifest.len(), path.display());
    Ok(manifest)
}

/// Overwrite the file at `path` with the serialized manifest.
pub fn write(path: &Path, manifest: &Manifest) -> Result<()> {
    let content = manifest.to_json()?;
    std::fs::write(path, content).map_err(|source| SyncError::ManifestWrite {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!("Wrote {} entries to {}", manifest.len(), path.display());
    Ok(())
}

fn is_allowed_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '+' | '@')
}

fn check_component(value: &str) -> std::result::Result<(), String> {
    if value.is_empty() {
        return Err("must not be empty".to_string());
    }
    if value.starts_with('.') {
        return Err("must not start with '.'".to_string());
    }
    if let Some(c) = value.chars().find(|c| !is_allowed_char(*c)) {
        return Err(format!("contains disallowed character {:?}", c));
    }
    Ok(())
}

/// Package names become a file name prefix and a URL path segment.
pub fn validate_package_name(name: &str) -> Result<()> {
    check_component(name).map_err(|reason| SyncError::InvalidPackage {
        name: name.to_string(),
        reason: format!("package name {}", reason),
    })
}

/// Versions become a file name suffix and a URL path segment.
pub fn validate_version(package_name: &str, version: &str) -> Result<()> {
    check_component(version).map_err(|reason| SyncError::InvalidPackage {
        name: package_name.to_string(),
        reason: format!("version {:?} {}", version, reason),
    })
}
