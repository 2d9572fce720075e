//! Package registry client.
//!
//! Two read-only endpoints are used:
//! - `GET {base}/{package}/{version}` returns the package archive
//! - `GET {base}/{package}` returns JSON metadata carrying `dist-tags`

use crate::config::RegistryConfig;
use crate::utils::errors::{Result, SyncError};
use bytes::Bytes;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::collections::HashMap;
use std::future::Future;
use tracing::debug;

/// Registry metadata; only the dist-tags are read.
#[derive(Debug, Clone, Deserialize)]
pub struct PackageMetadata {
    #[serde(rename = "dist-tags", default)]
    pub dist_tags: HashMap<String, String>,
}

impl PackageMetadata {
    /// Version behind the `latest` dist-tag.
    pub fn latest(&self, package_name: &str) -> Result<&str> {
        self.dist_tags
            .get("latest")
            .map(String::as_str)
            .ok_or_else(|| SyncError::MissingLatest {
                package: package_name.to_string(),
            })
    }
}

/// Read access to a package registry.
pub trait Registry {
    /// Raw archive bytes for one version of a package.
    fn fetch_archive(
        &self,
        package_name: &str,
        version: &str,
    ) -> impl Future<Output = Result<Bytes>> + Send;

    /// Package metadata, including its dist-tags.
    fn fetch_metadata(
        &self,
        package_name: &str,
    ) -> impl Future<Output = Result<PackageMetadata>> + Send;
}

/// HTTP registry client.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: Client,
    base_url: Url,
}

impl RegistryClient {
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let base_url = Url::parse(&config.url)
            .map_err(|e| SyncError::Config(format!("invalid registry URL '{}': {}", config.url, e)))?;

        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(SyncError::Config(format!(
                "registry URL must be http(s): {}",
                config.url
            )));
        }

        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    /// Append percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base() was rejected in new()
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// GET `url`, failing on any non-2xx status before the body is touched.
    async fn get(&self, url: Url) -> Result<reqwest::Response> {
        debug!("GET {}", url);
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Status {
                url: url.to_string(),
                status,
            });
        }

        Ok(response)
    }
}

impl Registry for RegistryClient {
    async fn fetch_archive(&self, package_name: &str, version: &str) -> Result<Bytes> {
        let url = self.endpoint(&[package_name, version]);
        let bytes = self.get(url).await?.bytes().await?;
        debug!("Fetched {}@{} ({} bytes)", package_name, version, bytes.len());
        Ok(bytes)
    }

    async fn fetch_metadata(&self, package_name: &str) -> Result<PackageMetadata> {
        let url = self.endpoint(&[package_name]);
        let body = self.get(url).await?.bytes().await?;

        serde_json::from_slice(&body).map_err(|source| SyncError::MetadataParse {
            package: package_name.to_string(),
            source,
        })
    }
}
