//! Image storage: remote asset host with a local static fallback.
//!
//! The primary path pushes bytes to the configured asset host. When the
//! host is unconfigured or a call fails, the file lands in the local
//! uploads directory instead and is served from `/uploads`. Callers only
//! rely on the returned `url`; the other fields are stable on the remote
//! path only. Deleting a remote asset is best-effort and never blocks
//! deleting the entity that referenced it.

use std::path::PathBuf;

use chrono::Utc;
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;

use crate::config::{AssetHostConfig, BanyanConfig};

/// Errors that can occur while storing an upload.
#[derive(Debug, Error)]
pub enum AssetError {
    /// Local filesystem failure (the fallback itself failed).
    #[error("upload storage error: {0}")]
    Io(#[from] std::io::Error),

    /// Remote asset host rejected or failed the call.
    #[error("asset host error: {0}")]
    Host(String),
}

/// A stored upload.
#[derive(Debug, Clone)]
pub struct StoredAsset {
    /// Public URL; the one field guaranteed stable across both paths.
    pub url: String,
    /// Host-side identifier (or the local filename stem).
    pub public_id: String,
    /// File format as reported by the host or taken from the extension.
    pub format: String,
    /// Size in bytes.
    pub size: u64,
}

/// What the asset host returns on upload.
#[derive(Debug, Deserialize)]
struct RemoteUploadResponse {
    url: String,
    public_id: String,
    format: Option<String>,
    bytes: Option<u64>,
}

/// Stores uploads remotely when possible, locally otherwise.
pub struct AssetStore {
    http: reqwest::Client,
    remote: Option<AssetHostConfig>,
    uploads_dir: PathBuf,
    public_path: String,
}

impl AssetStore {
    /// Create an asset store from configuration.
    #[must_use]
    pub fn new(config: &BanyanConfig) -> Self {
        if config.asset_host.is_none() {
            tracing::warn!("Asset host not configured; uploads will be stored locally only");
        }

        Self {
            http: reqwest::Client::new(),
            remote: config.asset_host.clone(),
            uploads_dir: config.uploads.dir.clone(),
            public_path: config.uploads.public_path.clone(),
        }
    }

    /// Store an uploaded file under `folder`, returning its public URL.
    ///
    /// Tries the remote host first; on any remote failure the bytes are
    /// written to the local uploads directory instead, so a broken host
    /// degrades service rather than interrupting it.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::Io` only when the local fallback itself
    /// cannot write the file.
    pub async fn store(
        &self,
        field: &str,
        original_name: &str,
        bytes: Vec<u8>,
        folder: &str,
    ) -> Result<StoredAsset, AssetError> {
        let filename = unique_filename(field, original_name);

        if let Some(remote) = &self.remote {
            match self.upload_remote(remote, &filename, bytes.clone(), folder).await {
                Ok(asset) => {
                    tracing::info!(url = %asset.url, "Asset host upload succeeded");
                    return Ok(asset);
                }
                Err(e) => {
                    tracing::warn!(error = %e, file = %filename, "Asset host upload failed; using local storage");
                }
            }
        }

        self.store_local(&filename, bytes).await
    }

    /// Best-effort deletion of a previously stored asset.
    ///
    /// Only remote assets are deleted; locally stored files stay on disk.
    /// Failures are logged and swallowed.
    pub async fn delete(&self, url: &str) {
        let Some(remote) = &self.remote else {
            return;
        };
        if !url.starts_with(&remote.base_url) {
            return;
        }

        let public_id = public_id_from_url(url);
        let endpoint = format!("{}/{public_id}", remote.base_url.trim_end_matches('/'));

        match self
            .http
            .delete(&endpoint)
            .bearer_auth(remote.api_key.expose_secret())
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                tracing::info!(public_id = %public_id, "Remote asset deleted");
            }
            Ok(response) => {
                tracing::warn!(public_id = %public_id, status = %response.status(), "Remote asset deletion failed");
            }
            Err(e) => {
                tracing::warn!(public_id = %public_id, error = %e, "Remote asset deletion failed");
            }
        }
    }

    async fn upload_remote(
        &self,
        remote: &AssetHostConfig,
        filename: &str,
        bytes: Vec<u8>,
        folder: &str,
    ) -> Result<StoredAsset, AssetError> {
        let size = bytes.len() as u64;
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_owned());
        let form = reqwest::multipart::Form::new()
            .text("folder", folder.to_owned())
            .part("file", part);

        let endpoint = format!("{}/{folder}", remote.base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(remote.api_key.expose_secret())
            .multipart(form)
            .send()
            .await
            .map_err(|e| AssetError::Host(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AssetError::Host(format!(
                "upload returned {}",
                response.status()
            )));
        }

        let body: RemoteUploadResponse = response
            .json()
            .await
            .map_err(|e| AssetError::Host(e.to_string()))?;

        Ok(StoredAsset {
            url: body.url,
            public_id: body.public_id,
            format: body
                .format
                .unwrap_or_else(|| extension_of(filename).to_owned()),
            size: body.bytes.unwrap_or(size),
        })
    }

    async fn store_local(&self, filename: &str, bytes: Vec<u8>) -> Result<StoredAsset, AssetError> {
        tokio::fs::create_dir_all(&self.uploads_dir).await?;

        let path = self.uploads_dir.join(filename);
        let size = bytes.len() as u64;
        tokio::fs::write(&path, bytes).await?;

        let url = format!("{}/{filename}", self.public_path);
        tracing::info!(url = %url, "Stored upload locally");

        Ok(StoredAsset {
            url,
            public_id: filename
                .rsplit_once('.')
                .map_or(filename, |(stem, _)| stem)
                .to_owned(),
            format: extension_of(filename).to_owned(),
            size,
        })
    }
}

/// Build a collision-resistant filename: `<field>-<millis>-<random>.<ext>`.
fn unique_filename(field: &str, original_name: &str) -> String {
    use rand::Rng;
    let suffix: u32 = rand::rng().random_range(0..1_000_000_000);
    let extension = extension_of(original_name);
    if extension.is_empty() {
        format!("{field}-{}-{suffix}", Utc::now().timestamp_millis())
    } else {
        format!(
            "{field}-{}-{suffix}.{extension}",
            Utc::now().timestamp_millis()
        )
    }
}

/// The lowercase extension of a filename, or empty.
fn extension_of(name: &str) -> &str {
    name.rsplit_once('.').map_or("", |(_, ext)| ext)
}

/// Host-side identifier extracted from an asset URL (last path segment,
/// extension stripped).
fn public_id_from_url(url: &str) -> &str {
    let last = url.rsplit('/').next().unwrap_or(url);
    last.rsplit_once('.').map_or(last, |(stem, _)| stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_filename_shape() {
        let name = unique_filename("images", "photo.JPG");
        assert!(name.starts_with("images-"));
        assert!(name.ends_with(".JPG"));
    }

    #[test]
    fn test_unique_filename_without_extension() {
        let name = unique_filename("images", "photo");
        assert!(name.starts_with("images-"));
        assert!(!name.contains('.'));
    }

    #[test]
    fn test_unique_filenames_differ() {
        assert_ne!(
            unique_filename("images", "a.png"),
            unique_filename("images", "a.png")
        );
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("a.png"), "png");
        assert_eq!(extension_of("archive.tar.gz"), "gz");
        assert_eq!(extension_of("noext"), "");
    }

    #[test]
    fn test_public_id_from_url() {
        assert_eq!(
            public_id_from_url("https://assets.example.net/products/images-17-42.png"),
            "images-17-42"
        );
        assert_eq!(public_id_from_url("/uploads/images-17-42.png"), "images-17-42");
    }
}
