//! Latest, version and download lookups

use crate::Registry;
use dropstone_errors::{Error, RegistryError, StorageError};
use dropstone_index::{keys, SnapshotBackend};
use dropstone_store::ArtifactStore;
use dropstone_types::{DownloadTarget, StorageName, VersionSummary};

impl<B: SnapshotBackend, A: ArtifactStore> Registry<B, A> {
    /// Current latest version of a channel
    ///
    /// # Errors
    ///
    /// Returns `LatestNotFound` when the channel has no versions.
    pub async fn resolve_latest(
        &self,
        platform: &str,
        quality: &str,
    ) -> Result<VersionSummary, Error> {
        let index = self.index.read().await;
        index
            .get_latest(&keys::latest_key(platform, quality))
            .map(|record| VersionSummary::from_record(platform, quality, record))
            .ok_or_else(|| {
                RegistryError::LatestNotFound {
                    platform: platform.to_string(),
                    quality: quality.to_string(),
                }
                .into()
            })
    }

    /// One specific version
    ///
    /// # Errors
    ///
    /// Returns `VersionNotFound` when the triple is not registered.
    pub async fn resolve_version(
        &self,
        platform: &str,
        quality: &str,
        version: &str,
    ) -> Result<VersionSummary, Error> {
        let index = self.index.read().await;
        index
            .get_version(&keys::version_key(platform, quality, version))
            .map(|record| VersionSummary::from_record(platform, quality, record))
            .ok_or_else(|| {
                RegistryError::VersionNotFound {
                    platform: platform.to_string(),
                    quality: quality.to_string(),
                    version: version.to_string(),
                }
                .into()
            })
    }

    /// Where the bytes of a version are served from
    ///
    /// # Errors
    ///
    /// Returns `DownloadNotFound` when no download record exists, and
    /// `ArtifactMissing` when the record points at a stored file that is
    /// no longer on disk.
    pub async fn resolve_download(
        &self,
        platform: &str,
        quality: &str,
        version: &str,
    ) -> Result<DownloadTarget, Error> {
        let download = {
            let index = self.index.read().await;
            index
                .get_download(&keys::download_key(platform, quality, version))
                .cloned()
                .ok_or_else(|| RegistryError::DownloadNotFound {
                    platform: platform.to_string(),
                    quality: quality.to_string(),
                    version: version.to_string(),
                })?
        };

        if let Some(url) = download.external_url {
            return Ok(DownloadTarget::Redirect { url });
        }

        let StorageName::Local(storage_name) = download.storage_name else {
            return Err(StorageError::CorruptedData {
                message: format!(
                    "download record for {platform}/{quality}/{version} has neither a file nor a URL"
                ),
            }
            .into());
        };

        if !self.artifacts.exists(&storage_name).await {
            tracing::warn!(platform, quality, version, %storage_name, "stored artifact is missing");
            return Err(StorageError::ArtifactMissing { name: storage_name }.into());
        }

        Ok(DownloadTarget::LocalFile {
            path: self.artifacts.path_for(&storage_name)?,
            display_name: download.original_name,
            size: download.size,
            content_hash: download.content_hash,
        })
    }
}
