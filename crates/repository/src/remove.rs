//! Version removal

use crate::{require, Registry};
use dropstone_errors::Error;
use dropstone_index::{keys, SnapshotBackend};
use dropstone_store::ArtifactStore;
use dropstone_types::RemovalReport;

impl<B: SnapshotBackend, A: ArtifactStore> Registry<B, A> {
    /// Delete one version and its download record
    ///
    /// When the removed version is the channel's latest, the pointer moves
    /// to the greatest remaining version or disappears with the last one.
    /// Removing a version that was never registered is not an error; the
    /// report says nothing was removed.
    ///
    /// # Errors
    ///
    /// Returns a validation error for empty fields, or a storage error if
    /// the snapshots cannot be saved (state is rolled back).
    pub async fn remove(
        &self,
        platform: &str,
        quality: &str,
        version: &str,
    ) -> Result<RemovalReport, Error> {
        require("platform", platform)?;
        require("quality", quality)?;
        require("version", version)?;

        let version_key = keys::version_key(platform, quality, version);
        let latest_key = keys::latest_key(platform, quality);
        let download_key = keys::download_key(platform, quality, version);

        let mut index = self.index.write().await;

        let old_version = index.delete_version(&version_key);
        let old_download = index.delete_download(&download_key);

        let mut old_latest = None;
        if index
            .get_latest(&latest_key)
            .is_some_and(|current| current.version == version)
        {
            let successor = index
                .newest_in_channel(platform, quality, self.options.ordering)
                .cloned();
            old_latest = match successor {
                Some(next) => index.put_latest(latest_key.clone(), next),
                None => index.delete_latest(&latest_key),
            };
        }

        let removed = old_version.is_some() || old_download.is_some();
        if removed || old_latest.is_some() {
            if let Err(err) = index.save().await {
                if let Some(old) = old_version {
                    index.put_version(version_key, old);
                }
                if let Some(old) = old_download {
                    index.put_download(download_key, old);
                }
                if let Some(old) = old_latest {
                    index.put_latest(latest_key, old);
                }
                tracing::error!(
                    platform,
                    quality,
                    version,
                    error = %err,
                    "saving registry failed; removal rolled back"
                );
                return Err(err);
            }
        }

        let latest = index.get_latest(&latest_key).cloned();
        drop(index);

        let mut artifact_deleted = false;
        if let Some(name) = old_download.as_ref().and_then(|d| d.storage_name.local()) {
            artifact_deleted = self.discard(name).await;
        }

        if removed {
            tracing::info!(
                platform,
                quality,
                version,
                artifact_deleted,
                latest = latest.as_ref().map(|r| r.version.as_str()),
                "removed version"
            );
        } else {
            tracing::debug!(platform, quality, version, "nothing registered to remove");
        }

        Ok(RemovalReport {
            platform: platform.to_string(),
            quality: quality.to_string(),
            version: version.to_string(),
            removed,
            artifact_deleted,
            latest,
        })
    }
}
