//! Version registration

use crate::{infer, require, Registry};
use dropstone_errors::{Error, RegistryError};
use dropstone_hash::Hash;
use dropstone_index::{keys, SnapshotBackend, VersionIndex};
use dropstone_store::ArtifactStore;
use dropstone_types::{
    now_millis, ArtifactSource, ContentHash, DownloadRecord, StorageName, VersionRecord,
};
use std::path::{Path, PathBuf};

/// Artifact facts gathered before the tables are touched
struct Prepared {
    url: String,
    download: DownloadRecord,
    /// Local file still to be copied into storage
    pending: Option<Pending>,
}

struct Pending {
    path: PathBuf,
    stem: String,
    extension: String,
}

/// Table entries displaced by one registration
struct Displaced {
    version: Option<VersionRecord>,
    latest: Option<Option<VersionRecord>>,
    download: Option<DownloadRecord>,
}

impl Displaced {
    fn restore<B: SnapshotBackend>(self, index: &mut VersionIndex<B>, keys: &Keys) {
        match self.version {
            Some(old) => index.put_version(keys.version.clone(), old),
            None => index.delete_version(&keys.version),
        };
        match self.download {
            Some(old) => index.put_download(keys.download.clone(), old),
            None => index.delete_download(&keys.download),
        };
        // untouched pointer needs no undo
        if let Some(previous) = self.latest {
            match previous {
                Some(old) => index.put_latest(keys.latest.clone(), old),
                None => index.delete_latest(&keys.latest),
            };
        }
    }
}

struct Keys {
    version: String,
    latest: String,
    download: String,
}

impl<B: SnapshotBackend, A: ArtifactStore> Registry<B, A> {
    /// Publish a build, replacing any record under the same triple
    ///
    /// The latest pointer of the channel moves to this version when there is
    /// none yet, when this version orders after the current one, or when it
    /// is the current one being re-registered.
    ///
    /// # Errors
    ///
    /// Returns a validation error for empty fields, a malformed external
    /// URL or an oversized upload; nothing is changed in that case. Returns
    /// a storage error if the artifact cannot be stored or the snapshots
    /// cannot be saved; in-memory state is rolled back and the stored copy
    /// is removed again. A local source file is never modified.
    pub async fn register(
        &self,
        platform: &str,
        quality: &str,
        version: &str,
        name: &str,
        source: ArtifactSource,
    ) -> Result<VersionRecord, Error> {
        require("platform", platform)?;
        require("quality", quality)?;
        require("version", version)?;
        require("name", name)?;

        let keys = Keys {
            version: keys::version_key(platform, quality, version),
            latest: keys::latest_key(platform, quality),
            download: keys::download_key(platform, quality, version),
        };

        let prepared = self
            .prepare(platform, quality, version, &keys.download, source)
            .await?;

        let record = VersionRecord {
            version: version.to_string(),
            name: name.to_string(),
            timestamp: now_millis(),
            url: prepared.url,
            content_hash: prepared.download.content_hash.clone(),
        };
        let mut download = prepared.download;

        let mut index = self.index.write().await;

        let stored = match prepared.pending {
            Some(pending) => {
                let storage_name = self.unused_name(&pending, record.timestamp).await;
                self.artifacts.put_file(&storage_name, &pending.path).await?;
                download.storage_name = StorageName::Local(storage_name.clone());
                Some(storage_name)
            }
            None => None,
        };

        let ordering = self.options.ordering;
        let latest_moves = index
            .get_latest(&keys.latest)
            .is_none_or(|current| {
                current.version == version || ordering.is_newer(version, &current.version)
            });

        let displaced = Displaced {
            version: index.put_version(keys.version.clone(), record.clone()),
            download: index.put_download(keys.download.clone(), download),
            latest: latest_moves.then(|| index.put_latest(keys.latest.clone(), record.clone())),
        };

        if let Err(err) = index.save().await {
            displaced.restore(&mut index, &keys);
            drop(index);
            tracing::error!(
                platform,
                quality,
                version,
                error = %err,
                "saving registry failed; registration rolled back"
            );
            // stored names are never reused, so this file has no other owner
            if let Some(storage_name) = stored {
                self.discard(&storage_name).await;
            }
            return Err(err);
        }
        drop(index);

        if let Some(old) = displaced.download.as_ref().and_then(|d| d.storage_name.local()) {
            if stored.as_deref() != Some(old) {
                self.discard(old).await;
            }
        }

        tracing::info!(
            platform,
            quality,
            version,
            url = %record.url,
            latest = latest_moves,
            replaced = displaced.version.is_some(),
            "registered version"
        );

        Ok(record)
    }

    async fn prepare(
        &self,
        platform: &str,
        quality: &str,
        version: &str,
        download_key: &str,
        source: ArtifactSource,
    ) -> Result<Prepared, Error> {
        match source {
            ArtifactSource::External { url } => {
                let url = url.trim().to_string();
                let parsed = infer::parse_external_url(&url)?;
                Ok(Prepared {
                    download: DownloadRecord {
                        storage_name: StorageName::External,
                        original_name: infer::original_name_from_url(&parsed),
                        size: 0,
                        content_hash: ContentHash::Unknown,
                        external_url: Some(url.clone()),
                    },
                    url,
                    pending: None,
                })
            }
            ArtifactSource::LocalFile {
                path,
                original_name,
                size,
            } => {
                let metadata = tokio::fs::metadata(&path)
                    .await
                    .map_err(|e| Error::io_with_path(&e, &path))?;
                if !metadata.is_file() {
                    return Err(RegistryError::Validation {
                        field: "file".to_string(),
                        reason: format!("{} is not a regular file", path.display()),
                    }
                    .into());
                }
                self.check_upload_size(metadata.len())?;

                let (hash, measured) = Hash::hash_file_with_size(&path).await?;
                if let Some(claimed) = size {
                    if claimed != measured {
                        return Err(RegistryError::Validation {
                            field: "size".to_string(),
                            reason: format!("declared {claimed} bytes, file has {measured}"),
                        }
                        .into());
                    }
                }
                self.check_upload_size(measured)?;

                let original_name = if original_name.trim().is_empty() {
                    path.file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .ok_or_else(|| RegistryError::missing_field("original name"))?
                } else {
                    original_name
                };

                let pending = Pending {
                    path,
                    stem: keys::file_stem(download_key),
                    extension: extension_of(&original_name),
                };

                Ok(Prepared {
                    url: VersionRecord::commit_path(platform, quality, version),
                    download: DownloadRecord {
                        storage_name: StorageName::External,
                        original_name,
                        size: measured,
                        content_hash: ContentHash::Sha256(hash.to_hex()),
                        external_url: None,
                    },
                    pending: Some(pending),
                })
            }
        }
    }

    fn check_upload_size(&self, size: u64) -> Result<(), Error> {
        match self.options.max_upload_bytes {
            Some(limit) if size > limit => Err(RegistryError::Validation {
                field: "file".to_string(),
                reason: format!("{size} bytes exceeds the upload limit of {limit} bytes"),
            }
            .into()),
            _ => Ok(()),
        }
    }

    /// First storage name at or after `timestamp` not already taken
    async fn unused_name(&self, pending: &Pending, timestamp: i64) -> String {
        let mut ts = timestamp;
        loop {
            let candidate = format!("{}-{ts}{}", pending.stem, pending.extension);
            if !self.artifacts.exists(&candidate).await {
                return candidate;
            }
            ts += 1;
        }
    }

    /// Best-effort removal of a stored artifact
    pub(crate) async fn discard(&self, storage_name: &str) -> bool {
        match self.artifacts.delete(storage_name).await {
            Ok(deleted) => deleted,
            Err(err) => {
                tracing::warn!(
                    storage_name,
                    error = %err,
                    "failed to delete stored artifact"
                );
                false
            }
        }
    }
}

/// Extension of `name` including the dot, reduced to safe characters
fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .map(|ext| {
            let ext: String = ext
                .to_string_lossy()
                .chars()
                .filter(char::is_ascii_alphanumeric)
                .collect();
            if ext.is_empty() {
                ext
            } else {
                format!(".{ext}")
            }
        })
        .unwrap_or_default()
}
