#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Version record store for dropstone
//!
//! Three tables make up the registry state: version records, latest
//! pointers and download records. They are held in memory, committed as one
//! set of three JSON snapshots after every mutation, and read back at
//! startup. Loading is a structural copy: nothing is cross-checked or
//! rebuilt.

pub mod keys;
mod snapshot;

pub use snapshot::{FsSnapshotBackend, MemorySnapshotBackend, SnapshotBackend, CURRENT_POINTER};

use dropstone_errors::{Error, StorageError};
use dropstone_types::{DownloadRecord, ListedVersion, VersionOrdering, VersionRecord};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Snapshot name of the version records table
pub const VERSIONS_TABLE: &str = "versions.json";
/// Snapshot name of the latest pointers table
pub const LATEST_TABLE: &str = "latest.json";
/// Snapshot name of the download records table
pub const DOWNLOADS_TABLE: &str = "downloads.json";

/// The three in-memory tables
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tables {
    pub versions: BTreeMap<String, VersionRecord>,
    pub latest: BTreeMap<String, VersionRecord>,
    pub downloads: BTreeMap<String, DownloadRecord>,
}

/// In-memory tables bound to a durable backend
#[derive(Debug)]
pub struct VersionIndex<B: SnapshotBackend> {
    backend: B,
    tables: Tables,
}

impl<B: SnapshotBackend> VersionIndex<B> {
    /// Empty index that has not read anything from the backend
    pub fn empty(backend: B) -> Self {
        Self {
            backend,
            tables: Tables::default(),
        }
    }

    /// Read all three tables from the backend
    ///
    /// A table that was never written loads as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if a snapshot cannot be read or is not valid JSON.
    pub async fn load(backend: B) -> Result<Self, Error> {
        if !backend.exists(VERSIONS_TABLE).await {
            tracing::debug!("no registry snapshots yet");
        }

        let tables = Tables {
            versions: read_table(&backend, VERSIONS_TABLE).await?,
            latest: read_table(&backend, LATEST_TABLE).await?,
            downloads: read_table(&backend, DOWNLOADS_TABLE).await?,
        };

        tracing::debug!(
            versions = tables.versions.len(),
            latest = tables.latest.len(),
            downloads = tables.downloads.len(),
            "loaded registry snapshots"
        );

        Ok(Self { backend, tables })
    }

    /// Commit all three tables to the backend in one step
    ///
    /// On failure the backend still holds the previously committed set.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the backend commit fails.
    pub async fn save(&self) -> Result<(), Error> {
        let snapshots = [
            (VERSIONS_TABLE, serde_json::to_vec_pretty(&self.tables.versions)?),
            (LATEST_TABLE, serde_json::to_vec_pretty(&self.tables.latest)?),
            (DOWNLOADS_TABLE, serde_json::to_vec_pretty(&self.tables.downloads)?),
        ];
        self.backend.commit(&snapshots).await?;
        tracing::debug!("saved registry snapshots");
        Ok(())
    }

    #[must_use]
    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    // Version records

    #[must_use]
    pub fn get_version(&self, key: &str) -> Option<&VersionRecord> {
        self.tables.versions.get(key)
    }

    /// Insert a version record, returning the one it replaced
    pub fn put_version(&mut self, key: String, record: VersionRecord) -> Option<VersionRecord> {
        self.tables.versions.insert(key, record)
    }

    pub fn delete_version(&mut self, key: &str) -> Option<VersionRecord> {
        self.tables.versions.remove(key)
    }

    // Latest pointers

    #[must_use]
    pub fn get_latest(&self, key: &str) -> Option<&VersionRecord> {
        self.tables.latest.get(key)
    }

    pub fn put_latest(&mut self, key: String, record: VersionRecord) -> Option<VersionRecord> {
        self.tables.latest.insert(key, record)
    }

    pub fn delete_latest(&mut self, key: &str) -> Option<VersionRecord> {
        self.tables.latest.remove(key)
    }

    // Download records

    #[must_use]
    pub fn get_download(&self, key: &str) -> Option<&DownloadRecord> {
        self.tables.downloads.get(key)
    }

    pub fn put_download(&mut self, key: String, record: DownloadRecord) -> Option<DownloadRecord> {
        self.tables.downloads.insert(key, record)
    }

    pub fn delete_download(&mut self, key: &str) -> Option<DownloadRecord> {
        self.tables.downloads.remove(key)
    }

    /// Every version record of one platform/quality channel
    pub fn channel_versions<'a>(
        &'a self,
        platform: &str,
        quality: &str,
    ) -> impl Iterator<Item = &'a VersionRecord> + 'a {
        let prefix = keys::channel_prefix(platform, quality);
        self.tables
            .versions
            .range(prefix.clone()..)
            .take_while(move |(key, _)| key.starts_with(&prefix))
            .map(|(_, record)| record)
    }

    /// Greatest version of a channel under `ordering`
    #[must_use]
    pub fn newest_in_channel(
        &self,
        platform: &str,
        quality: &str,
        ordering: VersionOrdering,
    ) -> Option<&VersionRecord> {
        self.channel_versions(platform, quality)
            .max_by(|a, b| ordering.compare(&a.version, &b.version))
    }

    /// All version records with their decoded keys, sorted by key
    #[must_use]
    pub fn list_versions(&self) -> Vec<ListedVersion> {
        self.tables
            .versions
            .iter()
            .map(|(key, record)| {
                let parts = keys::decode_version_key(key);
                listed(key, parts, record)
            })
            .collect()
    }

    /// All latest pointers with their decoded keys, sorted by key
    #[must_use]
    pub fn list_latest(&self) -> Vec<ListedVersion> {
        self.tables
            .latest
            .iter()
            .map(|(key, record)| {
                let parts = keys::decode_latest_key(key);
                listed(key, parts, record)
            })
            .collect()
    }
}

fn listed(key: &str, parts: Option<keys::KeyParts>, record: &VersionRecord) -> ListedVersion {
    // keys that do not decode were written by something else; show them raw
    let (platform, quality) = parts.map_or_else(
        || (String::new(), String::new()),
        |p| (p.platform, p.quality),
    );
    ListedVersion {
        key: key.to_string(),
        platform,
        quality,
        record: record.clone(),
    }
}

async fn read_table<B, T>(backend: &B, name: &str) -> Result<BTreeMap<String, T>, Error>
where
    B: SnapshotBackend,
    T: DeserializeOwned,
{
    let Some(bytes) = backend.read(name).await? else {
        return Ok(BTreeMap::new());
    };

    serde_json::from_slice(&bytes).map_err(|e| {
        StorageError::CorruptedData {
            message: format!("{name}: {e}"),
        }
        .into()
    })
}
