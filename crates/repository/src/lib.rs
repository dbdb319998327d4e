#![warn(mismatched_lifetime_syntaxes)]
#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Registry service and download resolution for dropstone
//!
//! [`Registry`] owns the version tables and the artifact store. Every
//! mutation (register, remove) runs under one write lock from the first
//! table change through the snapshot save, so concurrent registrations for
//! the same channel cannot race on the latest pointer. Lookups share a read
//! lock.

mod infer;
mod register;
mod remove;
mod resolve;

pub use infer::{infer_version_from_url, original_name_from_url};

use dropstone_config::Config;
use dropstone_errors::Error;
use dropstone_index::{FsSnapshotBackend, SnapshotBackend, VersionIndex};
use dropstone_store::{ArtifactStore, LocalArtifactStore};
use dropstone_types::{ListedVersion, RegistryStats, VersionOrdering};
use tokio::sync::RwLock;

/// Registry tuning
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistryOptions {
    pub ordering: VersionOrdering,
    /// Largest accepted local artifact; `None` = unlimited
    pub max_upload_bytes: Option<u64>,
}

impl RegistryOptions {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            ordering: config.registry.version_ordering,
            max_upload_bytes: config.upload_limit(),
        }
    }
}

/// The update registry
#[derive(Debug)]
pub struct Registry<B: SnapshotBackend, A: ArtifactStore> {
    index: RwLock<VersionIndex<B>>,
    artifacts: A,
    options: RegistryOptions,
}

/// Registry over a data directory and a downloads directory
pub type LocalRegistry = Registry<FsSnapshotBackend, LocalArtifactStore>;

impl<B: SnapshotBackend, A: ArtifactStore> Registry<B, A> {
    /// Load persisted state from `backend`
    ///
    /// # Errors
    ///
    /// Returns an error if a snapshot exists but cannot be read or parsed.
    pub async fn open(backend: B, artifacts: A, options: RegistryOptions) -> Result<Self, Error> {
        let index = VersionIndex::load(backend).await?;
        Ok(Self::with_index(index, artifacts, options))
    }

    #[must_use]
    pub fn with_index(index: VersionIndex<B>, artifacts: A, options: RegistryOptions) -> Self {
        Self {
            index: RwLock::new(index),
            artifacts,
            options,
        }
    }

    #[must_use]
    pub fn options(&self) -> RegistryOptions {
        self.options
    }

    /// Every version record, sorted by key
    pub async fn list_all(&self) -> Vec<ListedVersion> {
        self.index.read().await.list_versions()
    }

    /// Every latest pointer, sorted by key
    pub async fn list_latest(&self) -> Vec<ListedVersion> {
        self.index.read().await.list_latest()
    }

    /// Table sizes
    pub async fn stats(&self) -> RegistryStats {
        let index = self.index.read().await;
        let tables = index.tables();
        RegistryStats {
            versions: tables.versions.len(),
            latest: tables.latest.len(),
            downloads: tables.downloads.len(),
            timestamp: chrono::Utc::now(),
        }
    }
}

impl LocalRegistry {
    /// Open the registry at the directories named by `config`
    ///
    /// # Errors
    ///
    /// Returns an error if existing snapshots cannot be read or parsed.
    pub async fn open_local(config: &Config) -> Result<Self, Error> {
        let data_dir = config.data_dir();
        let downloads_dir = config.downloads_dir();
        tracing::debug!(
            data_dir = %data_dir.display(),
            downloads_dir = %downloads_dir.display(),
            "opening registry"
        );
        Self::open(
            FsSnapshotBackend::new(data_dir),
            LocalArtifactStore::new(downloads_dir),
            RegistryOptions::from_config(config),
        )
        .await
    }
}

/// Reject empty identifying fields
fn require(field: &str, value: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(dropstone_errors::RegistryError::missing_field(field).into());
    }
    Ok(())
}
