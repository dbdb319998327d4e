//! Durable storage for table snapshots
//!
//! A backend stores a set of opaque named blobs. A commit replaces the whole
//! set at once: either every snapshot of the commit becomes visible or none
//! does. The filesystem backend stages the set in a fresh generation
//! directory and then swaps a `CURRENT` pointer file onto it with a single
//! rename.

use async_trait::async_trait;
use dropstone_errors::{Error, StorageError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::fs;
use uuid::Uuid;

/// Name of the pointer file that selects the live generation
pub const CURRENT_POINTER: &str = "CURRENT";

const GENERATION_PREFIX: &str = "snapshot-";

#[async_trait]
pub trait SnapshotBackend: Send + Sync {
    /// Read a snapshot; `None` when it has never been written
    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>, Error>;

    /// Replace the whole snapshot set with `snapshots`, all or nothing
    async fn commit(&self, snapshots: &[(&str, Vec<u8>)]) -> Result<(), Error>;

    async fn exists(&self, name: &str) -> bool;
}

/// Snapshots as JSON files in generation directories
///
/// Layout: `<dir>/CURRENT` holds the name of the live `snapshot-<uuid>`
/// directory. Directories written before the pointer existed keep their
/// snapshots directly in `<dir>` and are still read.
#[derive(Debug, Clone)]
pub struct FsSnapshotBackend {
    dir: PathBuf,
}

impl FsSnapshotBackend {
    #[must_use]
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// Name of the live generation, if a commit has ever completed
    async fn current_generation(&self) -> Result<Option<String>, Error> {
        let pointer = self.dir.join(CURRENT_POINTER);
        let contents = match fs::read_to_string(&pointer).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::io_with_path(&e, &pointer)),
        };

        let generation = contents.trim();
        if !generation.starts_with(GENERATION_PREFIX) || generation.contains(['/', '\\']) {
            return Err(StorageError::CorruptedData {
                message: format!("{}: invalid generation {generation:?}", pointer.display()),
            }
            .into());
        }
        Ok(Some(generation.to_string()))
    }

    async fn path_for(&self, name: &str) -> Result<PathBuf, Error> {
        Ok(match self.current_generation().await? {
            Some(generation) => self.dir.join(generation).join(name),
            None => self.dir.join(name),
        })
    }

    async fn stage(&self, staging: &Path, snapshots: &[(&str, Vec<u8>)]) -> Result<(), Error> {
        fs::create_dir_all(staging)
            .await
            .map_err(|e| Error::io_with_path(&e, staging))?;
        for (name, bytes) in snapshots {
            let path = staging.join(name);
            fs::write(&path, bytes)
                .await
                .map_err(|e| Error::io_with_path(&e, &path))?;
        }
        Ok(())
    }

    async fn swap_pointer(&self, generation: &str) -> Result<(), Error> {
        let pointer = self.dir.join(CURRENT_POINTER);
        let temp_path = self
            .dir
            .join(format!(".{CURRENT_POINTER}.{}.tmp", Uuid::new_v4()));

        if let Err(e) = fs::write(&temp_path, generation).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(Error::io_with_path(&e, &temp_path));
        }

        if let Err(e) = fs::rename(&temp_path, &pointer).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::AtomicRenameFailed {
                message: format!("{}: {e}", pointer.display()),
            }
            .into());
        }
        Ok(())
    }

    /// Remove generations other than `live`, including abandoned stagings
    async fn sweep(&self, live: &str) {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(dir = %self.dir.display(), error = %e, "cannot list snapshot generations");
                return;
            }
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !name.starts_with(GENERATION_PREFIX) || name == live {
                continue;
            }
            if let Err(e) = fs::remove_dir_all(entry.path()).await {
                tracing::warn!(generation = %name, error = %e, "cannot remove old snapshot generation");
            }
        }
    }
}

#[async_trait]
impl SnapshotBackend for FsSnapshotBackend {
    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>, Error> {
        let path = self.path_for(name).await?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io_with_path(&e, &path)),
        }
    }

    async fn commit(&self, snapshots: &[(&str, Vec<u8>)]) -> Result<(), Error> {
        let generation = format!("{GENERATION_PREFIX}{}", Uuid::new_v4());
        let staging = self.dir.join(&generation);

        let staged = match self.stage(&staging, snapshots).await {
            Ok(()) => self.swap_pointer(&generation).await,
            Err(e) => Err(e),
        };
        if let Err(e) = staged {
            let _ = fs::remove_dir_all(&staging).await;
            return Err(e);
        }

        self.sweep(&generation).await;
        Ok(())
    }

    async fn exists(&self, name: &str) -> bool {
        match self.path_for(name).await {
            Ok(path) => fs::metadata(path).await.is_ok(),
            Err(_) => false,
        }
    }
}

/// Snapshots held in process memory
///
/// Clones share the same contents. Commits can be made to fail on demand,
/// either outright or when they include one named snapshot, which lets
/// callers exercise their persistence-failure paths.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotBackend {
    blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    fail_writes: Arc<AtomicBool>,
    fail_table: Arc<Mutex<Option<String>>>,
}

impl MemorySnapshotBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Fail every commit that includes the snapshot `name`
    pub fn set_fail_table(&self, name: Option<&str>) {
        let mut fail_table = self
            .fail_table
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *fail_table = name.map(str::to_string);
    }

    /// Names of every snapshot in the committed set
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let blobs = self.blobs.lock().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = blobs.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    fn refusal(&self, snapshots: &[(&str, Vec<u8>)]) -> Option<String> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Some("commit refused".to_string());
        }
        let fail_table = self
            .fail_table
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let target = fail_table.as_deref()?;
        snapshots
            .iter()
            .any(|(name, _)| *name == target)
            .then(|| format!("write to {target} refused"))
    }
}

#[async_trait]
impl SnapshotBackend for MemorySnapshotBackend {
    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>, Error> {
        let blobs = self.blobs.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(blobs.get(name).cloned())
    }

    async fn commit(&self, snapshots: &[(&str, Vec<u8>)]) -> Result<(), Error> {
        if let Some(message) = self.refusal(snapshots) {
            return Err(StorageError::IoError { message }.into());
        }
        let next: HashMap<String, Vec<u8>> = snapshots
            .iter()
            .map(|(name, bytes)| ((*name).to_string(), bytes.clone()))
            .collect();
        let mut blobs = self.blobs.lock().unwrap_or_else(PoisonError::into_inner);
        *blobs = next;
        Ok(())
    }

    async fn exists(&self, name: &str) -> bool {
        let blobs = self.blobs.lock().unwrap_or_else(PoisonError::into_inner);
        blobs.contains_key(name)
    }
}
