#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Artifact storage for dropstone
//!
//! Stored builds are flat files in a downloads directory, addressed by a
//! generated name. Names are single path components; anything that could
//! climb out of the directory is rejected.

use async_trait::async_trait;
use dropstone_errors::{Error, StorageError};
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Copy a file into storage under `name`, returning its size
    ///
    /// The source is left in place; it belongs to the caller.
    async fn put_file(&self, name: &str, source: &Path) -> Result<u64, Error>;

    /// Delete a stored file; `false` when it was already gone
    async fn delete(&self, name: &str) -> Result<bool, Error>;

    async fn exists(&self, name: &str) -> bool;

    /// Filesystem location of a stored file
    fn path_for(&self, name: &str) -> Result<PathBuf, Error>;
}

/// Local directory-backed artifact store
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    base: PathBuf,
}

impl LocalArtifactStore {
    #[must_use]
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self { base: base.into() }
    }

    async fn ensure_base(&self) -> Result<(), Error> {
        fs::create_dir_all(&self.base)
            .await
            .map_err(|e| Error::io_with_path(&e, &self.base))
    }

    /// Copy through a temporary file so `dest` appears complete or not at all
    async fn copy_into(&self, source: &Path, dest: &Path) -> Result<u64, Error> {
        let temp_path = self.base.join(format!(".{}.tmp", Uuid::new_v4()));

        let size = match fs::copy(source, &temp_path).await {
            Ok(size) => size,
            Err(e) => {
                let _ = fs::remove_file(&temp_path).await;
                return Err(Error::io_with_path(&e, source));
            }
        };

        if let Err(e) = fs::rename(&temp_path, dest).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::AtomicRenameFailed {
                message: format!("{}: {e}", dest.display()),
            }
            .into());
        }
        Ok(size)
    }
}

/// Reject names that are not a single plain path component
fn validate_name(name: &str) -> Result<(), Error> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(StorageError::InvalidPath {
            path: name.to_string(),
        }
        .into());
    }
    Ok(())
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn put_file(&self, name: &str, source: &Path) -> Result<u64, Error> {
        let dest = self.path_for(name)?;
        self.ensure_base().await?;

        let metadata = fs::metadata(source)
            .await
            .map_err(|e| Error::io_with_path(&e, source))?;
        if !metadata.is_file() {
            return Err(StorageError::InvalidPath {
                path: source.display().to_string(),
            }
            .into());
        }

        let size = self.copy_into(source, &dest).await?;

        tracing::debug!(name, path = %dest.display(), size, "stored artifact");
        Ok(size)
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::io_with_path(&e, &path)),
        }
    }

    async fn exists(&self, name: &str) -> bool {
        match self.path_for(name) {
            Ok(path) => fs::metadata(path).await.is_ok_and(|m| m.is_file()),
            Err(_) => false,
        }
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, Error> {
        validate_name(name)?;
        Ok(self.base.join(name))
    }
}
