//! Where a build's bytes come from, and where a download is served from

use crate::ContentHash;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Artifact handed to the registry at registration time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArtifactSource {
    /// A file on local disk, copied into permanent storage on success
    LocalFile {
        path: PathBuf,
        original_name: String,
        /// Size reported by the uploader; checked against the file when present
        size: Option<u64>,
    },
    /// A build hosted elsewhere; never fetched
    External { url: String },
}

impl ArtifactSource {
    /// Local file whose display name is its own file name
    #[must_use]
    pub fn local_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let original_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::LocalFile {
            path,
            original_name,
            size: None,
        }
    }

    #[must_use]
    pub fn external(url: impl Into<String>) -> Self {
        Self::External { url: url.into() }
    }
}

/// Resolution of a download request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DownloadTarget {
    /// Send the client elsewhere
    Redirect { url: String },
    /// Serve a stored file under its original name
    LocalFile {
        path: PathBuf,
        display_name: String,
        size: u64,
        content_hash: ContentHash,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_file_takes_file_name() {
        let source = ArtifactSource::local_file("/tmp/uploads/Dropstone-1.96.4.exe");
        match source {
            ArtifactSource::LocalFile { original_name, .. } => {
                assert_eq!(original_name, "Dropstone-1.96.4.exe");
            }
            ArtifactSource::External { .. } => panic!("expected local file"),
        }
    }
}
