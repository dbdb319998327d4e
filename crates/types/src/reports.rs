//! Report type definitions for registry operations

use crate::VersionRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of removing a version
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemovalReport {
    pub platform: String,
    pub quality: String,
    pub version: String,
    /// False when nothing was registered under the key
    pub removed: bool,
    /// True when a stored artifact file was deleted
    pub artifact_deleted: bool,
    /// Latest pointer for the channel after removal
    pub latest: Option<VersionRecord>,
}

/// Table sizes, as reported by the health endpoint
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistryStats {
    pub versions: usize,
    pub latest: usize,
    pub downloads: usize,
    pub timestamp: DateTime<Utc>,
}

/// A record together with the key it is stored under
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedVersion {
    pub key: String,
    pub platform: String,
    pub quality: String,
    #[serde(flatten)]
    pub record: VersionRecord,
}
