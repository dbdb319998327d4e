//! Command results handed to the renderer

use dropstone_types::{
    DownloadTarget, ListedVersion, RegistryStats, RemovalReport, VersionSummary,
};
use serde::Serialize;

/// Result of one CLI command, serializable for `--json`
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum CommandOutput {
    /// A build was registered
    Registered(VersionSummary),
    /// A removal was processed
    Removed(RemovalReport),
    /// A single version
    Version(VersionSummary),
    /// Where a version is served from
    Download(DownloadTarget),
    /// A listing of records
    Listing(Vec<ListedVersion>),
    /// Table sizes
    Stats(RegistryStats),
}

impl CommandOutput {
    /// Convert to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
