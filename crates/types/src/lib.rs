#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for the dropstone update server
//!
//! This crate provides the persisted record shapes, the version ordering
//! used to pick a "latest" build, and the values handed back to callers
//! of the registry.

pub mod record;
pub mod reports;
pub mod source;
pub mod version;

pub use record::{ContentHash, DownloadRecord, StorageName, VersionRecord, VersionSummary};
pub use reports::{ListedVersion, RegistryStats, RemovalReport};
pub use source::{ArtifactSource, DownloadTarget};
pub use version::VersionOrdering;

use serde::{Deserialize, Serialize};

/// Sentinel written in place of a hash or stored file name for builds
/// hosted elsewhere.
pub const EXTERNAL_SENTINEL: &str = "external-url";

/// Color output control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    Always,
    Auto,
    Never,
}

impl Default for ColorChoice {
    fn default() -> Self {
        Self::Auto
    }
}

/// Current time in milliseconds since the Unix epoch
#[must_use]
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
