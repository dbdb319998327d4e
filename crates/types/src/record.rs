//! Persisted record shapes
//!
//! Field names on the wire follow the snapshot files the server has always
//! written (`sha256hash`, `filename`, `originalName`, `externalUrl`), so
//! existing `data/*.json` files load unchanged.

use crate::EXTERNAL_SENTINEL;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hex SHA-256 of an artifact, or unknown for externally hosted builds
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContentHash {
    Sha256(String),
    Unknown,
}

impl ContentHash {
    #[must_use]
    pub fn is_known(&self) -> bool {
        matches!(self, Self::Sha256(_))
    }

    #[must_use]
    pub fn as_hex(&self) -> Option<&str> {
        match self {
            Self::Sha256(hex) => Some(hex),
            Self::Unknown => None,
        }
    }
}

impl From<String> for ContentHash {
    fn from(s: String) -> Self {
        if s == EXTERNAL_SENTINEL {
            Self::Unknown
        } else {
            Self::Sha256(s)
        }
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        match hash {
            ContentHash::Sha256(hex) => hex,
            ContentHash::Unknown => EXTERNAL_SENTINEL.to_string(),
        }
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha256(hex) => f.write_str(hex),
            Self::Unknown => f.write_str(EXTERNAL_SENTINEL),
        }
    }
}

/// Name of the stored artifact file, or external when nothing is kept locally
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StorageName {
    Local(String),
    External,
}

impl StorageName {
    #[must_use]
    pub fn local(&self) -> Option<&str> {
        match self {
            Self::Local(name) => Some(name),
            Self::External => None,
        }
    }
}

impl From<String> for StorageName {
    fn from(s: String) -> Self {
        if s == EXTERNAL_SENTINEL {
            Self::External
        } else {
            Self::Local(s)
        }
    }
}

impl From<StorageName> for String {
    fn from(name: StorageName) -> Self {
        match name {
            StorageName::Local(name) => name,
            StorageName::External => EXTERNAL_SENTINEL.to_string(),
        }
    }
}

/// One published build of a platform/quality/version triple
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub version: String,
    pub name: String,
    /// Milliseconds since the Unix epoch, fixed at registration
    pub timestamp: i64,
    /// External URL, or `/commit:<version>/<platform>/<quality>` for stored builds
    pub url: String,
    #[serde(rename = "sha256hash")]
    pub content_hash: ContentHash,
}

impl VersionRecord {
    /// Path the download endpoint serves a locally stored build under
    #[must_use]
    pub fn commit_path(platform: &str, quality: &str, version: &str) -> String {
        format!("/commit:{version}/{platform}/{quality}")
    }
}

/// Physical location of a build's artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRecord {
    #[serde(rename = "filename")]
    pub storage_name: StorageName,
    pub original_name: String,
    /// Byte length; zero when hosted externally
    pub size: u64,
    #[serde(rename = "sha256hash")]
    pub content_hash: ContentHash,
    #[serde(default)]
    pub external_url: Option<String>,
}

/// Public view of a version handed to clients checking for updates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionSummary {
    pub platform: String,
    pub quality: String,
    pub version: String,
    pub name: String,
    pub timestamp: i64,
    pub url: String,
    #[serde(rename = "sha256hash")]
    pub content_hash: ContentHash,
}

impl VersionSummary {
    #[must_use]
    pub fn from_record(platform: &str, quality: &str, record: &VersionRecord) -> Self {
        Self {
            platform: platform.to_string(),
            quality: quality.to_string(),
            version: record.version.clone(),
            name: record.name.clone(),
            timestamp: record.timestamp,
            url: record.url.clone(),
            content_hash: record.content_hash.clone(),
        }
    }
}
