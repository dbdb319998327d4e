#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for dropstone
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/dropstone/config.toml)
//! - Environment variables
//! - CLI flags (applied by the binary)

pub mod constants;

use dropstone_errors::{ConfigError, Error};
use dropstone_types::VersionOrdering;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub paths: PathConfig,

    #[serde(default)]
    pub registry: RegistryConfig,
}

/// Where snapshots and stored artifacts live
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathConfig {
    pub data_dir: Option<PathBuf>,
    pub downloads_dir: Option<PathBuf>,
}

/// Registry behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub version_ordering: VersionOrdering,
    /// Largest accepted local artifact; 0 = unlimited
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
    #[serde(default = "default_platform")]
    pub default_platform: String,
    #[serde(default = "default_quality")]
    pub default_quality: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            version_ordering: VersionOrdering::default(),
            max_upload_bytes: constants::MAX_UPLOAD_BYTES,
            default_platform: constants::DEFAULT_PLATFORM.to_string(),
            default_quality: constants::DEFAULT_QUALITY.to_string(),
        }
    }
}

fn default_max_upload_bytes() -> u64 {
    constants::MAX_UPLOAD_BYTES
}

fn default_platform() -> String {
    constants::DEFAULT_PLATFORM.to_string()
}

fn default_quality() -> String {
    constants::DEFAULT_QUALITY.to_string()
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("dropstone").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid TOML.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML document
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid TOML for this schema.
    pub fn from_toml(contents: &str) -> Result<Self, Error> {
        toml::from_str(contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the default configuration file exists but cannot
    /// be read or parsed.
    pub async fn load() -> Result<Self, Error> {
        let Ok(config_path) = Self::default_path() else {
            return Ok(Self::default());
        };

        if config_path.exists() {
            tracing::debug!(path = %config_path.display(), "loading config");
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if an environment variable holds a value that cannot
    /// be parsed into the expected type.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        self.merge_from(|name| std::env::var(name).ok())
    }

    /// Merge overrides from an arbitrary variable source
    ///
    /// # Errors
    ///
    /// Returns an error on an unparseable value.
    pub fn merge_from<F>(&mut self, lookup: F) -> Result<(), Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("DROPSTONE_DATA_DIR") {
            self.paths.data_dir = Some(PathBuf::from(dir));
        }

        if let Some(dir) = lookup("DROPSTONE_DOWNLOADS_DIR") {
            self.paths.downloads_dir = Some(PathBuf::from(dir));
        }

        if let Some(ordering) = lookup("DROPSTONE_VERSION_ORDERING") {
            self.registry.version_ordering =
                ordering.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "DROPSTONE_VERSION_ORDERING".to_string(),
                    value: ordering,
                })?;
        }

        if let Some(limit) = lookup("DROPSTONE_MAX_UPLOAD_BYTES") {
            self.registry.max_upload_bytes =
                limit.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "DROPSTONE_MAX_UPLOAD_BYTES".to_string(),
                    value: limit,
                })?;
        }

        Ok(())
    }

    /// Get the snapshot directory (with default)
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.paths
            .data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(constants::DATA_DIR))
    }

    /// Get the stored-artifact directory (with default)
    #[must_use]
    pub fn downloads_dir(&self) -> PathBuf {
        self.paths
            .downloads_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(constants::DOWNLOADS_DIR))
    }

    /// Upload cap, `None` when unlimited
    #[must_use]
    pub fn upload_limit(&self) -> Option<u64> {
        match self.registry.max_upload_bytes {
            0 => None,
            n => Some(n),
        }
    }
}
