//! Registry validation and lookup error types

use std::borrow::Cow;

use crate::{ErrorKind, UserFacingError};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum RegistryError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("invalid external URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("version not found: {platform}/{quality}/{version}")]
    VersionNotFound {
        platform: String,
        quality: String,
        version: String,
    },

    #[error("no latest version for {platform}/{quality}")]
    LatestNotFound { platform: String, quality: String },

    #[error("download not found: {platform}/{quality}/{version}")]
    DownloadNotFound {
        platform: String,
        quality: String,
        version: String,
    },
}

impl RegistryError {
    /// Shorthand for a missing required field
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: "must not be empty".to_string(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } | Self::InvalidUrl { .. } => ErrorKind::Validation,
            Self::VersionNotFound { .. }
            | Self::LatestNotFound { .. }
            | Self::DownloadNotFound { .. } => ErrorKind::NotFound,
        }
    }
}

impl UserFacingError for RegistryError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Validation { .. } => {
                Some("Provide platform, quality, version and name, plus a file or an external URL.")
            }
            Self::InvalidUrl { .. } => Some("Use an absolute URL such as https://host/path/file.exe."),
            Self::VersionNotFound { .. } | Self::DownloadNotFound { .. } => {
                Some("Run `dropstone list` to see registered versions.")
            }
            Self::LatestNotFound { .. } => {
                Some("Register a build for this platform and quality first.")
            }
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::Validation { .. } => "registry.validation",
            Self::InvalidUrl { .. } => "registry.invalid_url",
            Self::VersionNotFound { .. } => "registry.version_not_found",
            Self::LatestNotFound { .. } => "registry.latest_not_found",
            Self::DownloadNotFound { .. } => "registry.download_not_found",
        };
        Some(code)
    }
}
