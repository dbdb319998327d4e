//! Helpers that read facts out of an external download URL

use dropstone_errors::{Error, RegistryError};
use percent_encoding::percent_decode_str;
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Name used when a URL path has no usable last segment
const FALLBACK_NAME: &str = "external-file";

/// `major.minor.patch`, optionally preceded by `v`
static VERSION_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)v?(\d+\.\d+\.\d+)").ok());

/// Parse an external URL, insisting on an absolute, hierarchical URL
pub(crate) fn parse_external_url(raw: &str) -> Result<Url, Error> {
    let url = Url::parse(raw.trim()).map_err(|e| RegistryError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(RegistryError::InvalidUrl {
            url: raw.to_string(),
            reason: "not a hierarchical URL".to_string(),
        }
        .into());
    }
    Ok(url)
}

/// Display name for an externally hosted build
///
/// The percent-decoded last path segment, or `external-file` when the path
/// ends in a slash or is empty.
#[must_use]
pub fn original_name_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .map_or_else(|| FALLBACK_NAME.to_string(), percent_decode)
}

/// Guess a `major.minor.patch` version from a download URL
///
/// The URL is percent-decoded first, so `Dropstone%201.96.4.exe` yields
/// `1.96.4`. A leading `v` is accepted and dropped.
#[must_use]
pub fn infer_version_from_url(url: &str) -> Option<String> {
    let decoded = percent_decode(url);
    VERSION_PATTERN
        .as_ref()?
        .captures(&decoded)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Decode `%XX` escapes; malformed escapes are kept as written
fn percent_decode(input: &str) -> String {
    percent_decode_str(input).decode_utf8_lossy().into_owned()
}
