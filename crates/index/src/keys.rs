//! Stable string keys for the persisted tables
//!
//! A key joins its components with `/`. Each component is percent-encoded
//! first (`%`, `/`, control characters and non-ASCII bytes), so the
//! separator never occurs inside a component and a key can be split back
//! without ambiguity. Only the canonical encoding decodes.
//!
//! Download keys live in their own namespace: they carry a `download:`
//! tag, so a version key can never be mistaken for a download key.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use std::borrow::Cow;

/// Separator between key components
pub const SEPARATOR: char = '/';

const DOWNLOAD_TAG: &str = "download:";

/// Bytes escaped inside a key component
const COMPONENT: &AsciiSet = &CONTROLS.add(b'%').add(b'/');

fn escape(component: &str) -> Cow<'_, str> {
    utf8_percent_encode(component, COMPONENT).into()
}

fn unescape(component: &str) -> Option<String> {
    let decoded = percent_decode_str(component).decode_utf8().ok()?;
    // "%zz" or "%2f" decode to something that encodes differently
    (escape(&decoded) == component).then(|| decoded.into_owned())
}

fn join(components: &[&str]) -> String {
    let mut key = String::new();
    for (i, component) in components.iter().enumerate() {
        if i > 0 {
            key.push(SEPARATOR);
        }
        key.push_str(&escape(component));
    }
    key
}

fn split<const N: usize>(key: &str) -> Option<[String; N]> {
    let parts: Vec<String> = key
        .split(SEPARATOR)
        .map(unescape)
        .collect::<Option<_>>()?;
    parts.try_into().ok()
}

/// Key of a version record
#[must_use]
pub fn version_key(platform: &str, quality: &str, version: &str) -> String {
    join(&[platform, quality, version])
}

/// Key of the latest pointer for a platform/quality channel
#[must_use]
pub fn latest_key(platform: &str, quality: &str) -> String {
    join(&[platform, quality])
}

/// Key of a download record
#[must_use]
pub fn download_key(platform: &str, quality: &str, version: &str) -> String {
    format!("{DOWNLOAD_TAG}{}", version_key(platform, quality, version))
}

/// Prefix shared by every version key of a channel, and by nothing else
#[must_use]
pub fn channel_prefix(platform: &str, quality: &str) -> String {
    let mut prefix = latest_key(platform, quality);
    prefix.push(SEPARATOR);
    prefix
}

/// Decoded components of a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyParts {
    pub platform: String,
    pub quality: String,
    pub version: Option<String>,
}

/// Split a version key back into platform, quality and version
#[must_use]
pub fn decode_version_key(key: &str) -> Option<KeyParts> {
    let [platform, quality, version] = split::<3>(key)?;
    Some(KeyParts {
        platform,
        quality,
        version: Some(version),
    })
}

/// Split a latest key back into platform and quality
#[must_use]
pub fn decode_latest_key(key: &str) -> Option<KeyParts> {
    let [platform, quality] = split::<2>(key)?;
    Some(KeyParts {
        platform,
        quality,
        version: None,
    })
}

/// Turn a key into a string safe to use as a single file name
#[must_use]
pub fn file_stem(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '-',
        })
        .collect::<String>()
        .trim_start_matches('.')
        .to_string()
}
