//! Ordering rules for version strings
//!
//! Version strings are loosely structured dot-delimited identifiers. The
//! registry has always ranked them by plain string comparison, which puts
//! `"10.0.0"` before `"9.0.0"`. That ordering stays the default so an
//! existing data directory keeps advertising the same latest builds;
//! [`VersionOrdering::Numeric`] compares dot-separated segments as numbers
//! and is opt-in through configuration.

use dropstone_errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Comparator used to decide which version is "latest"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionOrdering {
    /// Byte-wise string comparison
    #[default]
    Lexicographic,
    /// Segment-wise comparison; numeric segments compare as integers
    Numeric,
}

impl VersionOrdering {
    #[must_use]
    pub fn compare(self, a: &str, b: &str) -> Ordering {
        match self {
            Self::Lexicographic => a.cmp(b),
            Self::Numeric => compare_numeric(a, b),
        }
    }

    /// True when `candidate` should replace `current` as latest
    #[must_use]
    pub fn is_newer(self, candidate: &str, current: &str) -> bool {
        self.compare(candidate, current) == Ordering::Greater
    }
}

fn compare_numeric(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y),
                    // a numeric segment outranks a tag like "beta"
                    (Ok(_), Err(_)) => Ordering::Greater,
                    (Err(_), Ok(_)) => Ordering::Less,
                    (Err(_), Err(_)) => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

impl fmt::Display for VersionOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lexicographic => f.write_str("lexicographic"),
            Self::Numeric => f.write_str("numeric"),
        }
    }
}

impl FromStr for VersionOrdering {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lexicographic" | "lexical" | "string" => Ok(Self::Lexicographic),
            "numeric" | "semver" => Ok(Self::Numeric),
            _ => Err(ConfigError::InvalidValue {
                field: "version_ordering".to_string(),
                value: s.to_string(),
            }),
        }
    }
}
