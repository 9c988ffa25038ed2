//! Response body exclusion by path substring.
//!
//! # Design Decisions
//! - Literal, case-sensitive substring match (no glob, no regex)
//! - Order of entries is preserved from configuration but does not affect the result
//! - Read-only after construction; safe to share across requests

use serde::{Deserialize, Serialize};

/// Returns true if `path` contains any of `substrings`.
pub fn should_exclude_response_body(path: &str, substrings: &[String]) -> bool {
    substrings.iter().any(|s| path.contains(s.as_str()))
}

/// Ordered set of path substrings whose response bodies are never logged.
///
/// Deserializes from a plain list of strings, dropping duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ExclusionSet {
    entries: Vec<String>,
}

impl ExclusionSet {
    /// Create a set from the given substrings, dropping duplicates.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self { entries: Vec::new() };
        for entry in entries {
            let entry = entry.into();
            if !set.entries.contains(&entry) {
                set.entries.push(entry);
            }
        }
        set
    }

    /// Whether the response body for `path` should be left out of the log.
    pub fn excludes(&self, path: &str) -> bool {
        should_exclude_response_body(path, &self.entries)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<String>> for ExclusionSet {
    fn from(entries: Vec<String>) -> Self {
        Self::new(entries)
    }
}

impl From<ExclusionSet> for Vec<String> {
    fn from(set: ExclusionSet) -> Self {
        set.entries
    }
}

impl Default for ExclusionSet {
    /// Static-asset-like paths.
    fn default() -> Self {
        Self::new([
            "css",
            "font",
            "js",
            "assets",
            "icons",
            "img",
            "images",
            "script",
            "favicon.ico",
            "swagger",
        ])
    }
}
