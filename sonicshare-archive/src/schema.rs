//! Archive schema versions and drift detection
//!
//! The archive header has changed over the project's lifetime and old files
//! keep whatever header they were started with. Instead of assuming one fixed
//! record shape, the known column sets are enumerated here and the on-disk
//! header is compared against whichever list an operation expects.
//!
//! | version | columns |
//! |---|---|
//! | `V1` | filename, tags, prompt, timestamp |
//! | `V2` | filename, tags, prompt, source_url, custom_notes, license |
//! | `V3` | filename, tags, prompt, custom_notes, license, timestamp |

use serde::Serialize;
use std::fmt;

pub const FILENAME: &str = "filename";
pub const TAGS: &str = "tags";
pub const PROMPT: &str = "prompt";
pub const CUSTOM_NOTES: &str = "custom_notes";
pub const LICENSE: &str = "license";
pub const TIMESTAMP: &str = "timestamp";
pub const SOURCE_URL: &str = "source_url";

/// Known archive header layouts, oldest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SchemaVersion {
    /// Initial layout: no notes or licensing
    V1,
    /// Intermediate layout with `source_url`, no timestamp
    V2,
    /// Current layout
    V3,
}

impl SchemaVersion {
    pub const ALL: [SchemaVersion; 3] = [SchemaVersion::V1, SchemaVersion::V2, SchemaVersion::V3];

    /// Schema new rows are written with
    pub const CURRENT: SchemaVersion = SchemaVersion::V3;

    /// Ordered column names of this layout
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            SchemaVersion::V1 => &[FILENAME, TAGS, PROMPT, TIMESTAMP],
            SchemaVersion::V2 => &[FILENAME, TAGS, PROMPT, SOURCE_URL, CUSTOM_NOTES, LICENSE],
            SchemaVersion::V3 => &[FILENAME, TAGS, PROMPT, CUSTOM_NOTES, LICENSE, TIMESTAMP],
        }
    }

    /// Owned copy of [`Self::columns`]
    pub fn column_names(self) -> Vec<String> {
        self.columns().iter().map(|c| c.to_string()).collect()
    }

    /// Identify a header that exactly matches a known layout
    pub fn detect<S: AsRef<str>>(header: &[S]) -> Option<SchemaVersion> {
        Self::ALL.into_iter().find(|v| {
            let cols = v.columns();
            cols.len() == header.len() && cols.iter().zip(header).all(|(a, b)| *a == b.as_ref())
        })
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SchemaVersion::V1 => "v1",
            SchemaVersion::V2 => "v2",
            SchemaVersion::V3 => "v3",
        };
        f.write_str(s)
    }
}

/// Drift between an on-disk header and an expected column list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaCheck {
    /// Exact historical layout of the on-disk header, if any
    pub detected: Option<SchemaVersion>,
    /// Expected columns absent from disk
    pub missing: Vec<String>,
    /// On-disk columns not in the expected list
    pub unexpected: Vec<String>,
    /// Same column set, different order
    pub reordered: bool,
}

impl SchemaCheck {
    /// Compare actual columns to expected columns
    pub fn compare<A: AsRef<str>, E: AsRef<str>>(actual: &[A], expected: &[E]) -> Self {
        let missing: Vec<String> = expected
            .iter()
            .map(|c| c.as_ref())
            .filter(|e| !actual.iter().any(|a| a.as_ref() == *e))
            .map(str::to_string)
            .collect();

        let unexpected: Vec<String> = actual
            .iter()
            .map(|c| c.as_ref())
            .filter(|a| !expected.iter().any(|e| e.as_ref() == *a))
            .map(str::to_string)
            .collect();

        let reordered = missing.is_empty()
            && unexpected.is_empty()
            && !actual.iter().zip(expected).all(|(a, e)| a.as_ref() == e.as_ref());

        Self {
            detected: SchemaVersion::detect(actual),
            missing,
            unexpected,
            reordered,
        }
    }

    /// Compare actual columns to the current schema
    pub fn against_current<A: AsRef<str>>(actual: &[A]) -> Self {
        Self::compare(actual, SchemaVersion::CURRENT.columns())
    }

    /// Header is exactly the expected list
    pub fn is_match(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty() && !self.reordered
    }

    /// Every expected column is present (extra or reordered columns allowed)
    pub fn covers_expected(&self) -> bool {
        self.missing.is_empty()
    }
}

impl fmt::Display for SchemaCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_match() {
            return f.write_str("columns match");
        }
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!("missing [{}]", self.missing.join(", ")));
        }
        if !self.unexpected.is_empty() {
            parts.push(format!("unexpected [{}]", self.unexpected.join(", ")));
        }
        if self.reordered {
            parts.push("column order differs".to_string());
        }
        if let Some(v) = self.detected {
            parts.push(format!("header matches schema {}", v));
        }
        f.write_str(&parts.join("; "))
    }
}
