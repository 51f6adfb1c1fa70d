//! Archive record model
//!
//! A [`Record`] is one submitted audio sample. [`Submission`] is the raw
//! candidate handed over by the upload side; turning it into a record
//! validates it, joins tags, builds the prompt and stamps the local time.

use chrono::NaiveDateTime;
use serde::Serialize;
use sonicshare_common::time::{format_timestamp, parse_timestamp};
use sonicshare_common::{Error, Result};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

use crate::prompt::{generate_prompt, is_vibe_tag};
use crate::schema::{self, SchemaVersion};

/// Delimiter used to join tags into the `tags` column
pub const TAG_DELIMITER: &str = ", ";

/// Licensing choice attached to a sample (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum License {
    #[default]
    ContactBeforeUse,
    FreeWithCredit,
    CreativeCommonsNonCommercial,
    CommercialUseAllowed,
}

impl License {
    pub const ALL: [License; 4] = [
        License::ContactBeforeUse,
        License::FreeWithCredit,
        License::CreativeCommonsNonCommercial,
        License::CommercialUseAllowed,
    ];

    /// Label stored in the archive
    pub fn label(self) -> &'static str {
        match self {
            License::ContactBeforeUse => "Contact me before use (default)",
            License::FreeWithCredit => "Free to use with credit",
            License::CreativeCommonsNonCommercial => "Creative Commons (non-commercial)",
            License::CommercialUseAllowed => "Commercial use allowed",
        }
    }

    /// Short identifier accepted on the command line
    pub fn id(self) -> &'static str {
        match self {
            License::ContactBeforeUse => "contact",
            License::FreeWithCredit => "credit",
            License::CreativeCommonsNonCommercial => "cc-nc",
            License::CommercialUseAllowed => "commercial",
        }
    }
}

impl fmt::Display for License {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for License {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim();
        if needle.eq_ignore_ascii_case("contact before use") {
            return Ok(License::ContactBeforeUse);
        }
        License::ALL
            .into_iter()
            .find(|l| needle.eq_ignore_ascii_case(l.label()) || needle.eq_ignore_ascii_case(l.id()))
            .ok_or_else(|| Error::InvalidInput(format!("Unknown license: '{}'", s)))
    }
}

/// Accepted upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Mp3,
    Aiff,
}

impl AudioFormat {
    /// Detect format from a file name's extension (case-insensitive)
    pub fn from_filename(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "wav" => Some(AudioFormat::Wav),
            "mp3" => Some(AudioFormat::Mp3),
            "aiff" => Some(AudioFormat::Aiff),
            _ => None,
        }
    }
}

/// One archive row in the current schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub filename: String,
    /// Tags joined with [`TAG_DELIMITER`], in selection order
    pub tags: String,
    pub prompt: String,
    pub custom_notes: String,
    pub license: License,
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: NaiveDateTime,
}

fn serialize_timestamp<S: serde::Serializer>(
    ts: &NaiveDateTime,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(ts))
}

impl Record {
    /// Field values in current-schema column order
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.filename.clone(),
            self.tags.clone(),
            self.prompt.clone(),
            self.custom_notes.clone(),
            self.license.label().to_string(),
            format_timestamp(&self.timestamp),
        ]
    }

    /// Build a record from a row, looking fields up by column name
    ///
    /// Every current-schema column must be present in `columns`.
    pub fn from_row(columns: &[String], row: &[String]) -> Result<Self> {
        let field = |name: &str| lookup(columns, row, name);

        let raw_ts = field(schema::TIMESTAMP)?;
        let timestamp = parse_timestamp(raw_ts)
            .ok_or_else(|| Error::InvalidInput(format!("Bad timestamp: '{}'", raw_ts)))?;

        Ok(Self {
            filename: field(schema::FILENAME)?.to_string(),
            tags: field(schema::TAGS)?.to_string(),
            prompt: field(schema::PROMPT)?.to_string(),
            custom_notes: field(schema::CUSTOM_NOTES)?.to_string(),
            license: field(schema::LICENSE)?.parse()?,
            timestamp,
        })
    }

    /// Individual tag tokens
    pub fn tag_list(&self) -> Vec<&str> {
        split_tags(&self.tags).collect()
    }
}

fn lookup<'a>(columns: &[String], row: &'a [String], name: &str) -> Result<&'a str> {
    columns
        .iter()
        .position(|c| c == name)
        .and_then(|i| row.get(i))
        .map(String::as_str)
        .ok_or_else(|| Error::SchemaDrift(format!("column '{}' not present", name)))
}

/// Split a stored `tags` field into trimmed, non-empty tokens
pub fn split_tags(tags: &str) -> impl Iterator<Item = &str> {
    tags.split(TAG_DELIMITER).map(str::trim).filter(|t| !t.is_empty())
}

/// Upload candidate supplied by the upload side
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submission {
    pub filename: String,
    pub tags: Vec<String>,
    pub custom_notes: String,
    pub license: License,
}

impl Submission {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            ..Self::default()
        }
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.custom_notes = notes.into();
        self
    }

    pub fn license(mut self, license: License) -> Self {
        self.license = license;
        self
    }

    /// Validate and return the cleaned tag list (trimmed, first occurrence wins)
    fn validated_tags(&self) -> Result<Vec<String>> {
        let mut tags: Vec<String> = Vec::with_capacity(self.tags.len());
        for raw in &self.tags {
            let tag = raw.trim();
            if tag.is_empty() {
                return Err(Error::InvalidInput("Empty tag".to_string()));
            }
            if tag.contains(',') {
                return Err(Error::InvalidInput(format!(
                    "Tag '{}' must not contain a comma",
                    tag
                )));
            }
            if tags.iter().any(|t| t == tag) {
                continue;
            }
            if !is_vibe_tag(tag) {
                warn!("Tag '{}' is not in the vibe vocabulary", tag);
            }
            tags.push(tag.to_string());
        }
        Ok(tags)
    }

    /// Convert into a record stamped with `timestamp`
    pub fn into_record(self, timestamp: NaiveDateTime) -> Result<Record> {
        let filename = self.filename.trim();
        if filename.is_empty() {
            return Err(Error::InvalidInput("Filename is empty".to_string()));
        }
        if AudioFormat::from_filename(filename).is_none() {
            return Err(Error::InvalidInput(format!(
                "'{}' is not a wav, mp3 or aiff file",
                filename
            )));
        }

        let tags = self.validated_tags()?;

        Ok(Record {
            filename: filename.to_string(),
            tags: tags.join(TAG_DELIMITER),
            prompt: generate_prompt(&tags),
            custom_notes: self.custom_notes,
            license: self.license,
            timestamp,
        })
    }
}

/// Header written for new archives
pub fn current_header() -> Vec<String> {
    SchemaVersion::CURRENT.column_names()
}
