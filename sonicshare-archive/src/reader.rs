//! Archive reader: tolerant load of the backing file
//!
//! Loading tries a strict parse first (every row as wide as the header). A
//! field-count mismatch, typically a note with an unescaped comma, falls back
//! to a lenient parse that drops the offending rows and reports each one. If
//! even the lenient parse cannot produce a table the load fails with
//! [`Error::Malformed`] and the caller must not render a partial table.
//!
//! The reader never drops or reorders columns. Drift against the current
//! schema is reported alongside the table and the caller chooses the view.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use csv::{ByteRecord, ReaderBuilder, StringRecord};
use serde::Serialize;
use sonicshare_common::{Error, Result};
use tracing::{debug, warn};

use crate::archive::Archive;
use crate::schema::{SchemaCheck, SchemaVersion};

/// Which parser produced the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseMode {
    Strict,
    Lenient,
}

/// Why a row was dropped by the lenient parser
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    FieldCount { found: usize, expected: usize },
    InvalidUtf8,
}

/// A row dropped by the lenient parser
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    /// 1-based line number where the row starts
    pub line: u64,
    pub reason: SkipReason,
}

/// Successful load
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub archive: Archive,
    pub mode: ParseMode,
    pub skipped: Vec<SkippedRow>,
    /// Drift of the on-disk header against the current schema
    pub schema: SchemaCheck,
}

impl LoadReport {
    fn new(archive: Archive, mode: ParseMode, skipped: Vec<SkippedRow>) -> Self {
        let schema = archive.schema_check();
        Self {
            archive,
            mode,
            skipped,
            schema,
        }
    }

    pub fn has_skipped_rows(&self) -> bool {
        !self.skipped.is_empty()
    }

    /// On-disk columns differ from the current schema
    pub fn schema_mismatch(&self) -> bool {
        !self.schema.is_match()
    }

    /// Table to display: current-schema columns when all are present,
    /// otherwise the raw table
    pub fn view(&self) -> Archive {
        self.archive.current_view()
    }
}

/// Result of a load
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    /// No archive yet (file absent, empty or blank)
    Empty,
    Loaded(LoadReport),
}

impl LoadOutcome {
    pub fn report(&self) -> Option<&LoadReport> {
        match self {
            LoadOutcome::Empty => None,
            LoadOutcome::Loaded(report) => Some(report),
        }
    }

    /// Archive rows, or an empty table for [`LoadOutcome::Empty`]
    pub fn into_archive(self) -> Archive {
        match self {
            LoadOutcome::Empty => Archive::with_columns(SchemaVersion::CURRENT.column_names()),
            LoadOutcome::Loaded(report) => report.archive,
        }
    }
}

/// Reads the backing CSV file
#[derive(Debug, Clone)]
pub struct ArchiveReader {
    path: PathBuf,
}

impl ArchiveReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Strict parse, falling back to lenient on failure
    pub fn load(&self) -> Result<LoadOutcome> {
        let Some(bytes) = self.read_bytes()? else {
            return Ok(LoadOutcome::Empty);
        };

        let outcome = match parse_strict(&bytes) {
            Ok(archive) => {
                debug!("Loaded {} rows (strict) from {}", archive.len(), self.path.display());
                LoadOutcome::Loaded(LoadReport::new(archive, ParseMode::Strict, Vec::new()))
            }
            Err(e) => {
                debug!("Strict parse failed ({}), retrying leniently", e);
                self.finish_lenient(&bytes)?
            }
        };

        if let Some(report) = outcome.report().filter(|r| r.schema_mismatch()) {
            warn!("Schema drift in {}: {}", self.path.display(), report.schema);
        }
        Ok(outcome)
    }

    /// Lenient parse only
    pub fn load_lenient(&self) -> Result<LoadOutcome> {
        match self.read_bytes()? {
            None => Ok(LoadOutcome::Empty),
            Some(bytes) => self.finish_lenient(&bytes),
        }
    }

    fn finish_lenient(&self, bytes: &[u8]) -> Result<LoadOutcome> {
        let (archive, skipped) = parse_lenient(bytes)?;
        if !skipped.is_empty() {
            warn!(
                "Loaded {} rows from {} with {} malformed row(s) skipped",
                archive.len(),
                self.path.display(),
                skipped.len()
            );
        }
        Ok(LoadOutcome::Loaded(LoadReport::new(archive, ParseMode::Lenient, skipped)))
    }

    fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(None),
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn header_columns(header: &StringRecord) -> Result<Vec<String>> {
    if header.is_empty() {
        return Err(Error::Malformed("no header row".to_string()));
    }
    let mut seen = HashSet::new();
    let mut columns = Vec::with_capacity(header.len());
    for name in header.iter() {
        let name = name.trim();
        if !seen.insert(name.to_string()) {
            return Err(Error::Malformed(format!("duplicate column '{}'", name)));
        }
        columns.push(name.to_string());
    }
    Ok(columns)
}

fn parse_strict(bytes: &[u8]) -> Result<Archive> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(bytes);

    let columns = header_columns(rdr.headers()?)?;
    let mut archive = Archive::with_columns(columns);
    for result in rdr.records() {
        let record = result?;
        archive.push_row(record.iter().map(str::to_string).collect());
    }
    Ok(archive)
}

fn parse_lenient(bytes: &[u8]) -> Result<(Archive, Vec<SkippedRow>)> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let header = rdr
        .headers()
        .map_err(|e| Error::Malformed(format!("unreadable header: {}", e)))?
        .clone();
    let columns = header_columns(&header)?;
    let width = columns.len();

    let mut archive = Archive::with_columns(columns);
    let mut skipped = Vec::new();
    let mut raw = ByteRecord::new();

    loop {
        match rdr.read_byte_record(&mut raw) {
            Ok(false) => break,
            Ok(true) => {}
            Err(e) => return Err(Error::Malformed(e.to_string())),
        }

        let line = raw.position().map(|p| p.line()).unwrap_or(0);
        if raw.len() != width {
            skipped.push(SkippedRow {
                line,
                reason: SkipReason::FieldCount {
                    found: raw.len(),
                    expected: width,
                },
            });
            continue;
        }

        match StringRecord::from_byte_record(raw.clone()) {
            Ok(record) => archive.push_row(record.iter().map(str::to_string).collect()),
            Err(_) => skipped.push(SkippedRow {
                line,
                reason: SkipReason::InvalidUtf8,
            }),
        }
    }

    Ok((archive, skipped))
}
