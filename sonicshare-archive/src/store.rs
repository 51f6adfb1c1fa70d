//! Archive store facade
//!
//! Owns the backing file's lifecycle. Every call works from the file itself;
//! no table is cached between operations.

use std::io::Write;
use std::path::{Path, PathBuf};

use sonicshare_common::config::{archive_path, ArchiveConfig};
use sonicshare_common::{time, Result};

use crate::lifecycle::{self, CleanOutcome, ResetOutcome};
use crate::reader::{ArchiveReader, LoadOutcome};
use crate::record::{Record, Submission};
use crate::writer::{AppendOutcome, ArchiveWriter};

/// Durable, schema-tolerant record store backed by one CSV file
#[derive(Debug, Clone)]
pub struct ArchiveStore {
    path: PathBuf,
    clean_columns: Vec<String>,
    export_name: String,
}

impl ArchiveStore {
    /// Store at `path` with default clean columns and export name
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let defaults = ArchiveConfig::default();
        Self {
            path: path.into(),
            clean_columns: defaults.clean_columns,
            export_name: defaults.export_name,
        }
    }

    /// Store configured from an `[archive]` section under `root_folder`
    pub fn from_config(root_folder: &Path, config: &ArchiveConfig) -> Self {
        Self {
            path: archive_path(root_folder, config),
            clean_columns: config.clean_columns.clone(),
            export_name: config.export_name.clone(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn clean_columns(&self) -> &[String] {
        &self.clean_columns
    }

    pub fn export_name(&self) -> &str {
        &self.export_name
    }

    pub fn append(&self, record: &Record) -> Result<AppendOutcome> {
        ArchiveWriter::new(&self.path).append(record)
    }

    /// Validate a submission, stamp it with the local time, and append it
    pub fn submit(&self, submission: Submission) -> Result<Record> {
        let record = submission.into_record(time::now())?;
        self.append(&record)?;
        Ok(record)
    }

    pub fn load(&self) -> Result<LoadOutcome> {
        ArchiveReader::new(&self.path).load()
    }

    pub fn reset(&self) -> Result<ResetOutcome> {
        lifecycle::reset(&self.path)
    }

    /// Project the file down to the configured clean columns
    pub fn clean(&self) -> Result<CleanOutcome> {
        lifecycle::clean(&self.path, &self.clean_columns)
    }

    pub fn export<W: Write>(&self, out: &mut W) -> Result<u64> {
        lifecycle::export(&self.path, out)
    }

    /// Export to `target`, or to the configured export name inside `dir`
    pub fn export_to(&self, target: Option<&Path>, dir: &Path) -> Result<(PathBuf, u64)> {
        let target = match target {
            Some(path) => path.to_path_buf(),
            None => dir.join(&self.export_name),
        };
        let bytes = lifecycle::export_to_file(&self.path, &target)?;
        Ok((target, bytes))
    }
}
