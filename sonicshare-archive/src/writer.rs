//! Archive writer: append one record at a time
//!
//! New archives start with the current schema header. Existing archives are
//! appended to as-is; their header is never rewritten or re-validated here,
//! which is how files started under an older schema stay heterogeneous until
//! `clean` runs.
//!
//! There is no locking. One logical writer per process is assumed.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use sonicshare_common::Result;
use tracing::{debug, info};

use crate::record::{current_header, Record};

/// What an append did to the backing file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// File was absent, empty or blank; header written before the record
    Created,
    /// Record appended under the existing header
    Appended,
}

/// Appends records to the backing CSV file
#[derive(Debug, Clone)]
pub struct ArchiveWriter {
    path: PathBuf,
}

impl ArchiveWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the containing directory if missing (idempotent)
    pub fn ensure_ready(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
                info!("Created archive directory {}", parent.display());
            }
        }
        Ok(())
    }

    /// Append one record, bootstrapping the header on first write
    pub fn append(&self, record: &Record) -> Result<AppendOutcome> {
        self.ensure_ready()?;

        // Absent, empty and whitespace-only files all start over with a header
        let needs_header = !has_content(&self.path)?;
        let needs_newline = !needs_header && !ends_with_newline(&self.path)?;

        let mut file = if needs_header {
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&self.path)?
        } else {
            OpenOptions::new().append(true).open(&self.path)?
        };

        if needs_newline {
            debug!("Archive did not end with a newline; terminating last line");
            file.write_all(b"\n")?;
        }

        {
            let mut csv_writer = csv::WriterBuilder::new()
                .has_headers(false)
                .terminator(csv::Terminator::Any(b'\n'))
                .from_writer(&mut file);

            if needs_header {
                csv_writer.write_record(current_header())?;
            }
            csv_writer.write_record(record.to_row())?;
            csv_writer.flush()?;
        }
        file.sync_data()?;

        let outcome = if needs_header {
            AppendOutcome::Created
        } else {
            AppendOutcome::Appended
        };
        info!(
            filename = %record.filename,
            path = %self.path.display(),
            "Record saved to archive ({:?})",
            outcome
        );
        Ok(outcome)
    }
}

/// True once any non-whitespace byte is found
fn has_content(path: &Path) -> Result<bool> {
    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    };
    let mut buf = [0u8; 4096];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            return Ok(false);
        }
        if buf[..n].iter().any(|b| !b.is_ascii_whitespace()) {
            return Ok(true);
        }
    }
}

fn ends_with_newline(path: &Path) -> Result<bool> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
