//! Lifecycle operations: reset, clean, export
//!
//! `clean` is the only bulk rewrite of the backing file. It goes through a
//! temp file in the same directory and a rename, so a crash mid-clean leaves
//! either the old file or the new one.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use sonicshare_common::{Error, Result};
use tracing::{info, warn};

use crate::archive::Archive;
use crate::reader::{ArchiveReader, LoadOutcome};

/// Outcome of [`reset`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResetOutcome {
    Deleted,
    /// Nothing to delete; the archive was already gone
    AlreadyAbsent,
}

/// Delete the backing file; absence counts as success
pub fn reset(path: &Path) -> Result<ResetOutcome> {
    match fs::remove_file(path) {
        Ok(()) => {
            info!("Archive deleted: {}", path.display());
            Ok(ResetOutcome::Deleted)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!("Archive file was already missing: {}", path.display());
            Ok(ResetOutcome::AlreadyAbsent)
        }
        Err(e) => Err(e.into()),
    }
}

/// Summary of a successful clean
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanReport {
    pub kept_columns: Vec<String>,
    pub dropped_columns: Vec<String>,
    pub rows_written: usize,
    /// Malformed rows dropped by the lenient load
    pub rows_dropped: usize,
}

/// Outcome of [`clean`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CleanOutcome {
    Repaired(CleanReport),
    NotFound,
}

/// Rewrite the archive keeping only `targets ∩ on-disk columns`
///
/// Malformed rows are dropped. Refuses to rewrite when no target column is
/// present, leaving the file untouched.
pub fn clean<S: AsRef<str>>(path: &Path, targets: &[S]) -> Result<CleanOutcome> {
    let report = match ArchiveReader::new(path).load_lenient()? {
        LoadOutcome::Empty => {
            if path.exists() {
                // Zero-byte file: nothing to keep
                return Ok(CleanOutcome::Repaired(CleanReport {
                    kept_columns: Vec::new(),
                    dropped_columns: Vec::new(),
                    rows_written: 0,
                    rows_dropped: 0,
                }));
            }
            return Ok(CleanOutcome::NotFound);
        }
        LoadOutcome::Loaded(report) => report,
    };

    let projected = report.archive.project(targets);
    if projected.columns().is_empty() {
        return Err(Error::SchemaDrift(format!(
            "none of the target columns [{}] are present; archive left unchanged",
            targets.iter().map(|t| t.as_ref()).collect::<Vec<_>>().join(", ")
        )));
    }

    let dropped_columns: Vec<String> = report
        .archive
        .columns()
        .iter()
        .filter(|c| !projected.columns().contains(*c))
        .cloned()
        .collect();

    write_atomic(path, &projected)?;

    let clean_report = CleanReport {
        kept_columns: projected.columns().to_vec(),
        dropped_columns,
        rows_written: projected.len(),
        rows_dropped: report.skipped.len(),
    };
    info!(
        kept = clean_report.kept_columns.len(),
        dropped = ?clean_report.dropped_columns,
        rows = clean_report.rows_written,
        malformed = clean_report.rows_dropped,
        "Archive cleaned: {}",
        path.display()
    );
    Ok(CleanOutcome::Repaired(clean_report))
}

/// Write `archive` to `path` via temp file + rename
fn write_atomic(path: &Path, archive: &Archive) -> Result<()> {
    let temp_path = temp_path_for(path);
    let result = (|| -> Result<()> {
        let mut file = File::create(&temp_path)?;
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .terminator(csv::Terminator::Any(b'\n'))
                .from_writer(&mut file);
            writer.write_record(archive.columns())?;
            for row in archive.rows() {
                writer.write_record(row)?;
            }
            writer.flush()?;
        }
        file.sync_all()?;
        fs::rename(&temp_path, path)?;
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "archive.csv".into());
    name.push(".tmp");
    path.with_file_name(name)
}

fn open_archive(path: &Path) -> Result<File> {
    match File::open(path) {
        Ok(f) => Ok(f),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(Error::NotFound(format!("archive {}", path.display())))
        }
        Err(e) => Err(e.into()),
    }
}

/// Copy the backing file byte-for-byte into `out`
pub fn export<W: Write>(path: &Path, out: &mut W) -> Result<u64> {
    let mut file = open_archive(path)?;
    let copied = io::copy(&mut file, out)?;
    out.flush()?;
    Ok(copied)
}

/// Copy the backing file byte-for-byte to `target`
///
/// The target is only created once the archive is known to exist, and may not
/// be the archive itself.
pub fn export_to_file(path: &Path, target: &Path) -> Result<u64> {
    let mut source = open_archive(path)?;

    if target.exists() && fs::canonicalize(target)? == fs::canonicalize(path)? {
        return Err(Error::InvalidInput(format!(
            "export target {} is the archive itself",
            target.display()
        )));
    }

    let mut out = File::create(target)?;
    let copied = io::copy(&mut source, &mut out)?;
    out.sync_all()?;
    info!(bytes = copied, "Archive exported to {}", target.display());
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_reset_twice() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, "filename\na.wav\n").unwrap();

        assert_eq!(reset(&path).unwrap(), ResetOutcome::Deleted);
        assert!(!path.exists());
        assert_eq!(reset(&path).unwrap(), ResetOutcome::AlreadyAbsent);
    }

    #[test]
    fn test_clean_missing_file() {
        let dir = TempDir::new().unwrap();
        let outcome = clean(&dir.path().join("data.csv"), &["filename"]).unwrap();
        assert_eq!(outcome, CleanOutcome::NotFound);
    }

    #[test]
    fn test_clean_drops_extra_column_and_bad_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(
            &path,
            "filename,tags,source_url\na.wav,Dry,http://x\nbad.wav,Wet,x,y\nb.wav,Wet,\n",
        )
        .unwrap();

        let outcome = clean(&path, &["filename", "tags", "license"]).unwrap();
        let CleanOutcome::Repaired(report) = outcome else {
            panic!("expected repaired");
        };
        assert_eq!(report.kept_columns, vec!["filename", "tags"]);
        assert_eq!(report.dropped_columns, vec!["source_url"]);
        assert_eq!(report.rows_written, 2);
        assert_eq!(report.rows_dropped, 1);

        assert_eq!(fs::read_to_string(&path).unwrap(), "filename,tags\na.wav,Dry\nb.wav,Wet\n");
        assert!(!dir.path().join("data.csv.tmp").exists());
    }

    #[test]
    fn test_clean_with_no_target_columns_leaves_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        let original = "source_url\nhttp://x\n";
        fs::write(&path, original).unwrap();

        let result = clean(&path, &["filename"]);
        assert!(matches!(result, Err(Error::SchemaDrift(_))));
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_export_is_byte_for_byte() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        let content = "filename,custom_notes\r\na.wav,\"x, y\"\n";
        fs::write(&path, content).unwrap();

        let mut out = Vec::new();
        let copied = export(&path, &mut out).unwrap();
        assert_eq!(copied as usize, content.len());
        assert_eq!(out, content.as_bytes());
    }

    #[test]
    fn test_export_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let mut out = Vec::new();
        let err = export(&dir.path().join("data.csv"), &mut out).unwrap_err();
        assert!(err.is_absence());
    }

    #[test]
    fn test_export_to_file_copies_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, "filename\na.wav\n").unwrap();
        let target = dir.path().join("sonicshare_archive.csv");

        assert_eq!(export_to_file(&path, &target).unwrap(), 15);
        assert_eq!(fs::read(&target).unwrap(), fs::read(&path).unwrap());
    }

    #[test]
    fn test_export_to_file_without_archive_creates_nothing() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out.csv");

        let err = export_to_file(&dir.path().join("data.csv"), &target).unwrap_err();
        assert!(err.is_absence());
        assert!(!target.exists());
    }

    #[test]
    fn test_export_to_file_refuses_archive_itself() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, "filename\na.wav\n").unwrap();

        let err = export_to_file(&path, &dir.path().join(".").join("data.csv")).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), "filename\na.wav\n");
    }
}
