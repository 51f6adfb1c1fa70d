//! Materialized archive table
//!
//! An [`Archive`] is the on-disk header plus every surviving row as raw string
//! fields. Nothing is typed or reordered at this level, so rows written under
//! any historical schema load the same way.

use serde::Serialize;
use sonicshare_common::{Error, Result};

use crate::record::Record;
use crate::schema::{SchemaCheck, SchemaVersion};

/// Ordered rows under a single header
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Archive {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Archive {
    /// Build an archive; every row must match the header width
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns.len()) {
            return Err(Error::Internal(format!(
                "row {} has {} fields, header has {}",
                i,
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    /// Empty table with a header only
    pub fn with_columns(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column in the header
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value of `column` in row `row`, `None` if either is absent
    pub fn field(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx)).map(String::as_str)
    }

    /// Iterate over all values of one column (empty if the column is absent)
    pub fn column_values<'a>(&'a self, column: &str) -> impl Iterator<Item = &'a str> + 'a {
        let idx = self.column_index(column);
        self.rows
            .iter()
            .filter_map(move |r| idx.and_then(|i| r.get(i)).map(String::as_str))
    }

    /// Keep only rows for which `keep` returns true, preserving order
    pub fn filter_rows<F>(&self, mut keep: F) -> Archive
    where
        F: FnMut(&[String]) -> bool,
    {
        Archive {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Columns of `targets` present in this archive, in `targets` order
    pub fn intersect_columns<S: AsRef<str>>(&self, targets: &[S]) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for t in targets {
            let t = t.as_ref();
            if self.column_index(t).is_some() && !out.iter().any(|c| c == t) {
                out.push(t.to_string());
            }
        }
        out
    }

    /// Project down to `targets ∩ columns`, in `targets` order
    pub fn project<S: AsRef<str>>(&self, targets: &[S]) -> Archive {
        let keep = self.intersect_columns(targets);
        let indices: Vec<usize> = keep
            .iter()
            .filter_map(|c| self.column_index(c))
            .collect();

        let rows = self
            .rows
            .iter()
            .map(|r| indices.iter().map(|&i| r[i].clone()).collect())
            .collect();

        Archive {
            columns: keep,
            rows,
        }
    }

    /// Drift of this archive's header against the current schema
    pub fn schema_check(&self) -> SchemaCheck {
        SchemaCheck::against_current(&self.columns)
    }

    /// Current-schema columns in canonical order when all are present,
    /// otherwise the table unchanged
    pub fn current_view(&self) -> Archive {
        if self.schema_check().covers_expected() {
            self.project(SchemaVersion::CURRENT.columns())
        } else {
            self.clone()
        }
    }

    /// Typed records; requires every current-schema column
    pub fn records(&self) -> Result<Vec<Record>> {
        let check = self.schema_check();
        if !check.covers_expected() {
            return Err(Error::SchemaDrift(check.to_string()));
        }
        self.rows
            .iter()
            .map(|row| Record::from_row(&self.columns, row))
            .collect()
    }

    pub(crate) fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn sample() -> Archive {
        Archive::new(
            cols(&["filename", "tags", "source_url"]),
            vec![
                cols(&["a.wav", "Dry", "http://x"]),
                cols(&["b.wav", "Wet, Reverb", ""]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_current_view_reorders_superset_and_keeps_subset() {
        let superset = Archive::new(
            cols(&["timestamp", "license", "custom_notes", "prompt", "tags", "filename", "source_url"]),
            vec![cols(&["2025-01-01 12:00:00", "Free to use with credit", "", "", "Dry", "a.wav", "http://x"])],
        )
        .unwrap();
        let view = superset.current_view();
        assert_eq!(view.columns(), SchemaVersion::CURRENT.columns());
        assert_eq!(view.field(0, "filename"), Some("a.wav"));

        let legacy = sample();
        assert_eq!(legacy.current_view(), legacy);
    }

    #[test]
    fn test_new_rejects_ragged_rows() {
        let err = Archive::new(cols(&["a", "b"]), vec![cols(&["1"])]);
        assert!(err.is_err());
    }

    #[test]
    fn test_field_lookup() {
        let archive = sample();
        assert_eq!(archive.field(1, "tags"), Some("Wet, Reverb"));
        assert_eq!(archive.field(0, "license"), None);
        assert_eq!(archive.field(9, "tags"), None);
    }

    #[test]
    fn test_column_values_absent_column_is_empty() {
        let archive = sample();
        assert_eq!(archive.column_values("filename").collect::<Vec<_>>(), vec!["a.wav", "b.wav"]);
        assert_eq!(archive.column_values("license").count(), 0);
    }

    #[test]
    fn test_project_uses_target_order_and_drops_extras() {
        let archive = sample();
        let projected = archive.project(&["tags", "license", "filename"]);
        assert_eq!(projected.columns(), &["tags", "filename"]);
        assert_eq!(projected.rows()[0], cols(&["Dry", "a.wav"]));
        assert_eq!(projected.len(), 2);
    }

    #[test]
    fn test_records_require_current_columns() {
        let err = sample().records().unwrap_err();
        assert!(matches!(err, Error::SchemaDrift(_)));
    }

    #[test]
    fn test_filter_rows_preserves_order() {
        let archive = sample();
        let kept = archive.filter_rows(|r| r[0].ends_with(".wav"));
        assert_eq!(kept, archive);
        let none = archive.filter_rows(|_| false);
        assert!(none.is_empty());
        assert_eq!(none.columns(), archive.columns());
    }
}
