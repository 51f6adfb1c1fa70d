//! Query layer: free-text search and tag statistics
//!
//! Both operations are linear scans over a freshly loaded [`Archive`]; nothing
//! is indexed or cached between calls.

use std::collections::HashMap;

use serde::Serialize;

use crate::archive::Archive;
use crate::record::split_tags;
use crate::schema;

/// Outcome of [`search`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SearchResult {
    /// The archive has no rows at all
    EmptyArchive,
    /// Rows exist but none matched the term
    NoMatches,
    /// Matching rows in file order (every row for an empty term)
    Matches(Archive),
}

impl SearchResult {
    pub fn archive(&self) -> Option<&Archive> {
        match self {
            SearchResult::Matches(archive) => Some(archive),
            _ => None,
        }
    }

    pub fn match_count(&self) -> usize {
        self.archive().map_or(0, Archive::len)
    }
}

/// Case-insensitive substring search across every field of every row
///
/// An empty term returns the full archive. Whitespace is part of the term.
pub fn search(archive: &Archive, term: &str) -> SearchResult {
    if archive.is_empty() {
        return SearchResult::EmptyArchive;
    }

    if term.is_empty() {
        return SearchResult::Matches(archive.clone());
    }
    let needle = term.to_lowercase();

    let hits = archive.filter_rows(|row| {
        row.iter()
            .any(|field| field.to_lowercase().contains(&needle))
    });

    if hits.is_empty() {
        SearchResult::NoMatches
    } else {
        SearchResult::Matches(hits)
    }
}

/// One tag and how many rows carry it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// Count tag occurrences across the `tags` column, most frequent first
///
/// Ties keep the order in which tags were first seen. Rows with an empty
/// `tags` field, or archives without the column, contribute nothing.
pub fn tag_frequency(archive: &Archive) -> Vec<TagCount> {
    let mut counts: Vec<TagCount> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for tags in archive.column_values(schema::TAGS) {
        for tag in split_tags(tags) {
            match index.get(tag).copied() {
                Some(i) => counts[i].count += 1,
                None => {
                    index.insert(tag.to_string(), counts.len());
                    counts.push(TagCount {
                        tag: tag.to_string(),
                        count: 1,
                    });
                }
            }
        }
    }

    // Stable sort keeps first-seen order among equal counts
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}
