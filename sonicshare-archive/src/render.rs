//! Plain-text rendering of archive tables and tag counts

use crate::archive::Archive;
use crate::query::TagCount;

/// Widest a rendered cell may be before it is truncated
pub const MAX_CELL_WIDTH: usize = 40;

fn cell(value: &str, max: usize) -> String {
    let flat: String = value
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    if flat.chars().count() <= max {
        flat
    } else {
        let mut cut: String = flat.chars().take(max.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

fn pad(value: &str, width: usize) -> String {
    let len = value.chars().count();
    format!("{}{}", value, " ".repeat(width.saturating_sub(len)))
}

/// Render an archive as an aligned text table
pub fn render_table(archive: &Archive) -> String {
    let header: Vec<String> = archive
        .columns()
        .iter()
        .map(|c| cell(c, MAX_CELL_WIDTH))
        .collect();
    let rows: Vec<Vec<String>> = archive
        .rows()
        .iter()
        .map(|r| r.iter().map(|v| cell(v, MAX_CELL_WIDTH)).collect())
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (w, v) in widths.iter_mut().zip(row) {
            *w = (*w).max(v.chars().count());
        }
    }

    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| pad(c, *w))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&line(&header));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    out.push('\n');
    for row in &rows {
        out.push_str(&line(row));
        out.push('\n');
    }
    out
}

/// Render tag counts, most frequent first
pub fn render_tag_counts(counts: &[TagCount]) -> String {
    let width = counts.iter().map(|t| t.tag.chars().count()).max().unwrap_or(0);
    counts
        .iter()
        .map(|t| format!("{} {}\n", pad(&t.tag, width), t.count))
        .collect()
}
