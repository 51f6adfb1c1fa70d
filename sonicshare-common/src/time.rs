//! Timestamp utilities
//!
//! Archive rows carry a local wall-clock timestamp in a fixed
//! `YYYY-MM-DD HH:MM:SS` layout.

use chrono::{Local, NaiveDateTime};

/// Layout used for the archive `timestamp` column
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Get current local timestamp (seconds precision)
pub fn now() -> NaiveDateTime {
    let local = Local::now().naive_local();
    // Drop sub-second precision so format/parse is lossless
    parse_timestamp(&format_timestamp(&local)).unwrap_or(local)
}

/// Format a timestamp for storage
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp, `None` if it does not follow [`TIMESTAMP_FORMAT`]
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT).ok()
}
