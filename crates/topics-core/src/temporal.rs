//! # Dates and Timestamps
//!
//! Topic metadata carries `created`/`updated` as free-form strings. Authored
//! content uses either a plain calendar date (`2024-03-01`) or a full RFC 3339
//! timestamp; [`parse_topic_date`] accepts both and yields the calendar date.
//!
//! Generated artifacts (lockfiles) use UTC timestamps truncated to seconds,
//! formatted as `YYYY-MM-DDTHH:MM:SSZ`.

use chrono::{DateTime, NaiveDate, Utc};

/// Format used for every generated timestamp.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Parse an authored `created`/`updated` value into a calendar date.
///
/// Returns `None` for anything that is neither `YYYY-MM-DD` nor RFC 3339.
pub fn parse_topic_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).date_naive())
}

/// Render a UTC instant as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

/// Timestamp for a Unix epoch second count, as used by `SOURCE_DATE_EPOCH`.
pub fn timestamp_from_epoch(epoch_secs: i64) -> Option<String> {
    DateTime::from_timestamp(epoch_secs, 0).map(format_timestamp)
}

/// The current UTC time, formatted.
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}
