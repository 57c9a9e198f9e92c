//! Default output file names.
//!
//! A clipping is named after the issue it came from: the date in the
//! message's `Date` header when there is one, today's date otherwise.

use chrono::NaiveDate;
use tracing::debug;

/// Prefix for documents built from an inbox message.
pub const INBOX_PREFIX: &str = "The_Daily_Shot";

/// Prefix for documents built from an uploaded or downloaded file.
pub const UPLOAD_PREFIX: &str = "The_Daily_Shot_refined";

/// Characters of the `Date` header that hold weekday, day, month and year.
const DATE_HEADER_PREFIX_LEN: usize = 16;

/// Parse the calendar date out of an RFC 2822 `Date` header.
///
/// Only the leading `"Mon, 01 Jan 2024"` part is read; the time and zone are
/// ignored.
pub fn parse_header_date(header: &str) -> Option<NaiveDate> {
    let head: String = header.chars().take(DATE_HEADER_PREFIX_LEN).collect();
    NaiveDate::parse_from_str(head.trim(), "%a, %d %b %Y").ok()
}

/// `"{prefix}_{YYYY-MM-DD}.pdf"`, dated from `source_date` or else `today`.
pub fn default_filename(prefix: &str, source_date: Option<&str>, today: NaiveDate) -> String {
    let date = match source_date.and_then(parse_header_date) {
        Some(d) => d,
        None => {
            debug!("No usable date header ({:?}); using today", source_date);
            today
        }
    };
    format!("{}_{}.pdf", prefix, date.format("%Y-%m-%d"))
}
