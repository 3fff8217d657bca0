//! Date helper functions

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a timestamp for an RSS `pubDate` (RFC 822 date-time, GMT)
///
/// # Examples
/// ```ignore
/// pub_date(&date) // -> "Mon, 15 Jan 2024 10:30:00 GMT"
/// ```
pub fn pub_date(date: &DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Format a timestamp in ISO 8601 / RFC 3339 form
pub fn date_xml(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}
