//! Conversions between Slack message timestamps and instants.
//!
//! Slack identifies messages by a `ts` string of the form
//! `"1716192523.567890"` (seconds and microseconds). Permalinks carry the same
//! value without the dot (`p1716192523567890`).

use chrono::{DateTime, TimeZone, Utc};

/// Length of the microsecond suffix of a compact timestamp.
const MICROS_DIGITS: usize = 6;

/// Convert a timestamp to the canonical `seconds.microseconds` form.
///
/// Values already containing a `.` and values too short to split are
/// returned unchanged.
pub fn normalize_ts(raw: &str) -> String {
    if raw.contains('.') || raw.len() <= MICROS_DIGITS {
        return raw.to_string();
    }

    match raw.split_at_checked(raw.len() - MICROS_DIGITS) {
        Some((secs, micros)) => format!("{}.{}", secs, micros),
        None => raw.to_string(),
    }
}

/// Decode the seconds part of a Slack ts into an instant.
///
/// The fractional part is dropped. Malformed input decodes to the Unix epoch.
pub fn ts_to_datetime(ts: &str) -> DateTime<Utc> {
    let secs: i64 = ts
        .split('.')
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    Utc.timestamp_opt(secs, 0)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}
