//! Birth-date codec for the upstream `yyyy-MM-ddTHH:mm:ss.SSSZ` timestamps.
//!
//! Parsing is anchored to UTC so the calendar date never drifts with the
//! local time zone of the machine doing the decoding.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{DecodeError, DecodeResult};

const LOCAL_PART: &str = "%Y-%m-%dT%H:%M:%S%.3f";
const WITH_OFFSET: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// Parses `2023-09-15T12:34:56.789Z`, `...789+0200` or `...789+02:00`.
pub fn parse_timestamp(raw: &str) -> DecodeResult<DateTime<Utc>> {
    let malformed = || DecodeError::MalformedDate(raw.to_string());

    // Date, time and milliseconds are fixed width.
    if raw.len() < 24 || raw.as_bytes().get(19) != Some(&b'.') {
        return Err(malformed());
    }

    if let Some(local) = raw.strip_suffix('Z') {
        return NaiveDateTime::parse_from_str(local, LOCAL_PART)
            .map(|naive| naive.and_utc())
            .map_err(|_| malformed());
    }

    // The offset sign must follow the milliseconds directly.
    if !matches!(raw.as_bytes().get(23), Some(b'+' | b'-')) {
        return Err(malformed());
    }

    DateTime::parse_from_str(raw, WITH_OFFSET)
        .map(|fixed| fixed.with_timezone(&Utc))
        .map_err(|_| malformed())
}

/// `yyyy-MM-dd`, as shown on the detail screen.
pub fn format_iso_date(instant: &DateTime<Utc>) -> String {
    instant.format("%Y-%m-%d").to_string()
}

/// Medium English date, e.g. `Sep 15, 2023`.
pub fn format_medium_date(instant: &DateTime<Utc>) -> String {
    instant.format("%b %-d, %Y").to_string()
}
