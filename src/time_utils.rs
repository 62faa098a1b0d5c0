// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting and calendar-day math.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Calendar date of `instant` as observed at `offset`.
pub fn calendar_date(instant: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    instant.with_timezone(&offset).date_naive()
}

/// History key ("YYYY-MM-DD") for a calendar date.
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse an ISO 8601 timestamp into its calendar date at `offset`.
///
/// Accepts RFC3339, a date-time without offset (local time at `offset`)
/// and a bare `YYYY-MM-DD`. Returns `None` for anything else.
pub fn parse_calendar_date(timestamp: &str, offset: FixedOffset) -> Option<NaiveDate> {
    let timestamp = timestamp.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(timestamp) {
        return Some(calendar_date(ts.with_timezone(&Utc), offset));
    }
    if let Ok(local) = NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(local.date());
    }
    NaiveDate::parse_from_str(timestamp, "%Y-%m-%d").ok()
}

/// Parse a UTC offset such as `+02:00`, `-0700` or `Z`.
pub fn parse_utc_offset(value: &str) -> Option<FixedOffset> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }

    let (sign, rest) = match value.as_bytes().first()? {
        b'+' => (1, &value[1..]),
        b'-' => (-1, &value[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Offset of the host's local timezone right now.
pub fn local_offset() -> FixedOffset {
    *chrono::Local::now().offset()
}
