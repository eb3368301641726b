//! Duration and date text codecs.
//!
//! Durations are always rendered as `H:MM:SS`, even when the hours field is
//! zero, so every projector shows the same shape.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::CoreError;

static FULL_YEAR_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{1,2}-\d{1,2}$").unwrap());

static SHORT_YEAR_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}-\d{1,2}-\d{1,2}$").unwrap());

/// Formats a number of seconds as `H:MM:SS`.
pub fn seconds_to_clock(seconds: u32) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours}:{minutes:02}:{secs:02}")
}

/// Parses `H:MM:SS` or `MM:SS` into seconds.
///
/// An empty string is zero seconds; ledger rows for Stop and Finish carry no
/// duration.
pub fn clock_to_seconds(text: &str) -> Result<u32, CoreError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(0);
    }

    let invalid = || CoreError::InvalidClock(text.to_string());

    let parts = text
        .split(':')
        .map(|part| {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse::<u64>().map_err(|_| invalid())
        })
        .collect::<Result<Vec<u64>, CoreError>>()?;

    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m, s] if *m < 60 => (*h, *m, *s),
        [m, s] => (0, *m, *s),
        _ => return Err(invalid()),
    };
    if seconds >= 60 {
        return Err(invalid());
    }

    let total = hours
        .checked_mul(3600)
        .zip(minutes.checked_mul(60))
        .and_then(|(h, m)| h.checked_add(m))
        .and_then(|t| t.checked_add(seconds))
        .ok_or_else(invalid)?;
    u32::try_from(total).map_err(|_| invalid())
}

/// Parses user-supplied date text into a calendar date.
///
/// Accepts `YYYY-MM-DD` first, then `YY-MM-DD`. The shape is checked before
/// handing off to chrono so a two-digit year is never read as year 24 AD.
pub fn parse_flexible_date(text: &str) -> Result<NaiveDate, CoreError> {
    let text = text.trim();

    if FULL_YEAR_DATE_RE.is_match(text) {
        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            return Ok(date);
        }
    }

    if SHORT_YEAR_DATE_RE.is_match(text) {
        if let Ok(date) = NaiveDate::parse_from_str(text, "%y-%m-%d") {
            return Ok(date);
        }
    }

    Err(CoreError::InvalidDate(text.to_string()))
}
