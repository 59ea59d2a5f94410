//! Query parameter helpers.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Deserialize;

use crate::errors::{AppResult, FieldErrors};

const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;

/// Optional `?username=` naming the user an admin acts for
#[derive(Debug, Default, Deserialize)]
pub struct TargetQuery {
    pub username: Option<String>,
}

impl TargetQuery {
    pub fn target(&self) -> Option<&str> {
        self.username.as_deref()
    }
}

/// Parse an RFC 3339 timestamp or a plain `YYYY-MM-DD` date (midnight UTC).
///
/// Years outside `1..=9999` are rejected.
pub fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    let parsed = match DateTime::parse_from_rfc3339(raw) {
        Ok(at) => Ok(at.with_timezone(&Utc)),
        Err(_) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(|date| date.and_time(chrono::NaiveTime::MIN).and_utc()),
    };

    match parsed {
        Ok(at) if (MIN_YEAR..=MAX_YEAR).contains(&at.year()) => Ok(at),
        Ok(_) => Err(format!(
            "{} must fall between years {} and {}",
            field, MIN_YEAR, MAX_YEAR
        )),
        Err(_) => Err(format!(
            "{} must be an RFC 3339 timestamp or YYYY-MM-DD date",
            field
        )),
    }
}

/// Parse optional `start`/`end` bounds, collecting every failure.
pub fn parse_bounds(
    start: Option<&str>,
    end: Option<&str>,
) -> AppResult<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
    let mut errors = FieldErrors::new();
    let mut parse = |field: &str, raw: Option<&str>| {
        let raw = raw.map(str::trim).filter(|r| !r.is_empty())?;
        parse_timestamp(field, raw)
            .map_err(|message| errors.add(field, message))
            .ok()
    };

    let start = parse("start", start);
    let end = parse("end", end);
    errors.into_result()?;
    Ok((start, end))
}
