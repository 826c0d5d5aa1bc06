// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Timestamp parsing and calendar bucket keys.
//!
//! GitHub reports instants as RFC 3339 strings with a trailing `Z`. Every
//! parser in this module returns `None` instead of failing so callers can skip
//! records with unusable timestamps.

use chrono::{DateTime, Datelike, NaiveDateTime, Utc};

/// Parses a GitHub timestamp into a UTC instant.
///
/// Accepts RFC 3339 with `Z` or an explicit offset, and the naive
/// `YYYY-MM-DDTHH:MM:SS` form treated as UTC. Blank or malformed input yields
/// `None`.
///
/// # Examples
///
/// ```
/// use repo_insight::time::parse_timestamp;
///
/// let instant = parse_timestamp("2024-03-15T10:11:12Z",).expect("valid timestamp",);
/// assert_eq!(instant.to_rfc3339(), "2024-03-15T10:11:12+00:00");
/// assert!(parse_timestamp("",).is_none());
/// ```
pub fn parse_timestamp(raw: &str,) -> Option<DateTime<Utc,>,>
{
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(parsed,) = DateTime::parse_from_rfc3339(trimmed,) {
        return Some(parsed.with_timezone(&Utc,),);
    }

    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S",)
        .ok()
        .map(|naive| naive.and_utc(),)
}

/// Parses an optional timestamp string, treating absent values as `None`.
pub fn parse_optional(raw: Option<&str,>,) -> Option<DateTime<Utc,>,>
{
    raw.and_then(parse_timestamp,)
}

/// Elapsed hours from `start` to `end`; negative when `end` precedes `start`.
pub fn hours_between(start: DateTime<Utc,>, end: DateTime<Utc,>,) -> f64
{
    (end - start).num_seconds() as f64 / 3600.0
}

/// Elapsed days from `start` to `end` as a fractional value.
pub fn days_between(start: DateTime<Utc,>, end: DateTime<Utc,>,) -> f64
{
    (end - start).num_seconds() as f64 / 86_400.0
}

/// Calendar day key, e.g. `2024-03-15`.
pub fn day_key(instant: DateTime<Utc,>,) -> String
{
    instant.format("%Y-%m-%d",).to_string()
}

/// Week key composed of the calendar year and the unpadded ISO week number,
/// e.g. `2024-W11`.
///
/// The year component is the calendar year rather than the ISO week-year, so
/// the first days of January may map to `YYYY-W52` or `YYYY-W53`.
pub fn week_key(instant: DateTime<Utc,>,) -> String
{
    format!("{}-W{}", instant.year(), instant.iso_week().week())
}

/// Calendar month key, e.g. `2024-03`.
pub fn month_key(instant: DateTime<Utc,>,) -> String
{
    instant.format("%Y-%m",).to_string()
}

/// Returns the instant `days` days before `now`.
pub fn days_ago(now: DateTime<Utc,>, days: u32,) -> DateTime<Utc,>
{
    now - chrono::Duration::days(i64::from(days,),)
}
