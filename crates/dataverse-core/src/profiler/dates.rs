//! Best-effort date parsing for textual columns.
//!
//! Values are tried against a fixed, ordered list of explicit patterns first.
//! Only when none of them consumes the whole value does the lenient
//! free-form fallback run. Anything that still does not parse becomes `None`.
//!
//! A `%Y` pattern only matches when the year is written with exactly four
//! digits; two-digit years are read by a separate set of `%y` patterns, so
//! `1/2/24` is 2024-01-02 rather than year 24.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

/// Explicit patterns, in priority order.
const STRICT_DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d-%m-%Y", "%m/%d/%Y", "%Y/%m/%d"];

/// Date-time shapes accepted by the fallback.
const LENIENT_DATETIME_FORMATS: [&str; 12] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
];

/// Date-only shapes accepted by the fallback.
const LENIENT_DATE_FORMATS: [&str; 13] = [
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%Y %B %d",
    "%A, %B %d, %Y",
    "%A %B %d %Y",
    "%d-%b-%Y",
    "%b-%d-%Y",
    "%d.%m.%Y",
    "%Y.%m.%d",
    "%d/%m/%Y",
    "%m-%d-%Y",
];

/// Two-digit-year shapes, tried last.
const SHORT_YEAR_DATE_FORMATS: [&str; 3] = ["%m/%d/%y", "%d-%b-%y", "%d.%m.%y"];

// A value without a run of at least two digits cannot carry a year
static HAS_YEAR_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{2}").expect("Invalid regex: year digits"));

static DIGIT_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+").expect("Invalid regex: digit run"));

// Compact form is only accepted as exactly eight digits
static COMPACT_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{8}$").expect("Invalid regex: compact date"));

/// Parse every value of a column; the output has the same length as the input.
pub fn parse_dates<S: AsRef<str>>(values: &[Option<S>]) -> Vec<Option<NaiveDateTime>> {
    values
        .iter()
        .map(|value| value.as_ref().and_then(|v| parse_date(v.as_ref())))
        .collect()
}

/// Parse a single value, returning `None` when it is not a date.
///
/// Date-only values resolve to midnight.
pub fn parse_date(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    parse_strict(trimmed).or_else(|| parse_lenient(trimmed))
}

fn parse_strict(value: &str) -> Option<NaiveDateTime> {
    parse_full_year_date(value, &STRICT_DATE_FORMATS).and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// First format that parses `value` with a four-digit year.
fn parse_full_year_date(value: &str, formats: &[&str]) -> Option<NaiveDate> {
    formats.iter().find_map(|format| {
        NaiveDate::parse_from_str(value, format)
            .ok()
            .filter(|date| has_year_token(value, date.year(), 4))
    })
}

/// Whether `value` writes `year` as a whole run of exactly `digits` digits.
fn has_year_token(value: &str, year: i32, digits: usize) -> bool {
    let token = format!("{year:0digits$}");
    token.len() == digits && DIGIT_RUN.find_iter(value).any(|run| run.as_str() == token)
}

fn parse_lenient(value: &str) -> Option<NaiveDateTime> {
    if !HAS_YEAR_DIGITS.is_match(value) {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.naive_utc());
    }

    if let Some(dt) = LENIENT_DATETIME_FORMATS.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(value, format)
            .ok()
            .filter(|dt| has_year_token(value, dt.year(), 4))
    }) {
        return Some(dt);
    }

    parse_full_year_date(value, &LENIENT_DATE_FORMATS)
        .or_else(|| parse_short_year(value))
        .or_else(|| parse_compact(value))
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Two-digit years, placed in a century by `%y`.
fn parse_short_year(value: &str) -> Option<NaiveDate> {
    SHORT_YEAR_DATE_FORMATS.iter().find_map(|format| {
        NaiveDate::parse_from_str(value, format)
            .ok()
            .filter(|date| has_year_token(value, date.year() % 100, 2))
    })
}

/// `YYYYMMDD`
fn parse_compact(value: &str) -> Option<NaiveDate> {
    if !COMPACT_DATE.is_match(value) {
        return None;
    }
    let year = value[0..4].parse().ok()?;
    let month = value[4..6].parse().ok()?;
    let day = value[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
