//! Relative date and duration parsing.
//!
//! Turns human-friendly time expressions (`today 8am`, `-1d`, `1h30m`)
//! into canonical ISO-8601 timestamps with millisecond precision. Every
//! write and query command resolves its dates here before they cross into
//! the protocol layer.
//!
//! # Grammar
//!
//! Evaluated first-match-wins against a lower-cased, trimmed copy of the
//! input (original casing is used only for the full-ISO passthrough):
//!
//! | Form | Meaning |
//! |------|---------|
//! | `YYYY-MM-DDTHH:MM:SS[.f](Z\|±HH:MM)` | ISO passthrough; `.000` inserted if no fraction |
//! | `now` | The reference instant unchanged |
//! | `today` / `yesterday` / `tomorrow` | Start of day, local time |
//! | `[+-]Nd` | Start of day at reference ± N calendar days |
//! | `[+-]Nh` / `[+-]Nm` | Reference ± N hours/minutes (no truncation) |
//! | `YYYY-MM-DD` | Local midnight of that date |
//! | *fallback* | A closed set of calendar date/time formats |
//!
//! A second whitespace-delimited token is parsed as `H[:MM][am|pm]` and
//! overwrites the hour/minute of whatever the date token resolved to.
//! A time token outside that grammar, or with an impossible hour, is
//! ignored and the date-only resolution returned. The sign on
//! `Nd`/`Nh`/`Nm` is mandatory here; unsigned counts are valid only
//! inside duration expressions ([`parse_duration`]).
//!
//! All arithmetic uses the wall-clock local timezone of the process.

// ============================================================================
// Imports
// ============================================================================

use std::sync::LazyLock;

use chrono::offset::LocalResult;
use chrono::{DateTime, Days, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use regex::Regex;

use crate::error::{Error, Result};

// ============================================================================
// Grammar
// ============================================================================

/// Complete ISO instant: date, full time, optional fraction, and a zone.
/// Checked on the original casing. Zone-less inputs go through the
/// fallback grammar instead so the output stays normalized.
static ISO_INSTANT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|[+-]\d{2}:\d{2})$")
        .expect("iso instant regex")
});

/// ISO string ending in a numeric zone offset, without fractional seconds.
static ISO_OFFSET_NO_FRACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2})([+-]\d{2}:\d{2})$")
        .expect("iso offset regex")
});

/// Signed day offset date token.
static SIGNED_DAYS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([+-]\d+)d$").expect("days regex"));

/// Signed hour offset date token.
static SIGNED_HOURS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([+-]\d+)h$").expect("hours regex"));

/// Signed minute offset date token.
static SIGNED_MINUTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([+-]\d+)m$").expect("minutes regex"));

/// Bare calendar date token.
static CALENDAR_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").expect("calendar regex"));

/// Time-of-day token: `H[:MM][am|pm]`.
static TIME_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})(?::(\d{2}))?(am|pm)?$").expect("time regex"));

/// Day component of a duration expression.
static DURATION_DAYS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)d").expect("duration days regex"));

/// Hour component of a duration expression.
static DURATION_HOURS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)h").expect("duration hours regex"));

/// Minute component of a duration expression. The trailing class keeps
/// `ms` from being read as minutes.
static DURATION_MINUTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)m(?:[^s]|$)").expect("duration minutes regex"));

/// Closed fallback grammar for inputs matching no structured form.
const FALLBACK_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

// ============================================================================
// Public API
// ============================================================================

/// Resolves a time expression against a reference instant.
///
/// Returns a normalized ISO-8601 timestamp with millisecond precision.
/// Deterministic for a fixed `now`.
///
/// # Errors
///
/// Returns [`Error::DateParse`] naming the input when no grammar form
/// matches and the fallback formats fail; the enumerated forms
/// themselves never fail.
pub fn parse_relative_date(input: &str, now: DateTime<Local>) -> Result<String> {
    let trimmed = input.trim();

    // Full ISO passthrough, checked against the original casing
    if ISO_INSTANT.is_match(trimmed) {
        return Ok(insert_milliseconds(trimmed));
    }

    let lower = trimmed.to_lowercase();
    let mut tokens = lower.splitn(2, char::is_whitespace);
    let date_token = tokens.next().unwrap_or_default();
    let time_token = tokens.next().map(str::trim).filter(|t| !t.is_empty());

    let resolved = match resolve_date_token(date_token, now) {
        Some(instant) => instant,
        // No structured form matched; try the closed fallback grammar on
        // the untouched input and return without time-token application
        None => return fallback_parse(trimmed),
    };

    let resolved = match time_token {
        Some(token) => apply_time_token(resolved, token),
        None => resolved,
    };

    Ok(format_local(resolved))
}

/// Applies a duration expression to a start timestamp.
///
/// Day, hour and minute components are matched independently and are
/// order-insensitive; `2d`, `1h30m` and `30m1h` all work. Days shift by
/// calendar-day arithmetic (time-of-day preserved); hours and minutes by
/// fixed duration. A component that is absent contributes zero.
///
/// # Errors
///
/// Returns [`Error::DateParse`] if `start` is not a parseable timestamp.
pub fn parse_duration(start: &str, duration: &str) -> Result<String> {
    let start_instant = parse_timestamp(start)?;
    let expr = duration.trim().to_lowercase();

    let mut result = start_instant;

    if let Some(days) = capture_count(&DURATION_DAYS, &expr) {
        result = shift_calendar_days(result, days as i64);
    }
    if let Some(hours) = capture_count(&DURATION_HOURS, &expr) {
        result += Duration::hours(hours as i64);
    }
    if let Some(minutes) = capture_count(&DURATION_MINUTES, &expr) {
        result += Duration::minutes(minutes as i64);
    }

    Ok(format_local(result))
}

/// The inclusive full-day bracket for a resolved date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayRange {
    /// Start of the calendar day (00:00:00.000 local).
    pub start: String,
    /// Last millisecond of the calendar day (23:59:59.999 local).
    pub end: String,
}

/// Resolves an expression to the full-day bracket of its calendar day.
///
/// Used to convert a single relative-date argument into a whole-day
/// query window.
///
/// # Errors
///
/// Returns [`Error::DateParse`] if the expression does not resolve.
pub fn day_range(input: &str, now: DateTime<Local>) -> Result<DayRange> {
    let resolved = parse_relative_date(input, now)?;
    let instant = parse_timestamp(&resolved)?;

    let start = start_of_day(instant);
    let end = shift_calendar_days(start, 1) - Duration::milliseconds(1);

    Ok(DayRange {
        start: format_local(start),
        end: format_local(end),
    })
}

// ============================================================================
// Date-token resolution
// ============================================================================

/// Resolves the date token, or `None` when no structured form matches.
fn resolve_date_token(token: &str, now: DateTime<Local>) -> Option<DateTime<Local>> {
    match token {
        "now" => return Some(now),
        "today" => return Some(start_of_day(now)),
        "yesterday" => return Some(start_of_day(shift_calendar_days(now, -1))),
        "tomorrow" => return Some(start_of_day(shift_calendar_days(now, 1))),
        _ => {}
    }

    if let Some(n) = capture_signed(&SIGNED_DAYS, token) {
        return Some(start_of_day(shift_calendar_days(now, n)));
    }
    if let Some(n) = capture_signed(&SIGNED_HOURS, token) {
        return Some(now + Duration::hours(n));
    }
    if let Some(n) = capture_signed(&SIGNED_MINUTES, token) {
        return Some(now + Duration::minutes(n));
    }

    if let Some(caps) = CALENDAR_DATE.captures(token) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        return Some(localize(date.and_time(NaiveTime::MIN)));
    }

    None
}

/// Overwrites the hour/minute from a `H[:MM][am|pm]` token.
///
/// Seconds and milliseconds reset to zero. A token outside the grammar
/// (or an out-of-range hour) leaves the resolved date untouched.
fn apply_time_token(resolved: DateTime<Local>, token: &str) -> DateTime<Local> {
    let Some(caps) = TIME_TOKEN.captures(token) else {
        return resolved;
    };

    let Ok(hour) = caps[1].parse::<u32>() else {
        return resolved;
    };
    let minute: u32 = caps
        .get(2)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);

    let hour = match caps.get(3).map(|m| m.as_str()) {
        Some("pm") if (1..12).contains(&hour) => hour + 12,
        Some("am") if hour == 12 => 0,
        _ => hour,
    };

    match NaiveTime::from_hms_opt(hour, minute, 0) {
        Some(time) => localize(resolved.date_naive().and_time(time)),
        None => resolved,
    }
}

/// Parses the untouched input against the closed fallback grammar.
fn fallback_parse(input: &str) -> Result<String> {
    for format in FALLBACK_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(format_local(localize(naive)));
        }
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(input) {
        return Ok(format_local(instant.with_timezone(&Local)));
    }

    Err(Error::date_parse(input))
}

// ============================================================================
// Arithmetic helpers
// ============================================================================

/// Truncates to 00:00:00.000 local of the same calendar day.
fn start_of_day(instant: DateTime<Local>) -> DateTime<Local> {
    localize(instant.date_naive().and_time(NaiveTime::MIN))
}

/// Shifts by whole calendar days, preserving time-of-day.
fn shift_calendar_days(instant: DateTime<Local>, days: i64) -> DateTime<Local> {
    let naive = instant.naive_local();
    let shifted = if days >= 0 {
        naive.checked_add_days(Days::new(days as u64))
    } else {
        naive.checked_sub_days(Days::new(days.unsigned_abs()))
    };

    match shifted {
        Some(naive) => localize(naive),
        None => instant,
    }
}

/// Resolves a naive local datetime to an instant.
///
/// Ambiguous wall-clock times (DST fall-back) take the earlier instant;
/// nonexistent times (DST spring-forward) shift by the offset gap.
fn localize(naive: NaiveDateTime) -> DateTime<Local> {
    match naive.and_local_timezone(Local) {
        LocalResult::Single(instant) => instant,
        LocalResult::Ambiguous(earlier, _) => earlier,
        LocalResult::None => Local.from_utc_datetime(&naive),
    }
}

/// Parses a normalized timestamp back into a local instant.
fn parse_timestamp(value: &str) -> Result<DateTime<Local>> {
    DateTime::parse_from_rfc3339(value)
        .map(|instant| instant.with_timezone(&Local))
        .map_err(|_| Error::date_parse(value))
}

/// Extracts the signed count from a `[+-]N<suffix>` token.
fn capture_signed(pattern: &Regex, token: &str) -> Option<i64> {
    pattern.captures(token)?[1].parse().ok()
}

/// Extracts the unsigned count of one duration component.
fn capture_count(pattern: &Regex, expr: &str) -> Option<u64> {
    pattern.captures(expr)?[1].parse().ok()
}

// ============================================================================
// Formatting
// ============================================================================

/// Formats a local instant as ISO-8601 with millisecond precision.
fn format_local(instant: DateTime<Local>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string()
}

/// Inserts a `.000` fraction into an ISO string that lacks one.
fn insert_milliseconds(iso: &str) -> String {
    if iso.contains('.') {
        return iso.to_string();
    }

    if let Some(base) = iso.strip_suffix('Z') {
        return format!("{base}.000Z");
    }

    if let Some(caps) = ISO_OFFSET_NO_FRACTION.captures(iso) {
        return format!("{}.000{}", &caps[1], &caps[2]);
    }

    iso.to_string()
}

// ============================================================================
// Tests
// ============================================================================
