//! Date helpers
//!
//! Formatting uses moment-style pattern tokens (`YYYY-MM-DD HH:mm:ss`) rather
//! than strftime, since that is what the consuming front ends store in their
//! settings. Text inside `[...]` is emitted literally.

use chrono::{
    DateTime, Datelike, FixedOffset, Local, Months, NaiveDate, NaiveDateTime, NaiveTime,
    TimeDelta, Timelike, Utc,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use toolite_common::{Error, Result};
use tracing::debug;

/// Default output pattern
pub const DEFAULT_PATTERN: &str = "YYYY-MM-DD HH:mm:ss";

/// Accepted date-time layouts besides RFC 3339, tried in order
const DATETIME_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M",
];

const DATE_LAYOUTS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

const TIME_LAYOUTS: &[&str] = &["%H:%M:%S", "%H:%M"];

/// A date in any of the shapes callers hand us
#[derive(Debug, Clone, PartialEq)]
pub enum DateInput {
    /// Text to be parsed
    Text(String),
    /// Wall-clock time without zone
    Naive(NaiveDateTime),
    /// Instant with a known offset
    Zoned(DateTime<FixedOffset>),
}

impl From<&str> for DateInput {
    fn from(text: &str) -> Self {
        DateInput::Text(text.to_string())
    }
}

impl From<String> for DateInput {
    fn from(text: String) -> Self {
        DateInput::Text(text)
    }
}

impl From<NaiveDateTime> for DateInput {
    fn from(value: NaiveDateTime) -> Self {
        DateInput::Naive(value)
    }
}

impl From<NaiveDate> for DateInput {
    fn from(value: NaiveDate) -> Self {
        DateInput::Naive(value.and_time(NaiveTime::MIN))
    }
}

impl From<DateTime<FixedOffset>> for DateInput {
    fn from(value: DateTime<FixedOffset>) -> Self {
        DateInput::Zoned(value)
    }
}

impl From<DateTime<Utc>> for DateInput {
    fn from(value: DateTime<Utc>) -> Self {
        DateInput::Zoned(value.fixed_offset())
    }
}

impl From<DateTime<Local>> for DateInput {
    fn from(value: DateTime<Local>) -> Self {
        DateInput::Zoned(value.fixed_offset())
    }
}

/// Parsed form of a [`DateInput`]
enum Resolved {
    Naive(NaiveDateTime),
    Zoned(DateTime<FixedOffset>),
}

impl DateInput {
    fn resolve(&self) -> Result<Resolved> {
        match self {
            DateInput::Text(text) => parse_resolved(text),
            DateInput::Naive(naive) => Ok(Resolved::Naive(*naive)),
            DateInput::Zoned(dt) => Ok(Resolved::Zoned(*dt)),
        }
    }

    /// Wall-clock time, shifted to `offset_hours` east of UTC when given.
    ///
    /// Zone-less values are taken as UTC when an offset is requested.
    pub fn to_naive(&self, offset_hours: Option<i32>) -> Result<NaiveDateTime> {
        let resolved = self.resolve()?;
        let Some(hours) = offset_hours else {
            return Ok(match resolved {
                Resolved::Naive(naive) => naive,
                Resolved::Zoned(dt) => dt.naive_local(),
            });
        };

        let offset = hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| Error::invalid_input(format!("UTC offset out of range: {}h", hours)))?;
        let utc = match resolved {
            Resolved::Naive(naive) => naive,
            Resolved::Zoned(dt) => dt.naive_utc(),
        };
        Ok(utc.and_utc().with_timezone(&offset).naive_local())
    }
}

fn parse_resolved(text: &str) -> Result<Resolved> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(Resolved::Zoned(dt));
    }
    for layout in DATETIME_LAYOUTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, layout) {
            return Ok(Resolved::Naive(naive));
        }
    }
    for layout in DATE_LAYOUTS {
        if let Ok(date) = NaiveDate::parse_from_str(text, layout) {
            return Ok(Resolved::Naive(date.and_time(NaiveTime::MIN)));
        }
    }
    Err(Error::invalid_input(format!("Unrecognized date: {:?}", text)))
}

/// Parse RFC 3339, `YYYY-MM-DD HH:mm:ss` style text, or a bare date
pub fn parse_datetime(text: &str) -> Result<DateInput> {
    Ok(match parse_resolved(text)? {
        Resolved::Naive(naive) => DateInput::Naive(naive),
        Resolved::Zoned(dt) => DateInput::Zoned(dt),
    })
}

/// Parse `HH:mm:ss` (or `HH:mm`)
pub fn parse_time(text: &str) -> Result<NaiveTime> {
    let text = text.trim();
    TIME_LAYOUTS
        .iter()
        .find_map(|layout| NaiveTime::parse_from_str(text, layout).ok())
        .ok_or_else(|| Error::invalid_input(format!("Unrecognized time: {:?}", text)))
}

// ============================================================================
// Formatting
// ============================================================================

/// Longest tokens first so `YYYY` wins over `YY`
const TOKENS: &[&str] = &[
    "YYYY", "MMMM", "dddd", "MMM", "ddd", "SSS", "YY", "MM", "DD", "HH", "hh", "mm", "ss", "M",
    "D", "H", "h", "m", "s", "A", "a",
];

fn render_token(token: &str, dt: &NaiveDateTime, out: &mut String) {
    use std::fmt::Write;

    let _ = match token {
        "YYYY" => write!(out, "{:04}", dt.year()),
        "YY" => write!(out, "{:02}", dt.year().rem_euclid(100)),
        "MMMM" => write!(out, "{}", dt.format("%B")),
        "MMM" => write!(out, "{}", dt.format("%b")),
        "MM" => write!(out, "{:02}", dt.month()),
        "M" => write!(out, "{}", dt.month()),
        "DD" => write!(out, "{:02}", dt.day()),
        "D" => write!(out, "{}", dt.day()),
        "dddd" => write!(out, "{}", dt.format("%A")),
        "ddd" => write!(out, "{}", dt.format("%a")),
        "HH" => write!(out, "{:02}", dt.hour()),
        "H" => write!(out, "{}", dt.hour()),
        "hh" => write!(out, "{:02}", dt.hour12().1),
        "h" => write!(out, "{}", dt.hour12().1),
        "mm" => write!(out, "{:02}", dt.minute()),
        "m" => write!(out, "{}", dt.minute()),
        "ss" => write!(out, "{:02}", dt.second()),
        "s" => write!(out, "{}", dt.second()),
        "SSS" => write!(out, "{:03}", dt.nanosecond() % 1_000_000_000 / 1_000_000),
        "A" => write!(out, "{}", if dt.hour12().0 { "PM" } else { "AM" }),
        "a" => write!(out, "{}", if dt.hour12().0 { "pm" } else { "am" }),
        _ => write!(out, "{}", token),
    };
}

/// Render `dt` with a moment-style pattern
pub fn format_naive(dt: &NaiveDateTime, pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut rest = pattern;

    while let Some(ch) = rest.chars().next() {
        if ch == '[' {
            if let Some(end) = rest.find(']') {
                out.push_str(&rest[1..end]);
                rest = &rest[end + 1..];
                continue;
            }
        }
        match TOKENS.iter().find(|token| rest.starts_with(**token)) {
            Some(token) => {
                render_token(token, dt, &mut out);
                rest = &rest[token.len()..];
            },
            None => {
                out.push(ch);
                rest = &rest[ch.len_utf8()..];
            },
        }
    }
    out
}

/// Format a date; returns an empty string when the input cannot be parsed
///
/// `pattern` defaults to [`DEFAULT_PATTERN`]. `offset_hours` shifts the
/// output to that UTC offset.
pub fn date_format(input: impl Into<DateInput>, pattern: Option<&str>, offset_hours: Option<i32>) -> String {
    let input = input.into();
    match input.to_naive(offset_hours) {
        Ok(dt) => format_naive(&dt, pattern.unwrap_or(DEFAULT_PATTERN)),
        Err(e) => {
            debug!("date_format rejected {:?}: {}", input, e);
            String::new()
        },
    }
}

// ============================================================================
// Arithmetic
// ============================================================================

/// Calendar unit for differences and offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Years,
    Months,
    Weeks,
    #[default]
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl FromStr for TimeUnit {
    type Err = Error;

    /// Long names are case-insensitive; `M` (months) and `m` (minutes) are not
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "M" => return Ok(TimeUnit::Months),
            "m" => return Ok(TimeUnit::Minutes),
            _ => {}
        }
        match s.to_ascii_lowercase().as_str() {
            "y" | "year" | "years" => Ok(TimeUnit::Years),
            "month" | "months" => Ok(TimeUnit::Months),
            "w" | "week" | "weeks" => Ok(TimeUnit::Weeks),
            "d" | "day" | "days" => Ok(TimeUnit::Days),
            "h" | "hour" | "hours" => Ok(TimeUnit::Hours),
            "minute" | "minutes" => Ok(TimeUnit::Minutes),
            "s" | "second" | "seconds" => Ok(TimeUnit::Seconds),
            other => Err(Error::invalid_input(format!("Unknown time unit: {}", other))),
        }
    }
}

fn shift_months(dt: NaiveDateTime, months: i64) -> Result<NaiveDateTime> {
    let magnitude = u32::try_from(months.unsigned_abs())
        .map_err(|_| Error::invalid_input(format!("Month offset too large: {}", months)))?;
    let shifted = if months >= 0 {
        dt.checked_add_months(Months::new(magnitude))
    } else {
        dt.checked_sub_months(Months::new(magnitude))
    };
    shifted.ok_or_else(|| Error::invalid_input(format!("Date out of range after {} months", months)))
}

fn whole_months_between(start: NaiveDateTime, end: NaiveDateTime) -> Result<i64> {
    let mut months = i64::from(end.year() - start.year()) * 12
        + i64::from(end.month()) - i64::from(start.month());
    let anchor = shift_months(start, months)?;
    if months > 0 && anchor > end {
        months -= 1;
    } else if months < 0 && anchor < end {
        months += 1;
    }
    Ok(months)
}

/// `end - start` in whole `unit`s, truncated toward zero
pub fn date_diff(start: impl Into<DateInput>, end: impl Into<DateInput>, unit: TimeUnit) -> Result<i64> {
    let start = start.into().to_naive(None)?;
    let end = end.into().to_naive(None)?;
    let delta = end - start;

    Ok(match unit {
        TimeUnit::Years => whole_months_between(start, end)? / 12,
        TimeUnit::Months => whole_months_between(start, end)?,
        TimeUnit::Weeks => delta.num_weeks(),
        TimeUnit::Days => delta.num_days(),
        TimeUnit::Hours => delta.num_hours(),
        TimeUnit::Minutes => delta.num_minutes(),
        TimeUnit::Seconds => delta.num_seconds(),
    })
}

/// Shift a date by `amount` units
pub fn shift(dt: NaiveDateTime, amount: i64, unit: TimeUnit) -> Result<NaiveDateTime> {
    let out_of_range = || Error::invalid_input(format!("Offset of {} {:?} out of range", amount, unit));
    match unit {
        TimeUnit::Years => shift_months(dt, amount.checked_mul(12).ok_or_else(out_of_range)?),
        TimeUnit::Months => shift_months(dt, amount),
        TimeUnit::Weeks => TimeDelta::try_weeks(amount)
            .and_then(|d| dt.checked_add_signed(d))
            .ok_or_else(out_of_range),
        TimeUnit::Days => TimeDelta::try_days(amount)
            .and_then(|d| dt.checked_add_signed(d))
            .ok_or_else(out_of_range),
        TimeUnit::Hours => TimeDelta::try_hours(amount)
            .and_then(|d| dt.checked_add_signed(d))
            .ok_or_else(out_of_range),
        TimeUnit::Minutes => TimeDelta::try_minutes(amount)
            .and_then(|d| dt.checked_add_signed(d))
            .ok_or_else(out_of_range),
        TimeUnit::Seconds => TimeDelta::try_seconds(amount)
            .and_then(|d| dt.checked_add_signed(d))
            .ok_or_else(out_of_range),
    }
}

/// Shift `start` (now when `None`) by `amount` units and format the result
pub fn date_by_offset(
    start: Option<DateInput>,
    amount: i64,
    unit: TimeUnit,
    pattern: Option<&str>,
) -> Result<String> {
    let base = match start {
        Some(input) => input.to_naive(None)?,
        None => Local::now().naive_local(),
    };
    let shifted = shift(base, amount, unit)?;
    Ok(format_naive(&shifted, pattern.unwrap_or(DEFAULT_PATTERN)))
}

// ============================================================================
// Ranges
// ============================================================================

/// Which interval boundary a checked time may coincide with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntervalEdge {
    /// `start <= t < end`: the time may equal another interval's end
    #[default]
    Start,
    /// `start < t <= end`: the time may equal another interval's start
    End,
}

fn within(t: NaiveTime, start: NaiveTime, end: NaiveTime, edge: IntervalEdge) -> bool {
    let after_start = match edge {
        IntervalEdge::Start => t >= start,
        IntervalEdge::End => t > start,
    };
    let before_end = match edge {
        IntervalEdge::Start => t < end,
        IntervalEdge::End => t <= end,
    };
    if start <= end {
        after_start && before_end
    } else {
        // Interval wraps past midnight
        after_start || before_end
    }
}

/// Whether `check` (`HH:mm:ss`) falls inside any of `intervals`
pub fn is_time_within_intervals<S: AsRef<str>>(
    check: &str,
    intervals: &[(S, S)],
    edge: IntervalEdge,
) -> Result<bool> {
    let t = parse_time(check)?;
    for (start, end) in intervals {
        let start = parse_time(start.as_ref())?;
        let end = parse_time(end.as_ref())?;
        if within(t, start, end, edge) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Whether `time` lies in `[start, end]`
pub fn is_time_range(time: impl Into<DateInput>, start: &str, end: &str) -> Result<bool> {
    let time = time.into().to_naive(None)?;
    let start = parse_datetime(start)?.to_naive(None)?;
    let end = parse_datetime(end)?.to_naive(None)?;
    Ok(start <= time && time <= end)
}
