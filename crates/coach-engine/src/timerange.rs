//! Parse free-text weekly unavailability into midnight-safe time-of-day ranges.
//!
//! Input is a list of ranges in the form `H:MM(AM|PM)-H:MM(AM|PM)`, separated by
//! commas and/or spaces, e.g. `"8:15AM-12:30PM, 1:00PM-3:00PM"`. A range whose end
//! is not after its start is read as spanning midnight and split in two.

use std::fmt;
use std::sync::LazyLock;

use chrono::{Duration, NaiveTime};
use regex::Regex;

use crate::error::{CoachError, Result};

/// One `H:MM(AM|PM)-H:MM(AM|PM)` range, compiled once per process.
static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,2}):(\d{2})([AP]M)-(\d{1,2}):(\d{2})([AP]M)")
        .expect("time range pattern is a valid regex")
});

/// A wall-clock range within a single day. Minute granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeRange {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// True when the range is read as crossing midnight (`start >= end`).
    pub fn wraps_midnight(&self) -> bool {
        self.start >= self.end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

/// Last minute of the day, used as the end of the first half of a midnight split.
pub fn end_of_day() -> NaiveTime {
    NaiveTime::MIN + Duration::minutes(23 * 60 + 59)
}

/// Parse comma-separated `H:MM(AM|PM)-H:MM(AM|PM)` ranges, in input order.
///
/// Spaces and commas are separators only; anything else that is not part of a
/// well-formed range rejects the whole input. Blank input yields no ranges.
///
/// Ranges that wrap midnight are split with [`split_midnight`].
///
/// # Errors
/// Returns `CoachError::TimeRangeFormat` if the text does not decompose losslessly
/// into ranges, or if an hour is outside 1–12 or a minute outside 00–59.
pub fn parse_time_ranges(text: &str) -> Result<Vec<TimeRange>> {
    let compact: String = text.chars().filter(|c| *c != ' ' && *c != ',').collect();
    if compact.is_empty() {
        return Ok(Vec::new());
    }

    let mut ranges = Vec::new();
    let mut consumed = 0;
    for caps in RANGE_RE.captures_iter(&compact) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() != consumed {
            return Err(unexpected(&compact[consumed..whole.start()], text));
        }
        consumed = whole.end();

        let start = clock_time(&caps[1], &caps[2], &caps[3])?;
        let end = clock_time(&caps[4], &caps[5], &caps[6])?;
        ranges.push(TimeRange::new(start, end));
    }

    if consumed != compact.len() {
        return Err(unexpected(&compact[consumed..], text));
    }

    Ok(split_midnight(&ranges))
}

/// Replace every midnight-wrapping range with `(start, 23:59)` and `(00:00, end)`.
///
/// Pieces that collapse to zero length (an end of exactly midnight, or a start at
/// 23:59) are dropped. Applying this to its own output is a no-op.
pub fn split_midnight(ranges: &[TimeRange]) -> Vec<TimeRange> {
    let mut out = Vec::with_capacity(ranges.len());
    for range in ranges {
        if !range.wraps_midnight() {
            out.push(*range);
            continue;
        }
        let late = TimeRange::new(range.start, end_of_day());
        let early = TimeRange::new(NaiveTime::MIN, range.end);
        if !late.wraps_midnight() {
            out.push(late);
        }
        if !early.wraps_midnight() {
            out.push(early);
        }
    }
    out
}

fn clock_time(hour: &str, minute: &str, meridiem: &str) -> Result<NaiveTime> {
    let invalid = || CoachError::TimeRangeFormat(format!("{}:{}{}", hour, minute, meridiem));

    let hour: u32 = hour.parse().map_err(|_| invalid())?;
    let minute: u32 = minute.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&hour) || minute > 59 {
        return Err(invalid());
    }

    let hour24 = match (meridiem, hour) {
        ("AM", 12) => 0,
        ("AM", h) => h,
        ("PM", 12) => 12,
        (_, h) => h + 12,
    };

    NaiveTime::from_hms_opt(hour24, minute, 0).ok_or_else(invalid)
}

fn unexpected(fragment: &str, text: &str) -> CoachError {
    CoachError::TimeRangeFormat(format!(
        "unexpected '{}' in '{}' (expected e.g. 8:15AM-12:30PM, 1:00PM-3:00PM)",
        fragment,
        text.trim()
    ))
}
