//! Weekly RRULE expansion -- turns a stored recurring event into concrete instances.
//!
//! Wraps the `rrule` crate (v0.13) and `chrono-tz` so that a weekly block anchored
//! in a calendar's timezone keeps its wall-clock time across DST changes.

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime};
use chrono_tz::Tz;
use rrule::RRuleSet;

use crate::error::{CoachError, Result};
use crate::recurrence::DayCode;

const ICAL_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Upper bound on instances produced for one series (roughly nine years of weeks).
const MAX_INSTANCES: u16 = 500;

/// A single expanded instance, in the calendar's timezone.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedEvent {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

/// Expand `FREQ=WEEKLY;BYDAY=<day>` from `dtstart` up to and including `until`.
///
/// # Arguments
/// - `dtstart` -- local wall-clock start of the first instance
/// - `duration` -- length of each instance
/// - `day` -- weekday the series repeats on
/// - `timezone` -- IANA timezone the wall-clock values are in (e.g., "America/New_York")
/// - `until` -- local wall-clock bound on instance starts
///
/// # Errors
/// Returns `CoachError::InvalidTimezone` if the timezone is not a valid IANA identifier.
/// Returns `CoachError::Recurrence` if the rule text is rejected by the `rrule` crate.
pub fn expand_weekly(
    dtstart: NaiveDateTime,
    duration: Duration,
    day: DayCode,
    timezone: &str,
    until: NaiveDateTime,
) -> Result<Vec<ExpandedEvent>> {
    let tz: Tz = timezone
        .parse()
        .map_err(|_| CoachError::InvalidTimezone(timezone.to_string()))?;

    if until < dtstart {
        return Ok(Vec::new());
    }

    // The rrule crate requires UNTIL and DTSTART to share the same timezone.
    // For UTC, UNTIL must end with "Z"; for other timezones, use bare local time.
    let mut until_ical = until.format(ICAL_FORMAT).to_string();
    if timezone == "UTC" {
        until_ical.push('Z');
    }

    let rrule_text = format!(
        "DTSTART;TZID={}:{}\nRRULE:FREQ=WEEKLY;BYDAY={};UNTIL={}",
        timezone,
        dtstart.format(ICAL_FORMAT),
        day.code(),
        until_ical
    );

    let rrule_set: RRuleSet = rrule_text
        .parse()
        .map_err(|e| CoachError::Recurrence(format!("{}", e)))?;

    let instances = rrule_set.all(MAX_INSTANCES);

    Ok(instances
        .dates
        .into_iter()
        .map(|dt| {
            let start = dt.with_timezone(&tz).fixed_offset();
            ExpandedEvent {
                start,
                end: start + duration,
            }
        })
        .collect())
}
