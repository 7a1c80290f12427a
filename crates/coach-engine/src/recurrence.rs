//! Weekly unavailability: project a recurring per-weekday rule onto concrete dates.
//!
//! A rule such as "Mondays 9:00-17:00" is anchored on the next Monday on or after
//! today and committed to the calendar as a weekly-recurring event. Ranges that
//! cross midnight become two events, the second on the following weekday.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::busy::Interval;
use crate::calendar::{CalendarService, EventId, ServiceError};
use crate::error::CoachError;
use crate::timerange::{end_of_day, TimeRange};

/// Day of the week as used by RFC 5545 `BYDAY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DayCode {
    Mo,
    Tu,
    We,
    Th,
    Fr,
    Sa,
    Su,
}

impl DayCode {
    /// Monday first, matching the order days are prompted for.
    pub const ALL: [DayCode; 7] = [
        DayCode::Mo,
        DayCode::Tu,
        DayCode::We,
        DayCode::Th,
        DayCode::Fr,
        DayCode::Sa,
        DayCode::Su,
    ];

    /// The following day, wrapping Sunday to Monday.
    pub fn next(self) -> DayCode {
        Self::ALL[(self.index() + 1) % 7]
    }

    /// Zero-based index with Monday = 0.
    pub fn index(self) -> usize {
        match self {
            DayCode::Mo => 0,
            DayCode::Tu => 1,
            DayCode::We => 2,
            DayCode::Th => 3,
            DayCode::Fr => 4,
            DayCode::Sa => 5,
            DayCode::Su => 6,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            DayCode::Mo => "MO",
            DayCode::Tu => "TU",
            DayCode::We => "WE",
            DayCode::Th => "TH",
            DayCode::Fr => "FR",
            DayCode::Sa => "SA",
            DayCode::Su => "SU",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DayCode::Mo => "Monday",
            DayCode::Tu => "Tuesday",
            DayCode::We => "Wednesday",
            DayCode::Th => "Thursday",
            DayCode::Fr => "Friday",
            DayCode::Sa => "Saturday",
            DayCode::Su => "Sunday",
        }
    }

    pub fn weekday(self) -> Weekday {
        match self {
            DayCode::Mo => Weekday::Mon,
            DayCode::Tu => Weekday::Tue,
            DayCode::We => Weekday::Wed,
            DayCode::Th => Weekday::Thu,
            DayCode::Fr => Weekday::Fri,
            DayCode::Sa => Weekday::Sat,
            DayCode::Su => Weekday::Sun,
        }
    }
}

impl From<Weekday> for DayCode {
    fn from(day: Weekday) -> Self {
        Self::ALL[day.num_days_from_monday() as usize]
    }
}

impl FromStr for DayCode {
    type Err = CoachError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoachError::InvalidDayCode(s.to_string()))
    }
}

impl fmt::Display for DayCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Time-of-day ranges a user cannot study on one weekday, every week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyUnavailabilityRule {
    pub day: DayCode,
    pub slots: Vec<TimeRange>,
}

/// A concrete first occurrence of a weekly unavailable block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnavailableEvent {
    pub interval: Interval,
    pub recurrence: DayCode,
}

/// Outcome of committing one rule: ids of created events and per-event failures.
#[derive(Debug, Default)]
pub struct ExpansionReport {
    pub created: Vec<EventId>,
    pub failed: Vec<(UnavailableEvent, ServiceError)>,
}

/// The first date on or after `today` that falls on `day`. Today counts.
pub fn next_occurrence(today: NaiveDate, day: DayCode) -> NaiveDate {
    let today_idx = today.weekday().num_days_from_monday() as i64;
    let ahead = (day.index() as i64 - today_idx).rem_euclid(7);
    today + Duration::days(ahead)
}

/// Expand a rule into concrete events anchored on its next occurrence.
///
/// Ranges with `start < end` yield one event tagged with `rule.day`. A range with
/// `start >= end` yields `[start, 23:59)` on the anchor date and `[00:00, end)` on
/// the day after, tagged with `rule.day.next()`. Zero-length pieces are dropped.
pub fn expand_rule(rule: &WeeklyUnavailabilityRule, today: NaiveDate) -> Vec<UnavailableEvent> {
    let date = next_occurrence(today, rule.day);
    let mut events = Vec::with_capacity(rule.slots.len());

    for slot in &rule.slots {
        if !slot.wraps_midnight() {
            push_event(&mut events, date, slot.start, slot.end, rule.day);
            continue;
        }

        push_event(&mut events, date, slot.start, end_of_day(), rule.day);
        push_event(
            &mut events,
            date + Duration::days(1),
            NaiveTime::MIN,
            slot.end,
            rule.day.next(),
        );
    }

    events
}

/// Expand `rule` and commit each event as weekly-recurring with `summary`.
///
/// A failing commit is logged and recorded in the report; the remaining events
/// are still attempted.
pub fn commit_rule<C: CalendarService + ?Sized>(
    calendar: &mut C,
    rule: &WeeklyUnavailabilityRule,
    today: NaiveDate,
    summary: &str,
) -> ExpansionReport {
    let mut report = ExpansionReport::default();

    for event in expand_rule(rule, today) {
        match calendar.create_event(&event.interval, summary, Some(event.recurrence)) {
            Ok(id) => {
                tracing::info!(day = %event.recurrence, interval = %event.interval, "created recurring event");
                report.created.push(id);
            }
            Err(err) => {
                tracing::warn!(
                    day = %event.recurrence,
                    interval = %event.interval,
                    summary,
                    error = %err,
                    "failed to create recurring event"
                );
                report.failed.push((event, err));
            }
        }
    }

    report
}

fn push_event(
    events: &mut Vec<UnavailableEvent>,
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    recurrence: DayCode,
) {
    // Zero-length pieces are the only way construction can fail here.
    if let Ok(interval) = Interval::new(date.and_time(start), date.and_time(end)) {
        events.push(UnavailableEvent {
            interval,
            recurrence,
        });
    }
}
