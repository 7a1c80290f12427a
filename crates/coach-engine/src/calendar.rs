//! Calendar Service capability and a JSON-backed in-memory implementation.
//!
//! The engine only needs two things from a calendar: the events in a time window
//! (so it knows what is busy) and a way to commit a new event, optionally repeating
//! weekly. Anything that can do both can back a scheduling run.

use std::fs;
use std::path::Path;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::busy::{BusyIntervalSet, Interval};
use crate::expander::expand_weekly;
use crate::recurrence::DayCode;

/// Opaque identifier assigned by the calendar to a created event.
pub type EventId = String;

/// Failures reported by a calendar backend. None of these abort a scheduling run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    #[error("Calendar rejected the request: {0}")]
    Rejected(String),

    #[error("Calendar unavailable: {0}")]
    Unavailable(String),

    #[error("Calendar storage error: {0}")]
    Storage(String),
}

/// An event as reported by a calendar backend, with its UTC offset.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub id: EventId,
    pub summary: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    /// Set when this instance comes from a weekly series.
    pub recurrence: Option<DayCode>,
}

/// The external calendar the engine reads busy time from and commits events to.
///
/// Window bounds are naive local wall-clock times.
pub trait CalendarService {
    /// Events intersecting `[time_min, time_max)`, recurring series expanded into
    /// single instances, ordered by start.
    fn list_events(
        &self,
        time_min: NaiveDateTime,
        time_max: NaiveDateTime,
    ) -> Result<Vec<CalendarEvent>, ServiceError>;

    /// Commit one event, repeating weekly on `recurrence` when given.
    fn create_event(
        &mut self,
        interval: &Interval,
        summary: &str,
        recurrence: Option<DayCode>,
    ) -> Result<EventId, ServiceError>;

    /// Busy intervals in the window, normalized to naive local time.
    fn list_busy(
        &self,
        time_min: NaiveDateTime,
        time_max: NaiveDateTime,
    ) -> Result<BusyIntervalSet, ServiceError> {
        let events = self.list_events(time_min, time_max)?;
        Ok(BusyIntervalSet::from_calendar(&events))
    }
}

/// An event as stored: wall-clock times in the owning calendar's timezone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub id: EventId,
    pub summary: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<DayCode>,
}

/// A calendar held in memory and persisted as a JSON document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryCalendar {
    summary: String,
    timezone: String,
    next_id: u64,
    events: Vec<StoredEvent>,
}

impl MemoryCalendar {
    pub const DEFAULT_SUMMARY: &'static str = "Study Coach Schedule";

    /// # Errors
    /// Returns `ServiceError::Rejected` if `timezone` is not a valid IANA identifier.
    pub fn new(timezone: &str) -> Result<Self, ServiceError> {
        parse_tz(timezone)?;
        Ok(Self {
            summary: Self::DEFAULT_SUMMARY.to_string(),
            timezone: timezone.to_string(),
            next_id: 1,
            events: Vec::new(),
        })
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn timezone(&self) -> &str {
        &self.timezone
    }

    pub fn events(&self) -> &[StoredEvent] {
        &self.events
    }

    /// True once weekly unavailability has been committed.
    pub fn has_weekly_events(&self) -> bool {
        self.events.iter().any(|e| e.recurrence.is_some())
    }

    /// Current wall-clock time in this calendar's timezone.
    ///
    /// Stored events are naive local times in the calendar's zone, so any "now"
    /// compared against them must be read on the same clock.
    pub fn now(&self) -> Result<NaiveDateTime, ServiceError> {
        self.local_time(Utc::now())
    }

    /// Today's date in this calendar's timezone.
    pub fn today(&self) -> Result<NaiveDate, ServiceError> {
        Ok(self.now()?.date())
    }

    /// `instant` as a wall-clock reading in this calendar's timezone.
    pub fn local_time(&self, instant: DateTime<Utc>) -> Result<NaiveDateTime, ServiceError> {
        let tz = parse_tz(&self.timezone)?;
        Ok(instant.with_timezone(&tz).naive_local())
    }

    /// Read a calendar previously written by [`MemoryCalendar::save`].
    pub fn load(path: &Path) -> Result<Self, ServiceError> {
        let raw = fs::read_to_string(path)
            .map_err(|e| ServiceError::Storage(format!("{}: {}", path.display(), e)))?;
        let calendar: Self = serde_json::from_str(&raw)
            .map_err(|e| ServiceError::Storage(format!("{}: {}", path.display(), e)))?;
        parse_tz(&calendar.timezone)?;
        Ok(calendar)
    }

    /// Load the calendar at `path`, or start a new one in `timezone` if the file
    /// does not exist yet. The flag is `true` when a new calendar was created.
    pub fn load_or_create(path: &Path, timezone: &str) -> Result<(Self, bool), ServiceError> {
        if path.exists() {
            Ok((Self::load(path)?, false))
        } else {
            tracing::info!(path = %path.display(), timezone, "creating new calendar");
            Ok((Self::new(timezone)?, true))
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ServiceError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        fs::write(path, json)
            .map_err(|e| ServiceError::Storage(format!("{}: {}", path.display(), e)))
    }
}

impl CalendarService for MemoryCalendar {
    fn list_events(
        &self,
        time_min: NaiveDateTime,
        time_max: NaiveDateTime,
    ) -> Result<Vec<CalendarEvent>, ServiceError> {
        let tz = parse_tz(&self.timezone)?;
        let mut out = Vec::new();

        for stored in &self.events {
            match stored.recurrence {
                None => {
                    if stored.start >= time_max || stored.end <= time_min {
                        continue;
                    }
                    let (Some(start), Some(end)) =
                        (localize(tz, stored.start), localize(tz, stored.end))
                    else {
                        tracing::warn!(id = %stored.id, "event falls in a DST gap, skipping");
                        continue;
                    };
                    out.push(CalendarEvent {
                        id: stored.id.clone(),
                        summary: stored.summary.clone(),
                        start,
                        end,
                        recurrence: None,
                    });
                }
                Some(day) => {
                    let instances = match expand_weekly(
                        stored.start,
                        stored.end - stored.start,
                        day,
                        &self.timezone,
                        time_max,
                    ) {
                        Ok(instances) => instances,
                        Err(err) => {
                            tracing::warn!(id = %stored.id, error = %err, "cannot expand recurring event");
                            continue;
                        }
                    };
                    out.extend(
                        instances
                            .into_iter()
                            .filter(|i| i.start.naive_local() < time_max && i.end.naive_local() > time_min)
                            .map(|i| CalendarEvent {
                                id: stored.id.clone(),
                                summary: stored.summary.clone(),
                                start: i.start,
                                end: i.end,
                                recurrence: Some(day),
                            }),
                    );
                }
            }
        }

        out.sort_by_key(|e| e.start.naive_local());
        Ok(out)
    }

    fn create_event(
        &mut self,
        interval: &Interval,
        summary: &str,
        recurrence: Option<DayCode>,
    ) -> Result<EventId, ServiceError> {
        let id = format!("evt-{}", self.next_id);
        self.next_id += 1;
        self.events.push(StoredEvent {
            id: id.clone(),
            summary: summary.to_string(),
            start: interval.start(),
            end: interval.end(),
            recurrence,
        });
        Ok(id)
    }
}

fn parse_tz(timezone: &str) -> Result<Tz, ServiceError> {
    timezone
        .parse()
        .map_err(|_| ServiceError::Rejected(format!("unknown timezone '{}'", timezone)))
}

fn localize(tz: Tz, naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.fixed_offset())
}
