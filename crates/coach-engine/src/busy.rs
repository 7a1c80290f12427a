//! Busy intervals: the working timeline the scheduler places sessions against.
//!
//! Times are naive local wall-clock values. Events fetched from a calendar carry
//! UTC offsets; those are dropped on the way in so that a busy block and a
//! candidate session are always compared on the same clock.
//!
//! Overlapping members are allowed and never merged. Boundaries that merely touch
//! (one interval ends exactly when the other starts) do NOT overlap.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::calendar::CalendarEvent;
use crate::error::{CoachError, Result};

/// A half-open `[start, end)` time block with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl Interval {
    /// # Errors
    /// Returns `CoachError::InvalidInterval` unless `start < end`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        if start >= end {
            return Err(CoachError::InvalidInterval {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// `a.start < b.end && b.start < a.end`; adjacency is not an overlap.
    pub fn overlaps(&self, other: &Interval) -> bool {
        !(self.start >= other.end || self.end <= other.start)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%Y-%m-%d %H:%M")
        )
    }
}

/// Ordered collection of busy intervals, sorted ascending by start.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BusyIntervalSet {
    intervals: Vec<Interval>,
}

impl BusyIntervalSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from calendar events, stripping each event's UTC offset.
    ///
    /// The wall-clock reading of the event in its own offset is kept. Events
    /// whose stripped end is not after their start are skipped.
    pub fn from_calendar(events: &[CalendarEvent]) -> Self {
        let mut set = Self::new();
        for event in events {
            match Interval::new(event.start.naive_local(), event.end.naive_local()) {
                Ok(interval) => set.insert(interval),
                Err(err) => {
                    tracing::warn!(event = %event.summary, error = %err, "skipping calendar event");
                }
            }
        }
        set
    }

    /// Insert keeping ascending start order. Equal starts keep insertion order.
    pub fn insert(&mut self, interval: Interval) {
        let pos = self
            .intervals
            .partition_point(|member| member.start <= interval.start);
        self.intervals.insert(pos, interval);
    }

    /// True iff `candidate` overlaps at least one member.
    pub fn overlaps(&self, candidate: &Interval) -> bool {
        // Members starting at or after candidate.end cannot overlap it.
        let upper = self
            .intervals
            .partition_point(|member| member.start < candidate.end);
        self.intervals[..upper]
            .iter()
            .any(|member| member.overlaps(candidate))
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interval> {
        self.intervals.iter()
    }

    pub fn as_slice(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn into_intervals(self) -> Vec<Interval> {
        self.intervals
    }
}

impl FromIterator<Interval> for BusyIntervalSet {
    fn from_iter<I: IntoIterator<Item = Interval>>(iter: I) -> Self {
        let mut set = Self::new();
        for interval in iter {
            set.insert(interval);
        }
        set
    }
}
