//! Greedy study-session placement around busy time.
//!
//! Assignments are handled in due-date order. Each one gets `session_count`
//! sessions aimed at evenly spaced targets between the cursor (the next whole hour
//! after "now") and its due time, leaving equal lead and trail gaps:
//!
//! ```text
//! cursor ── gap ── s1 ── gap ── s2 ── gap ── due      (session_count = 2)
//! ```
//!
//! From each target the search walks forward in fixed steps until a slot that
//! overlaps nothing busy is found, or the due time is passed. Every committed
//! session becomes busy time for the sessions and assignments that follow. Nothing
//! is ever moved or retracted once placed.

use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};

use crate::assignment::Assignment;
use crate::busy::{BusyIntervalSet, Interval};
use crate::calendar::{CalendarService, EventId};
use crate::config::SchedulerConfig;
use crate::error::Result;

/// How scheduling one assignment ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// A slot was found for every requested session.
    Scheduled,
    /// Due at or before the cursor; nothing was attempted.
    PastDue,
    /// The search crossed the due time; later sessions were abandoned.
    Overrun,
}

/// A study session committed to the calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedSession {
    pub interval: Interval,
    pub event_id: EventId,
}

/// Per-assignment report of a scheduling run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleResult {
    pub name: String,
    pub due: NaiveDateTime,
    pub requested: u32,
    pub sessions: Vec<PlacedSession>,
    /// Slots that were found but the calendar refused to commit.
    pub failed_commits: u32,
    pub outcome: ScheduleOutcome,
}

impl ScheduleResult {
    pub fn placed(&self) -> u32 {
        self.sessions.len() as u32
    }

    pub fn has_warning(&self) -> bool {
        self.outcome != ScheduleOutcome::Scheduled || self.failed_commits > 0
    }
}

/// The next whole hour strictly after `now`: minutes and seconds zeroed, plus one hour.
pub fn round_up_to_hour(now: NaiveDateTime) -> NaiveDateTime {
    now.date().and_time(NaiveTime::MIN) + Duration::hours(i64::from(now.hour()) + 1)
}

/// Places sessions for a batch of assignments against a working busy set.
pub struct SessionScheduler<'a> {
    config: &'a SchedulerConfig,
}

impl<'a> SessionScheduler<'a> {
    pub fn new(config: &'a SchedulerConfig) -> Self {
        Self { config }
    }

    /// Schedule every assignment, committing sessions through `calendar`.
    ///
    /// `busy` is the run's private timeline: it is read for conflicts and grows by
    /// one interval per committed session. Results are returned in the order the
    /// assignments were processed (stable by due date).
    ///
    /// # Errors
    /// Fails before touching the calendar if any assignment is malformed. Past-due
    /// assignments, overruns and refused commits are reported in the results.
    pub fn schedule<C: CalendarService + ?Sized>(
        &self,
        busy: &mut BusyIntervalSet,
        calendar: &mut C,
        assignments: &[Assignment],
        now: NaiveDateTime,
    ) -> Result<Vec<ScheduleResult>> {
        for assignment in assignments {
            assignment.validate()?;
        }

        let mut ordered: Vec<&Assignment> = assignments.iter().collect();
        ordered.sort_by_key(|a| a.due().date());

        let cursor = round_up_to_hour(now);
        let mut results = Vec::with_capacity(ordered.len());
        for assignment in ordered {
            results.push(self.schedule_one(busy, calendar, assignment, cursor)?);
        }
        Ok(results)
    }

    fn schedule_one<C: CalendarService + ?Sized>(
        &self,
        busy: &mut BusyIntervalSet,
        calendar: &mut C,
        assignment: &Assignment,
        cursor: NaiveDateTime,
    ) -> Result<ScheduleResult> {
        let name = assignment.name();
        let due = assignment.due();
        let requested = assignment.session_count();
        let mut result = ScheduleResult {
            name: name.to_string(),
            due,
            requested,
            sessions: Vec::new(),
            failed_commits: 0,
            outcome: ScheduleOutcome::Scheduled,
        };

        tracing::info!(assignment = name, %due, "scheduling");

        if due <= cursor {
            tracing::warn!(assignment = name, %due, "due date has already passed");
            result.outcome = ScheduleOutcome::PastDue;
            return Ok(result);
        }

        let duration = Duration::minutes(i64::from(assignment.session_duration()));
        let gap_secs = (due - cursor).num_seconds() as f64 / (f64::from(requested) + 1.0);
        let summary = self.config.session_summary(name);

        for k in 1..=requested {
            let offset = Duration::microseconds((gap_secs * f64::from(k) * 1e6).round() as i64);
            let target = cursor + offset;

            let Some(slot) = self.find_slot(busy, cursor.max(target), duration, due)? else {
                tracing::warn!(
                    assignment = name,
                    placed = result.placed(),
                    requested,
                    "could not schedule all sessions before the due date"
                );
                result.outcome = ScheduleOutcome::Overrun;
                break;
            };

            match calendar.create_event(&slot, &summary, None) {
                Ok(event_id) => {
                    tracing::debug!(assignment = name, session = k, interval = %slot, "placed session");
                    busy.insert(slot);
                    result.sessions.push(PlacedSession {
                        interval: slot,
                        event_id,
                    });
                }
                Err(err) => {
                    tracing::warn!(
                        interval = %slot,
                        summary = %summary,
                        error = %err,
                        "failed to create study event"
                    );
                    result.failed_commits += 1;
                }
            }
        }

        tracing::info!(
            assignment = name,
            placed = result.placed(),
            requested,
            "finished scheduling"
        );
        Ok(result)
    }

    /// Walk forward from `search` until `[search, search + duration)` is free.
    ///
    /// Returns `None` once the search start passes `due`.
    fn find_slot(
        &self,
        busy: &BusyIntervalSet,
        mut search: NaiveDateTime,
        duration: Duration,
        due: NaiveDateTime,
    ) -> Result<Option<Interval>> {
        while search <= due {
            let candidate = Interval::new(search, search + duration)?;
            if !busy.overlaps(&candidate) {
                return Ok(Some(candidate));
            }
            search = self.advance(search);
        }
        Ok(None)
    }

    /// One search step; past the last slot of the day, resume at next midnight.
    fn advance(&self, search: NaiveDateTime) -> NaiveDateTime {
        let next = search + self.config.step();
        if next.time() > self.config.last_slot {
            (next.date() + Duration::days(1)).and_time(NaiveTime::MIN)
        } else {
            next
        }
    }
}

/// Fetch busy time from `calendar` and schedule `assignments` against it.
///
/// Busy time is read from `now` to the later of the configured horizon past the
/// cursor and the latest due date, so no assignment's window is left unchecked.
///
/// # Errors
/// Fails if an assignment is malformed or the busy-time fetch fails; in both
/// cases nothing has been written.
pub fn plan<C: CalendarService + ?Sized>(
    calendar: &mut C,
    assignments: &[Assignment],
    now: NaiveDateTime,
    config: &SchedulerConfig,
) -> Result<Vec<ScheduleResult>> {
    for assignment in assignments {
        assignment.validate()?;
    }

    let cursor = round_up_to_hour(now);
    let latest_due = assignments
        .iter()
        .map(Assignment::due)
        .max()
        .unwrap_or(cursor);
    let time_max = (cursor + config.horizon()).max(latest_due);

    let mut busy = calendar.list_busy(now, time_max)?;
    tracing::info!(busy = busy.len(), %time_max, "loaded busy intervals");

    SessionScheduler::new(config).schedule(&mut busy, calendar, assignments, now)
}
