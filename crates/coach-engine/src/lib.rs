//! # coach-engine
//!
//! Places study sessions for coursework onto a calendar that already has busy time.
//!
//! The engine turns free-text weekly unavailability ("11:00PM-7:00AM") into
//! midnight-safe recurring events, then greedily spreads each assignment's study
//! sessions between now and its due date, stepping around anything already busy.
//!
//! ## Modules
//!
//! - [`timerange`]: `"8:15AM-12:30PM, ..."` → time-of-day ranges, split at midnight
//! - [`recurrence`]: weekly unavailability rules → concrete recurring events
//! - [`busy`]: `Interval` and the sorted `BusyIntervalSet` the scheduler works on
//! - [`scheduler`]: the greedy session placement
//! - [`calendar`]: the Calendar Service capability and `MemoryCalendar`
//! - [`expander`]: weekly RRULE expansion for stored recurring events
//! - [`assignment`]: `Assignment` and the JSON assignment source
//! - [`config`]: scheduler tunables
//! - [`error`]: Error types

pub mod assignment;
pub mod busy;
pub mod calendar;
pub mod config;
pub mod error;
pub mod expander;
pub mod recurrence;
pub mod scheduler;
pub mod timerange;

pub use assignment::{parse_assignments, Assignment, AssignmentSource, JsonAssignments};
pub use busy::{BusyIntervalSet, Interval};
pub use calendar::{CalendarEvent, CalendarService, EventId, MemoryCalendar, ServiceError};
pub use config::SchedulerConfig;
pub use error::CoachError;
pub use recurrence::{commit_rule, expand_rule, next_occurrence, DayCode, WeeklyUnavailabilityRule};
pub use scheduler::{plan, round_up_to_hour, ScheduleOutcome, ScheduleResult, SessionScheduler};
pub use timerange::{parse_time_ranges, split_midnight, TimeRange};
