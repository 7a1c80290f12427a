//! Assignments to be scheduled, and the capability that produces them.
//!
//! How assignment details are gathered (a conversation, a form, a file) is not the
//! engine's concern; anything implementing [`AssignmentSource`] will do. The JSON
//! source reads the record shape produced by the conversational extractor:
//!
//! ```json
//! {"name": "Calculus Exam", "due date": "2024-03-19", "due time": "14:00",
//!  "time_allocated": 180, "sessions": 4}
//! ```

use std::io::Read;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;

use crate::error::{CoachError, Result};

/// One piece of coursework to spread study sessions over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    name: String,
    due: NaiveDateTime,
    total_minutes: u32,
    session_count: u32,
}

impl Assignment {
    /// # Errors
    /// Returns `CoachError::InvalidAssignment` if either count is zero, or if the
    /// total is too small to give every session at least one minute.
    pub fn new(
        name: impl Into<String>,
        due: NaiveDateTime,
        total_minutes: u32,
        session_count: u32,
    ) -> Result<Self> {
        let assignment = Self {
            name: name.into(),
            due,
            total_minutes,
            session_count,
        };
        assignment.validate()?;
        Ok(assignment)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn due(&self) -> NaiveDateTime {
        self.due
    }

    pub fn total_minutes(&self) -> u32 {
        self.total_minutes
    }

    pub fn session_count(&self) -> u32 {
        self.session_count
    }

    /// Minutes per session. Floor division: leftover minutes are not scheduled.
    pub fn session_duration(&self) -> u32 {
        self.total_minutes / self.session_count
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| CoachError::InvalidAssignment {
            name: self.name.clone(),
            reason: reason.to_string(),
        };
        if self.total_minutes == 0 {
            return Err(invalid("total study time must be positive"));
        }
        if self.session_count == 0 {
            return Err(invalid("session count must be positive"));
        }
        if self.total_minutes < self.session_count {
            return Err(invalid("total study time is shorter than one minute per session"));
        }
        Ok(())
    }
}

/// Produces the assignments for a scheduling run.
pub trait AssignmentSource {
    fn assignments(&mut self) -> Result<Vec<Assignment>>;
}

/// Wire shape of one extracted assignment.
#[derive(Debug, Deserialize)]
struct AssignmentRecord {
    name: String,
    #[serde(rename = "due date")]
    due_date: String,
    #[serde(rename = "due time")]
    due_time: String,
    time_allocated: u32,
    sessions: u32,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Records {
    Many(Vec<AssignmentRecord>),
    One(AssignmentRecord),
}

impl TryFrom<AssignmentRecord> for Assignment {
    type Error = CoachError;

    fn try_from(record: AssignmentRecord) -> Result<Self> {
        let invalid = |reason: String| CoachError::InvalidAssignment {
            name: record.name.clone(),
            reason,
        };
        let date = NaiveDate::parse_from_str(record.due_date.trim(), "%Y-%m-%d")
            .map_err(|e| invalid(format!("due date '{}': {}", record.due_date, e)))?;
        let time = NaiveTime::parse_from_str(record.due_time.trim(), "%H:%M")
            .map_err(|e| invalid(format!("due time '{}': {}", record.due_time, e)))?;

        Assignment::new(
            record.name.clone(),
            date.and_time(time),
            record.time_allocated,
            record.sessions,
        )
    }
}

/// Assignments read from a JSON document: one record or an array of records.
pub struct JsonAssignments<R> {
    reader: R,
}

impl<R: Read> JsonAssignments<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: Read> AssignmentSource for JsonAssignments<R> {
    fn assignments(&mut self) -> Result<Vec<Assignment>> {
        let records: Records = serde_json::from_reader(&mut self.reader)?;
        let records = match records {
            Records::Many(records) => records,
            Records::One(record) => vec![record],
        };
        records.into_iter().map(Assignment::try_from).collect()
    }
}

/// Parse assignments from a JSON string.
pub fn parse_assignments(json: &str) -> Result<Vec<Assignment>> {
    JsonAssignments::new(json.as_bytes()).assignments()
}
