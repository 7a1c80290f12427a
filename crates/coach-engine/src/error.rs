//! Error types for coach-engine operations.

use thiserror::Error;

use crate::calendar::ServiceError;

#[derive(Error, Debug)]
pub enum CoachError {
    /// Free-text unavailability did not decompose into `H:MM(AM|PM)-H:MM(AM|PM)` ranges.
    #[error("Invalid time range text: {0}")]
    TimeRangeFormat(String),

    #[error("Invalid interval: start {start} is not before end {end}")]
    InvalidInterval { start: String, end: String },

    #[error("Invalid assignment '{name}': {reason}")]
    InvalidAssignment { name: String, reason: String },

    #[error("Invalid day code: {0}")]
    InvalidDayCode(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Recurrence error: {0}")]
    Recurrence(String),

    #[error("Malformed assignment record: {0}")]
    Record(#[from] serde_json::Error),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

pub type Result<T> = std::result::Result<T, CoachError>;
