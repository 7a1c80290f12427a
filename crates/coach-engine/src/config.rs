//! Tunables for a scheduling run.

use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};

/// Knobs for the session search and the summaries written to the calendar.
///
/// Every field has a default, so a partial JSON document is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Minutes the search advances after a rejected candidate slot.
    pub step_minutes: u32,
    /// Latest time-of-day a search may sit at; past it the search resumes at
    /// 00:00 the next day.
    pub last_slot: NaiveTime,
    /// Minimum number of days of busy time fetched ahead of the cursor.
    pub horizon_days: u32,
    /// Study events are titled `"<prefix> <assignment name>"`.
    pub session_summary_prefix: String,
    /// Title for weekly unavailable blocks.
    pub unavailable_summary: String,
}

impl SchedulerConfig {
    pub fn step(&self) -> Duration {
        Duration::minutes(i64::from(self.step_minutes.max(1)))
    }

    pub fn horizon(&self) -> Duration {
        Duration::days(i64::from(self.horizon_days))
    }

    pub fn session_summary(&self, assignment: &str) -> String {
        format!("{} {}", self.session_summary_prefix, assignment)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            step_minutes: 15,
            last_slot: NaiveTime::MIN + Duration::minutes(23 * 60 + 45),
            horizon_days: 30,
            session_summary_prefix: "Study for".to_string(),
            unavailable_summary: "Unavailable Time".to_string(),
        }
    }
}
