//! Integration tests for the `coach` CLI binary.
//!
//! These run the parse, setup, schedule and list subcommands through the actual
//! binary against calendar files in a temporary directory.

// `Command::cargo_bin` was deprecated in assert_cmd 2.1.2 in favor of
// `cargo::cargo_bin_cmd!`. Allow it until we migrate.
#![allow(deprecated)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use chrono::{Duration, NaiveDateTime};
use coach_engine::MemoryCalendar;
use predicates::prelude::*;
use tempfile::TempDir;

/// Helper: path to the assignments.json fixture.
fn assignments_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/assignments.json")
}

/// Helper: a scratch directory and the calendar path inside it.
fn scratch() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("coach.json");
    (dir, path)
}

fn coach() -> Command {
    Command::cargo_bin("coach").unwrap()
}

fn setup(calendar: &Path, stdin: &str) -> assert_cmd::assert::Assert {
    coach()
        .args(["setup", "--today", "2024-11-01", "--calendar"])
        .arg(calendar)
        .write_stdin(stdin.to_string())
        .assert()
}

// ─────────────────────────────────────────────────────────────────────────────
// Parse subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn parse_prints_split_ranges() {
    coach()
        .args(["parse", "8:15AM-12:30PM, 11:00PM-1:00AM"])
        .assert()
        .success()
        .stdout("08:15-12:30\n23:00-23:59\n00:00-01:00\n");
}

#[test]
fn parse_rejects_bad_format() {
    coach()
        .args(["parse", "9am to 5pm"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse time ranges"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Setup subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn setup_writes_weekly_blocks() {
    let (_dir, calendar) = scratch();
    // Monday overnight, Tuesday typo then blank, remaining days blank.
    let stdin = format!("11:00PM-7:00AM\nlunch\n{}", "\n".repeat(6));

    setup(&calendar, &stdin)
        .success()
        .stdout(predicate::str::contains("Enter unavailable times for Monday"))
        .stdout(predicate::str::contains("Incorrect format").count(1))
        .stdout(predicate::str::contains("Creating events for Sunday"))
        .stdout(predicate::str::contains("Saved calendar to"));

    assert!(calendar.exists());

    coach()
        .args(["list", "--now", "2024-11-04T00:00", "--days", "2", "--calendar"])
        .arg(&calendar)
        .assert()
        .success()
        .stdout("Unavailable Time: 2024-11-04 23:00\nUnavailable Time: 2024-11-05 00:00\n");
}

#[test]
fn setup_refuses_to_duplicate_weekly_blocks() {
    let (_dir, calendar) = scratch();
    let monday_only = format!("9:00AM-5:00PM\n{}", "\n".repeat(6));
    setup(&calendar, &monday_only).success();

    // Refused before any prompt, so no input is needed.
    coach()
        .args(["setup", "--calendar"])
        .arg(&calendar)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already has weekly unavailability"));

    let saved = MemoryCalendar::load(&calendar).unwrap();
    assert_eq!(saved.events().len(), 1);
}

#[test]
fn setup_fails_when_input_runs_out() {
    let (_dir, calendar) = scratch();

    setup(&calendar, "9:00AM-5:00PM\n")
        .failure()
        .stderr(predicate::str::contains("Tuesday"));

    assert!(!calendar.exists(), "nothing is saved on a failed setup");
}

// ─────────────────────────────────────────────────────────────────────────────
// Schedule subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn schedule_places_sessions_from_file() {
    let (_dir, calendar) = scratch();

    coach()
        .args(["schedule", "--now", "2024-11-01T14:10", "-a", assignments_path(), "-c"])
        .arg(&calendar)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "History Essay (due 2024-11-01 23:00): 1/1 sessions\n  2024-11-01 19:00 - 2024-11-01 20:00\n",
        ))
        .stdout(predicate::str::contains(
            "Calculus Exam (due 2024-11-03 15:00): 2/2 sessions\n  2024-11-02 07:00 - 2024-11-02 08:30\n  2024-11-02 23:00 - 2024-11-03 00:30\n",
        ))
        .stdout(predicate::str::contains("Warning").not());

    coach()
        .args(["list", "--now", "2024-11-01T00:00", "--days", "3", "--calendar"])
        .arg(&calendar)
        .assert()
        .success()
        .stdout(
            "Study for History Essay: 2024-11-01 19:00\n\
             Study for Calculus Exam: 2024-11-02 07:00\n\
             Study for Calculus Exam: 2024-11-02 23:00\n",
        );
}

#[test]
fn schedule_works_around_setup_blocks() {
    let (_dir, calendar) = scratch();
    // Friday 6PM-9PM is blocked; 2024-11-01 is a Friday.
    setup(&calendar, "\n\n\n\n6:00PM-9:00PM\n\n\n").success();

    let assignment = r#"{"name": "Lab Report", "due date": "2024-11-01", "due time": "23:00",
                         "time_allocated": 60, "sessions": 1}"#;

    coach()
        .args(["schedule", "--now", "2024-11-01T14:10", "--calendar"])
        .arg(&calendar)
        .write_stdin(assignment)
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-11-01 21:00 - 2024-11-01 22:00"));
}

#[test]
fn schedule_warns_for_past_due() {
    let (_dir, calendar) = scratch();
    let assignment = r#"{"name": "Quiz", "due date": "2024-11-01", "due time": "09:00",
                         "time_allocated": 30, "sessions": 1}"#;

    coach()
        .args(["schedule", "--now", "2024-11-01T10:00", "--calendar"])
        .arg(&calendar)
        .write_stdin(assignment)
        .assert()
        .success()
        .stdout(predicate::str::contains("Quiz (due 2024-11-01 09:00): 0/1 sessions"))
        .stdout(predicate::str::contains(
            "Warning: The due date for Quiz has already passed.",
        ));
}

#[test]
fn schedule_warns_without_unavailability() {
    let (_dir, calendar) = scratch();
    let assignment = r#"{"name": "Quiz", "due date": "2024-11-01", "due time": "20:00",
                         "time_allocated": 30, "sessions": 1}"#;

    coach()
        .args(["schedule", "--now", "2024-11-01T10:00", "--calendar"])
        .arg(&calendar)
        .write_stdin(assignment)
        .assert()
        .success()
        .stderr(predicate::str::contains("no weekly unavailability set up"));
}

/// Assignment JSON due at `due`, one 60-minute session.
fn due_at(name: &str, due: NaiveDateTime) -> String {
    format!(
        r#"{{"name": "{}", "due date": "{}", "due time": "{}", "time_allocated": 60, "sessions": 1}}"#,
        name,
        due.format("%Y-%m-%d"),
        due.format("%H:%M")
    )
}

#[test]
fn schedule_reads_now_on_the_calendar_clock_ahead_of_utc() {
    // UTC+14: two hours before the calendar's "now" is already past due,
    // whatever zone the machine runs in.
    let (_dir, calendar) = scratch();
    let zone_now = MemoryCalendar::new("Pacific/Kiritimati").unwrap().now().unwrap();

    coach()
        .args(["schedule", "--timezone", "Pacific/Kiritimati", "--calendar"])
        .arg(&calendar)
        .write_stdin(due_at("Recital", zone_now - Duration::hours(2)))
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Warning: The due date for Recital has already passed.",
        ));
}

#[test]
fn schedule_reads_now_on_the_calendar_clock_behind_utc() {
    // UTC-11: a session due four hours from the calendar's "now" fits, and it
    // starts after that "now".
    let (_dir, calendar) = scratch();
    let zone_now = MemoryCalendar::new("Pacific/Pago_Pago").unwrap().now().unwrap();

    let output = coach()
        .args(["schedule", "--timezone", "Pacific/Pago_Pago", "--calendar"])
        .arg(&calendar)
        .write_stdin(due_at("Report", zone_now + Duration::hours(4)))
        .assert()
        .success()
        .stdout(predicate::str::contains("Report (due"))
        .stdout(predicate::str::contains("1/1 sessions"))
        .get_output()
        .stdout
        .clone();

    let stdout = String::from_utf8(output).unwrap();
    let session = stdout
        .lines()
        .find_map(|line| line.strip_prefix("  "))
        .unwrap();
    let start = NaiveDateTime::parse_from_str(&session[..16], "%Y-%m-%d %H:%M").unwrap();
    assert!(start >= zone_now, "session {} before calendar now {}", start, zone_now);
}

#[test]
fn schedule_rejects_malformed_assignments() {
    let (_dir, calendar) = scratch();

    coach()
        .args(["schedule", "--now", "2024-11-01T10:00", "--calendar"])
        .arg(&calendar)
        .write_stdin(r#"{"name": "Quiz"}"#)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read assignments"));

    assert!(!calendar.exists());
}

#[test]
fn schedule_uses_config_titles() {
    let (dir, calendar) = scratch();
    let config = dir.path().join("config.json");
    std::fs::write(&config, r#"{"session_summary_prefix": "Review"}"#).unwrap();
    let assignment = r#"{"name": "Essay", "due date": "2024-11-01", "due time": "23:00",
                         "time_allocated": 60, "sessions": 1}"#;

    coach()
        .args(["schedule", "--now", "2024-11-01T14:10", "--config"])
        .arg(&config)
        .arg("--calendar")
        .arg(&calendar)
        .write_stdin(assignment)
        .assert()
        .success();

    coach()
        .args(["list", "--now", "2024-11-01T00:00", "--calendar"])
        .arg(&calendar)
        .assert()
        .success()
        .stdout("Review Essay: 2024-11-01 19:00\n");
}

// ─────────────────────────────────────────────────────────────────────────────
// List subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn list_empty_calendar() {
    let (_dir, calendar) = scratch();
    setup(&calendar, &"\n".repeat(7)).success();

    coach()
        .args(["list", "--now", "2024-11-01T00:00", "--calendar"])
        .arg(&calendar)
        .assert()
        .success()
        .stdout("No upcoming events found.\n");
}

#[test]
fn list_missing_calendar_fails() {
    let (_dir, calendar) = scratch();

    coach()
        .args(["list", "--calendar"])
        .arg(&calendar)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open calendar"));
}
