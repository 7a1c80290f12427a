//! `coach` CLI: block out weekly unavailability and schedule study sessions.
//!
//! ## Usage
//!
//! ```sh
//! # Check how a line of unavailable times is read
//! coach parse "8:15AM-12:30PM, 11:00PM-7:00AM"
//!
//! # Create a calendar and enter unavailable times for each weekday
//! coach setup --calendar coach.json --timezone America/New_York
//!
//! # Schedule study sessions for assignments (JSON from file or stdin)
//! coach schedule --calendar coach.json -a assignments.json
//!
//! # Show events in the next 30 days
//! coach list --calendar coach.json
//! ```

mod prompt;

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use coach_engine::{
    commit_rule, parse_assignments, parse_time_ranges, plan, CalendarService, DayCode,
    MemoryCalendar, ScheduleOutcome, SchedulerConfig, WeeklyUnavailabilityRule,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "coach",
    version,
    about = "Schedule study sessions around your weekly unavailability"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log scheduling decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON file overriding scheduler defaults (step, last slot, horizon, titles)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a line of unavailable times and print the resulting ranges
    Parse {
        /// Ranges such as "8:15AM-12:30PM, 1:00PM-3:00PM"
        text: String,
    },
    /// Enter weekly unavailable times for each day (creates the calendar if needed)
    Setup {
        /// Calendar file
        #[arg(short, long)]
        calendar: PathBuf,
        /// IANA timezone for a newly created calendar
        #[arg(long, default_value = "UTC")]
        timezone: String,
        /// Date the weekly blocks start from (defaults to today in the calendar's timezone)
        #[arg(long, value_parser = parse_date)]
        today: Option<NaiveDate>,
    },
    /// Schedule study sessions for assignments
    Schedule {
        /// Calendar file
        #[arg(short, long)]
        calendar: PathBuf,
        /// Assignments JSON (reads from stdin if omitted)
        #[arg(short, long)]
        assignments: Option<PathBuf>,
        /// IANA timezone for a newly created calendar
        #[arg(long, default_value = "UTC")]
        timezone: String,
        /// Scheduling reference time, e.g. 2024-11-01T08:30 (defaults to now in the calendar's timezone)
        #[arg(long, value_parser = parse_datetime)]
        now: Option<NaiveDateTime>,
    },
    /// List upcoming events
    List {
        /// Calendar file
        #[arg(short, long)]
        calendar: PathBuf,
        /// Start of the listing window (defaults to now in the calendar's timezone)
        #[arg(long, value_parser = parse_datetime)]
        now: Option<NaiveDateTime>,
        /// Number of days to list
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Parse { text } => {
            let ranges = parse_time_ranges(&text).context("Failed to parse time ranges")?;
            for range in ranges {
                println!("{}", range);
            }
        }
        Commands::Setup {
            calendar: path,
            timezone,
            today,
        } => {
            let (mut calendar, _) = MemoryCalendar::load_or_create(&path, &timezone)
                .with_context(|| format!("Failed to open calendar: {}", path.display()))?;
            if calendar.has_weekly_events() {
                bail!(
                    "Calendar {} already has weekly unavailability; running setup again would add a second copy",
                    path.display()
                );
            }
            let today = match today {
                Some(today) => today,
                None => calendar.today().context("Failed to read the calendar clock")?,
            };

            let stdin = io::stdin();
            let mut input = stdin.lock();
            let mut out = io::stdout().lock();

            writeln!(
                out,
                "Please enter times you cannot study. Use this for times when you are sleeping or away."
            )?;
            writeln!(
                out,
                "Enter them in this format for each day: {}",
                prompt::FORMAT_HINT
            )?;

            for day in DayCode::ALL {
                let slots = prompt::read_time_ranges(&mut input, &mut out, day.name())?;
                writeln!(out, "Creating events for {}", day.name())?;

                let rule = WeeklyUnavailabilityRule { day, slots };
                let report = commit_rule(&mut calendar, &rule, today, &config.unavailable_summary);
                for (event, err) in &report.failed {
                    writeln!(out, "Could not create event {}: {}", event.interval, err)?;
                }
            }

            calendar
                .save(&path)
                .with_context(|| format!("Failed to save calendar: {}", path.display()))?;
            writeln!(out, "Saved calendar to {}", path.display())?;
        }
        Commands::Schedule {
            calendar: path,
            assignments,
            timezone,
            now,
        } => {
            let (mut calendar, _) = MemoryCalendar::load_or_create(&path, &timezone)
                .with_context(|| format!("Failed to open calendar: {}", path.display()))?;
            if !calendar.has_weekly_events() {
                tracing::warn!(
                    calendar = %path.display(),
                    "no weekly unavailability set up; run `coach setup` first to keep sessions out of busy times"
                );
            }
            let json = read_input(assignments.as_deref())?;
            let assignments = parse_assignments(&json).context("Failed to read assignments")?;
            let now = match now {
                Some(now) => now,
                None => calendar.now().context("Failed to read the calendar clock")?,
            };

            let results = plan(&mut calendar, &assignments, now, &config)
                .context("Failed to schedule assignments")?;

            for result in &results {
                println!(
                    "{} (due {}): {}/{} sessions",
                    result.name,
                    result.due.format("%Y-%m-%d %H:%M"),
                    result.placed(),
                    result.requested
                );
                for session in &result.sessions {
                    println!("  {}", session.interval);
                }
                match result.outcome {
                    ScheduleOutcome::Scheduled => {}
                    ScheduleOutcome::PastDue => {
                        println!("Warning: The due date for {} has already passed.", result.name)
                    }
                    ScheduleOutcome::Overrun => println!(
                        "Warning: Could not schedule all sessions for {} before the due date.",
                        result.name
                    ),
                }
                if result.failed_commits > 0 {
                    println!(
                        "Warning: {} session(s) for {} could not be saved to the calendar.",
                        result.failed_commits, result.name
                    );
                }
            }

            calendar
                .save(&path)
                .with_context(|| format!("Failed to save calendar: {}", path.display()))?;
        }
        Commands::List {
            calendar: path,
            now,
            days,
        } => {
            let calendar = MemoryCalendar::load(&path)
                .with_context(|| format!("Failed to open calendar: {}", path.display()))?;
            let now = match now {
                Some(now) => now,
                None => calendar.now().context("Failed to read the calendar clock")?,
            };
            let events = calendar
                .list_events(now, now + Duration::days(i64::from(days)))
                .context("Failed to list events")?;

            if events.is_empty() {
                println!("No upcoming events found.");
            }
            for event in events {
                println!(
                    "{}: {}",
                    event.summary,
                    event.start.naive_local().format("%Y-%m-%d %H:%M")
                );
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<SchedulerConfig> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Invalid config: {}", path.display()))
        }
        None => Ok(SchedulerConfig::default()),
    }
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display())),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn parse_datetime(s: &str) -> std::result::Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .map_err(|e| format!("expected YYYY-MM-DDTHH:MM ({})", e))
}

fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD ({})", e))
}
