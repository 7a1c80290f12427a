//! Property-based tests for session placement using proptest.
//!
//! These check invariants that must hold for any busy timeline and any batch of
//! assignments, not just the hand-worked cases in `scheduler_tests.rs`.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use coach_engine::{
    round_up_to_hour, split_midnight, Assignment, BusyIntervalSet, Interval, MemoryCalendar,
    ScheduleOutcome, SchedulerConfig, SessionScheduler, TimeRange,
};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn base() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 11, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// "Now" somewhere on the first day, to the second.
fn arb_now() -> impl Strategy<Value = NaiveDateTime> {
    (0i64..86_400).prop_map(|secs| base() + Duration::seconds(secs))
}

/// Busy blocks over the first ten days, 15 minutes to 5 hours long.
fn arb_busy() -> impl Strategy<Value = Vec<Interval>> {
    prop::collection::vec((0i64..10 * 24 * 4, 1i64..=20), 0..40).prop_map(|blocks| {
        blocks
            .into_iter()
            .map(|(quarter, len)| {
                let start = base() + Duration::minutes(quarter * 15);
                Interval::new(start, start + Duration::minutes(len * 15)).unwrap()
            })
            .collect()
    })
}

/// (due offset in minutes from base, total minutes, session count), total >= count.
fn arb_assignment() -> impl Strategy<Value = (i64, u32, u32)> {
    (0i64..12 * 24 * 60, 1u32..=6, 1u32..=120, 0u32..=5)
        .prop_map(|(due, count, per, extra)| (due, count * per + extra.min(count - 1), count))
}

fn arb_assignments() -> impl Strategy<Value = Vec<(i64, u32, u32)>> {
    prop::collection::vec(arb_assignment(), 0..6)
}

fn arb_range() -> impl Strategy<Value = TimeRange> {
    (0u32..24 * 60, 0u32..24 * 60).prop_map(|(s, e)| {
        let t = |m: u32| NaiveTime::from_hms_opt(m / 60, m % 60, 0).unwrap();
        TimeRange::new(t(s), t(e))
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn build(specs: &[(i64, u32, u32)]) -> Vec<Assignment> {
    specs
        .iter()
        .enumerate()
        .map(|(i, &(due, total, count))| {
            Assignment::new(
                format!("A{}", i),
                base() + Duration::minutes(due),
                total,
                count,
            )
            .unwrap()
        })
        .collect()
}

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 64,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Property 1: placed sessions never collide with busy time or each other
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn sessions_never_overlap(
        now in arb_now(),
        initial in arb_busy(),
        specs in arb_assignments(),
    ) {
        let assignments = build(&specs);
        let cfg = SchedulerConfig::default();
        let mut busy: BusyIntervalSet = initial.iter().copied().collect();
        let mut calendar = MemoryCalendar::new("UTC").unwrap();

        let results = SessionScheduler::new(&cfg)
            .schedule(&mut busy, &mut calendar, &assignments, now)
            .unwrap();

        let placed: Vec<Interval> = results
            .iter()
            .flat_map(|r| r.sessions.iter().map(|s| s.interval))
            .collect();

        for (i, a) in placed.iter().enumerate() {
            for b in &initial {
                prop_assert!(!a.overlaps(b), "session {} overlaps busy {}", a, b);
            }
            for b in &placed[i + 1..] {
                prop_assert!(!a.overlaps(b), "sessions {} and {} overlap", a, b);
            }
        }
        prop_assert_eq!(busy.len(), initial.len() + placed.len());
        prop_assert_eq!(calendar.events().len(), placed.len());
    }
}

// ---------------------------------------------------------------------------
// Property 2: each session has the per-session length and sits in its window
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn sessions_fit_their_window(
        now in arb_now(),
        initial in arb_busy(),
        specs in arb_assignments(),
    ) {
        let assignments = build(&specs);
        let cfg = SchedulerConfig::default();
        let mut busy: BusyIntervalSet = initial.into_iter().collect();
        let mut calendar = MemoryCalendar::new("UTC").unwrap();
        let cursor = round_up_to_hour(now);

        let results = SessionScheduler::new(&cfg)
            .schedule(&mut busy, &mut calendar, &assignments, now)
            .unwrap();

        prop_assert_eq!(results.len(), assignments.len());
        for result in &results {
            let assignment = assignments.iter().find(|a| a.name() == result.name).unwrap();
            prop_assert!(result.placed() <= result.requested);
            for session in &result.sessions {
                prop_assert_eq!(
                    session.interval.duration_minutes(),
                    i64::from(assignment.session_duration())
                );
                prop_assert!(session.interval.start() >= cursor);
                prop_assert!(session.interval.start() <= result.due);
            }
            match result.outcome {
                ScheduleOutcome::Scheduled => prop_assert_eq!(result.placed(), result.requested),
                ScheduleOutcome::PastDue => {
                    prop_assert!(result.due <= cursor);
                    prop_assert!(result.sessions.is_empty());
                }
                ScheduleOutcome::Overrun => prop_assert!(result.placed() < result.requested),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Property 3: results follow due dates
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn results_are_in_due_date_order(now in arb_now(), specs in arb_assignments()) {
        let assignments = build(&specs);
        let cfg = SchedulerConfig::default();
        let mut busy = BusyIntervalSet::new();
        let mut calendar = MemoryCalendar::new("UTC").unwrap();

        let results = SessionScheduler::new(&cfg)
            .schedule(&mut busy, &mut calendar, &assignments, now)
            .unwrap();

        for pair in results.windows(2) {
            prop_assert!(pair[0].due.date() <= pair[1].due.date());
        }
    }
}

// ---------------------------------------------------------------------------
// Property 4: midnight splitting
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn split_is_idempotent(ranges in prop::collection::vec(arb_range(), 0..8)) {
        let once = split_midnight(&ranges);
        let twice = split_midnight(&once);

        prop_assert_eq!(&once, &twice);
        for r in &once {
            prop_assert!(!r.wraps_midnight(), "{} still wraps", r);
        }
    }
}
