//! Integration tests for persistence across process restarts.
//!
//! Each test plays two "processes": one engine writes its snapshot to an
//! on-disk database, a fresh engine with a later clock restores from it.

use std::sync::{Arc, Mutex};

use tickwise_core::storage::{load_snapshot, save_snapshot};
use tickwise_core::timer::IntervalSnapshot;
use tickwise_core::{
    CompletionContext, CompletionSettings, CountdownEngine, Database, Event, Feedback,
    IntervalEngine, IntervalKind, IntervalPlan, ManualClock, RestoreOutcome, StopwatchEngine,
    Tickable, TimerEngine, TimerMode,
};

const T0: u64 = 1_700_000_000_000;
const MIN: u64 = 60_000;

fn temp_db() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open_at(&dir.path().join("tickwise.db")).unwrap();
    (dir, db)
}

#[test]
fn test_countdown_survives_restart() {
    let (_dir, db) = temp_db();
    let clock = ManualClock::new(T0);

    let mut first = CountdownEngine::new(clock.clone());
    first.start((10 * MIN) as f64).unwrap();
    clock.advance(3 * MIN);
    save_snapshot(&db, TimerMode::Countdown, &first.snapshot()).unwrap();
    drop(first);

    clock.advance(2 * MIN);
    let mut second = CountdownEngine::new(clock.clone());
    let outcome = second.restore(&load_snapshot(&db, TimerMode::Countdown));
    assert_eq!(outcome, RestoreOutcome::Running);
    assert_eq!(second.time_left(), 5 * MIN);
    assert!(second.polling().is_armed());
}

#[test]
fn test_expired_countdown_restores_stopped_without_completion() {
    let (_dir, db) = temp_db();
    let clock = ManualClock::new(T0);
    let fired = Arc::new(Mutex::new(0u32));

    let mut first = CountdownEngine::new(clock.clone());
    first.start(MIN as f64).unwrap();
    save_snapshot(&db, TimerMode::Countdown, &first.snapshot()).unwrap();

    clock.advance(5 * MIN);
    let counter = fired.clone();
    let completion = CompletionContext::new(CompletionSettings::default(), Feedback::default())
        .on_timer_complete(move || *counter.lock().unwrap() += 1);
    let mut second = CountdownEngine::new(clock.clone()).with_completion(completion);
    let outcome = second.restore(&load_snapshot(&db, TimerMode::Countdown));

    assert_eq!(outcome, RestoreOutcome::Expired);
    assert!(!second.state().is_active);
    assert_eq!(second.tick(), None);
    assert_eq!(*fired.lock().unwrap(), 0);
}

#[test]
fn test_paused_stopwatch_does_not_accrue_while_stored() {
    let (_dir, db) = temp_db();
    let clock = ManualClock::new(T0);

    let mut first = StopwatchEngine::new(clock.clone());
    first.start();
    clock.advance(90_000);
    first.add_lap();
    first.pause();
    save_snapshot(&db, TimerMode::Stopwatch, &first.snapshot()).unwrap();

    clock.advance(24 * 60 * MIN);
    let mut second = StopwatchEngine::new(clock.clone());
    let outcome = second.restore(&load_snapshot(&db, TimerMode::Stopwatch));
    assert_eq!(outcome, RestoreOutcome::Paused);
    assert_eq!(second.elapsed_ms(), 90_000);
    assert_eq!(second.laps().len(), 1);

    second.resume();
    clock.advance(10_000);
    assert_eq!(second.elapsed_ms(), 100_000);
}

#[test]
fn test_interval_restored_mid_session_completes_and_records_history() {
    let (_dir, db) = temp_db();
    let clock = ManualClock::new(T0);

    let mut first = IntervalEngine::new(clock.clone());
    let plan = IntervalPlan::from_minutes(25.0, 5.0, Some(2), Some("Deep work".into())).unwrap();
    first.start(plan).unwrap();
    clock.advance(25 * MIN);
    first.tick();
    clock.advance(5 * MIN);
    first.tick();
    clock.advance(10 * MIN);
    assert_eq!(first.interval_count(), 1);
    save_snapshot(&db, TimerMode::Interval, &first.snapshot()).unwrap();
    drop(first);

    // The second process records completed sessions into the same database.
    let history = Arc::new(Mutex::new(db));
    let recorder = history.clone();
    let completion = CompletionContext::new(CompletionSettings::default(), Feedback::default())
        .on_session_complete(move |summary| {
            recorder.lock().unwrap().record_session(summary)?;
            Ok(())
        });

    let mut second = IntervalEngine::new(clock.clone()).with_completion(completion);
    let snapshot: IntervalSnapshot = load_snapshot(&*history.lock().unwrap(), TimerMode::Interval);
    assert_eq!(second.restore(&snapshot), RestoreOutcome::Running);
    assert_eq!(second.current_interval(), IntervalKind::Work);
    assert_eq!(second.time_left(), 15 * MIN);

    clock.advance(15 * MIN);
    assert!(matches!(second.tick(), Some(Event::IntervalSwitched { .. })));
    clock.advance(5 * MIN);
    let Some(Event::SessionCompleted {
        cycle_count,
        duration_ms,
        session_name,
        ..
    }) = second.tick()
    else {
        panic!("expected session completion");
    };
    assert_eq!(cycle_count, 2);
    assert_eq!(duration_ms, 60 * MIN);
    assert_eq!(session_name.as_deref(), Some("Deep work"));

    let records = history.lock().unwrap().list_sessions(10).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].mode, "interval");
    assert_eq!(records[0].cycle_count, 2);
    assert_eq!(records[0].duration_ms, 60 * MIN);
}

#[test]
fn test_snapshot_from_older_build_approximates_session_start() {
    let clock = ManualClock::new(T0);
    // Second work phase, 10 minutes in, no session start recorded.
    let snapshot = IntervalSnapshot {
        is_active: true,
        current_interval: IntervalKind::Work,
        interval_count: 1,
        work_duration: 25 * MIN,
        break_duration: 5 * MIN,
        interval_start_time: Some(T0 - 10 * MIN),
        ..Default::default()
    };
    let mut engine = IntervalEngine::new(clock.clone());
    assert_eq!(engine.restore(&snapshot), RestoreOutcome::Running);
    assert_eq!(engine.session_elapsed(), 40 * MIN);
}

#[test]
fn test_unparseable_snapshot_restores_idle() {
    let (_dir, db) = temp_db();
    db.kv_set("snapshot.interval", "{\"is_active\": \"yes\"").unwrap();
    let clock = ManualClock::new(T0);
    let mut engine = IntervalEngine::new(clock);
    let outcome = engine.restore(&load_snapshot(&db, TimerMode::Interval));
    assert_eq!(outcome, RestoreOutcome::Idle);
    assert!(!engine.polling().is_armed());
}
