//! Property tests for the timing arithmetic shared by every engine.
//!
//! All engines run against a `ManualClock`, so each case is exact.

use proptest::prelude::*;
use tickwise_core::{
    CountdownEngine, Event, IntervalEngine, IntervalPlan, ManualClock, StopwatchEngine, Tickable,
    TimerEngine,
};

const T0: u64 = 1_700_000_000_000;

proptest! {
    #[test]
    fn stopwatch_pause_resume_conserves_running_time(
        segments in prop::collection::vec((1u64..600_000, 0u64..3_600_000), 1..12),
    ) {
        let clock = ManualClock::new(T0);
        let mut sw = StopwatchEngine::new(clock.clone());
        sw.start();

        let mut running = 0u64;
        for (run, paused) in &segments {
            clock.advance(*run);
            running += run;
            sw.pause();
            clock.advance(*paused);
            prop_assert_eq!(sw.elapsed_ms(), running);
            sw.resume();
        }
        prop_assert_eq!(sw.elapsed_ms(), running);
    }

    #[test]
    fn countdown_time_left_ignores_pauses(
        total in 60_000u64..7_200_000,
        segments in prop::collection::vec((1u64..60_000, 0u64..600_000), 1..8),
    ) {
        let clock = ManualClock::new(T0);
        let mut cd = CountdownEngine::new(clock.clone());
        cd.start(total as f64).unwrap();

        let mut running = 0u64;
        for (run, paused) in &segments {
            if running + run >= total {
                break;
            }
            clock.advance(*run);
            running += run;
            cd.pause();
            clock.advance(*paused);
            cd.resume();
            prop_assert_eq!(cd.time_left(), total - running);
        }
    }

    #[test]
    fn laps_are_most_recent_first_and_splits_add_up(
        gaps in prop::collection::vec(0u64..120_000, 1..20),
    ) {
        let clock = ManualClock::new(T0);
        let mut sw = StopwatchEngine::new(clock.clone());
        sw.start();
        for gap in &gaps {
            clock.advance(*gap);
            sw.add_lap();
        }

        let laps = sw.laps();
        prop_assert_eq!(laps.len(), gaps.len());
        for pair in laps.windows(2) {
            prop_assert!(pair[0].id > pair[1].id);
            prop_assert!(pair[0].time_ms >= pair[1].time_ms);
        }
        let splits: u64 = laps.iter().map(|l| l.split_ms).sum();
        prop_assert_eq!(splits, laps[0].time_ms);
        prop_assert_eq!(laps[0].time_ms, gaps.iter().sum::<u64>());
    }

    #[test]
    fn interval_session_completes_after_target_loops(
        work in 1_000u64..3_600_000,
        brk in 1_000u64..1_800_000,
        loops in 1u32..6,
    ) {
        let clock = ManualClock::new(T0);
        let mut engine = IntervalEngine::new(clock.clone());
        let plan = IntervalPlan::new(work as f64, brk as f64, Some(i64::from(loops)), None).unwrap();
        engine.start(plan).unwrap();

        let mut switches = 0u32;
        let mut completed = None;
        for boundary in 0..(2 * loops) {
            clock.advance(if boundary % 2 == 0 { work } else { brk });
            match engine.tick() {
                Some(Event::IntervalSwitched { .. }) => switches += 1,
                Some(Event::SessionCompleted { cycle_count, duration_ms, .. }) => {
                    completed = Some((cycle_count, duration_ms));
                }
                other => prop_assert!(false, "unexpected tick result: {:?}", other),
            }
        }

        prop_assert_eq!(switches, 2 * loops - 1);
        prop_assert_eq!(completed, Some((loops, u64::from(loops) * (work + brk))));
        prop_assert!(!engine.polling().is_armed());
        prop_assert_eq!(engine.tick(), None);
    }

    #[test]
    fn restore_is_idempotent(elapsed in 0u64..1_500_000, paused in any::<bool>()) {
        let clock = ManualClock::new(T0);
        let mut original = CountdownEngine::new(clock.clone());
        original.start(1_500_001.0).unwrap();
        clock.advance(elapsed);
        if paused {
            original.pause();
        }
        let snap = original.snapshot();

        let mut first = CountdownEngine::new(clock.clone());
        let mut second = CountdownEngine::new(clock.clone());
        let a = first.restore(&snap);
        let b = second.restore(&first.snapshot());
        prop_assert_eq!(a, b);
        prop_assert_eq!(first.time_left(), second.time_left());
        prop_assert_eq!(first.status(), second.status());
    }
}
