//! Open-ended stopwatch with laps.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::base::TimerState;
use super::polling::Polling;
use super::snapshot::{RestoreOutcome, StopwatchSnapshot};
use super::{KillSummary, Tickable, TimerEngine, TimerMode};
use crate::clock::{to_datetime, Clock, Millis};
use crate::events::Event;

const MINUTE_MS: Millis = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lap {
    pub id: u32,
    /// Total elapsed time when the lap was taken.
    pub time_ms: Millis,
    /// Time since the previous lap (or since start for the first lap).
    pub split_ms: Millis,
}

#[derive(Debug)]
pub struct StopwatchEngine {
    clock: Arc<dyn Clock>,
    state: TimerState,
    /// Most recent first.
    laps: Vec<Lap>,
    next_lap_id: u32,
    /// Last value published by `tick`.
    elapsed_ms: Millis,
    polling: Polling,
}

impl StopwatchEngine {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: TimerState::default(),
            laps: Vec::new(),
            next_lap_id: 1,
            elapsed_ms: 0,
            polling: Polling::default(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn laps(&self) -> &[Lap] {
        &self.laps
    }

    pub fn elapsed_ms(&self) -> Millis {
        self.state.elapsed(self.clock.now_ms())
    }

    /// Sweep of the current minute, for a rotating indicator.
    pub fn progress(&self) -> f64 {
        minute_sweep(self.elapsed_ms())
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        let now = self.clock.now_ms();
        if !self.state.start(now) {
            return None;
        }
        self.laps.clear();
        self.next_lap_id = 1;
        self.elapsed_ms = 0;
        self.polling.arm();
        info!("stopwatch started");
        Some(Event::TimerStarted {
            mode: TimerMode::Stopwatch,
            duration_ms: None,
            at: to_datetime(now),
        })
    }

    /// Record a lap. Only allowed while running.
    pub fn add_lap(&mut self) -> Option<Event> {
        if !self.state.is_active {
            debug!("lap ignored: stopwatch is not running");
            return None;
        }
        let now = self.clock.now_ms();
        let elapsed = self.state.elapsed(now);
        let previous = self.laps.first().map(|l| l.time_ms).unwrap_or(0);
        let lap = Lap {
            id: self.next_lap_id,
            time_ms: elapsed,
            split_ms: elapsed.saturating_sub(previous),
        };
        self.next_lap_id += 1;
        self.laps.insert(0, lap);
        self.elapsed_ms = elapsed;
        Some(Event::LapRecorded {
            lap,
            at: to_datetime(now),
        })
    }
}

impl Tickable for StopwatchEngine {
    fn polling(&self) -> Polling {
        self.polling
    }

    fn tick(&mut self) -> Option<Event> {
        if !self.polling.is_armed() || !self.state.is_active {
            return None;
        }
        self.elapsed_ms = self.state.elapsed(self.clock.now_ms());
        None
    }
}

impl TimerEngine for StopwatchEngine {
    type Snapshot = StopwatchSnapshot;

    const MODE: TimerMode = TimerMode::Stopwatch;

    fn pause(&mut self) -> Option<Event> {
        let now = self.clock.now_ms();
        let elapsed = self.state.elapsed(now);
        if !self.state.pause_at(elapsed) {
            debug!("pause ignored: stopwatch is not running");
            return None;
        }
        self.polling.cancel();
        self.elapsed_ms = elapsed;
        Some(Event::TimerPaused {
            mode: TimerMode::Stopwatch,
            elapsed_ms: elapsed,
            at: to_datetime(now),
        })
    }

    fn resume(&mut self) -> Option<Event> {
        let now = self.clock.now_ms();
        if !self.state.resume(now) {
            debug!("resume ignored: stopwatch is not paused");
            return None;
        }
        self.polling.arm();
        Some(Event::TimerResumed {
            mode: TimerMode::Stopwatch,
            elapsed_ms: self.state.elapsed(now),
            at: to_datetime(now),
        })
    }

    fn kill(&mut self) -> KillSummary {
        self.polling.cancel();
        let now = self.clock.now_ms();
        let summary = KillSummary {
            mode: TimerMode::Stopwatch,
            elapsed_ms: self.state.kill(now),
            cycle_count: u32::try_from(self.laps.len()).unwrap_or(u32::MAX),
            session_name: None,
            target_loop_count: None,
        };
        self.clear();
        summary
    }

    fn reset(&mut self) -> Option<Event> {
        self.polling.cancel();
        self.state.clear();
        self.clear();
        Some(Event::TimerReset {
            mode: TimerMode::Stopwatch,
            at: to_datetime(self.clock.now_ms()),
        })
    }

    fn snapshot(&self) -> StopwatchSnapshot {
        StopwatchSnapshot {
            is_active: self.state.is_active,
            is_paused: self.state.is_paused,
            start_time: self.state.start_time,
            paused_elapsed: self.state.paused_elapsed,
            laps: self.laps.clone(),
        }
    }

    fn restore(&mut self, snapshot: &StopwatchSnapshot) -> RestoreOutcome {
        self.polling.cancel();
        self.state.clear();
        self.clear();
        let now = self.clock.now_ms();

        let outcome = match (snapshot.is_active, snapshot.is_paused, snapshot.start_time) {
            (true, _, Some(start)) => {
                // The start is absolute, so time spent unobserved is already
                // included; only a start in the future needs clamping.
                self.state.rebase(now, now.saturating_sub(start));
                self.polling.arm();
                RestoreOutcome::Running
            }
            (true, _, None) => {
                warn!("stopwatch snapshot is active without a start time; restoring stopped");
                return RestoreOutcome::Invalid;
            }
            (false, true, _) => {
                self.state.freeze(snapshot.paused_elapsed);
                RestoreOutcome::Paused
            }
            (false, false, _) => return RestoreOutcome::Idle,
        };

        self.laps = snapshot.laps.clone();
        self.laps.sort_by(|a, b| b.id.cmp(&a.id));
        self.next_lap_id = self.laps.first().map(|l| l.id + 1).unwrap_or(1);
        self.elapsed_ms = self.state.elapsed(now);
        debug!(?outcome, elapsed_ms = self.elapsed_ms, "stopwatch restored");
        outcome
    }

    fn status(&self) -> Event {
        let now = self.clock.now_ms();
        let elapsed = self.state.elapsed(now);
        Event::StateSnapshot {
            mode: TimerMode::Stopwatch,
            is_active: self.state.is_active,
            is_paused: self.state.is_paused,
            elapsed_ms: elapsed,
            time_left_ms: None,
            progress: minute_sweep(elapsed),
            at: to_datetime(now),
        }
    }
}

impl StopwatchEngine {
    fn clear(&mut self) {
        self.laps.clear();
        self.next_lap_id = 1;
        self.elapsed_ms = 0;
    }
}

fn minute_sweep(elapsed: Millis) -> f64 {
    (elapsed % MINUTE_MS) as f64 / MINUTE_MS as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn engine() -> (Arc<ManualClock>, StopwatchEngine) {
        let clock = ManualClock::new(1_000_000);
        let engine = StopwatchEngine::new(clock.clone());
        (clock, engine)
    }

    #[test]
    fn tick_publishes_elapsed() {
        let (clock, mut sw) = engine();
        assert!(sw.start().is_some());
        clock.advance(1_500);
        assert!(sw.tick().is_none());
        assert_eq!(sw.elapsed_ms, 1_500);
        assert_eq!(sw.elapsed_ms(), 1_500);
    }

    #[test]
    fn start_twice_is_noop() {
        let (clock, mut sw) = engine();
        sw.start();
        clock.advance(500);
        assert!(sw.start().is_none());
        assert_eq!(sw.elapsed_ms(), 500);
    }

    #[test]
    fn laps_are_most_recent_first_with_splits() {
        let (clock, mut sw) = engine();
        sw.start();
        clock.advance(1_000);
        sw.add_lap();
        clock.advance(2_000);
        sw.add_lap();
        clock.advance(500);
        sw.add_lap();

        let laps = sw.laps();
        assert_eq!(laps.iter().map(|l| l.id).collect::<Vec<_>>(), vec![3, 2, 1]);
        assert_eq!(laps.iter().map(|l| l.split_ms).collect::<Vec<_>>(), vec![500, 2_000, 1_000]);
        assert_eq!(laps.iter().map(|l| l.split_ms).sum::<u64>(), sw.elapsed_ms());
    }

    #[test]
    fn lap_ignored_while_paused() {
        let (clock, mut sw) = engine();
        sw.start();
        clock.advance(1_000);
        sw.pause();
        assert!(sw.add_lap().is_none());
        assert!(sw.laps().is_empty());
    }

    #[test]
    fn pause_resume_conserves_elapsed() {
        let (clock, mut sw) = engine();
        sw.start();
        clock.advance(4_200);
        let before = sw.elapsed_ms();
        sw.pause();
        clock.advance(60_000);
        assert_eq!(sw.elapsed_ms(), before);
        sw.resume();
        assert_eq!(sw.elapsed_ms(), before);
    }

    #[test]
    fn kill_returns_elapsed_and_lap_count() {
        let (clock, mut sw) = engine();
        sw.start();
        clock.advance(3_000);
        sw.add_lap();
        let summary = sw.kill();
        assert_eq!(summary.elapsed_ms, 3_000);
        assert_eq!(summary.cycle_count, 1);
        assert!(sw.laps().is_empty());
        assert!(sw.state().is_idle());
        assert!(!sw.polling().is_armed());
    }

    #[test]
    fn restore_active_counts_unobserved_time() {
        let (clock, mut sw) = engine();
        sw.start();
        clock.advance(2_000);
        sw.add_lap();
        let snap = sw.snapshot();

        clock.advance(10_000);
        let mut restored = StopwatchEngine::new(clock.clone());
        assert_eq!(restored.restore(&snap), RestoreOutcome::Running);
        assert_eq!(restored.elapsed_ms(), 12_000);
        assert_eq!(restored.laps().len(), 1);
        assert!(restored.polling().is_armed());

        restored.add_lap();
        assert_eq!(restored.laps()[0].id, 2);
        assert_eq!(restored.laps()[0].split_ms, 10_000);
    }

    #[test]
    fn restore_paused_is_frozen() {
        let (clock, mut sw) = engine();
        sw.start();
        clock.advance(7_000);
        sw.pause();
        let snap = sw.snapshot();

        clock.advance(99_000);
        let mut restored = StopwatchEngine::new(clock.clone());
        assert_eq!(restored.restore(&snap), RestoreOutcome::Paused);
        assert_eq!(restored.elapsed_ms(), 7_000);
        assert!(!restored.polling().is_armed());
    }

    #[test]
    fn restore_active_without_start_is_invalid() {
        let (clock, _) = engine();
        let mut sw = StopwatchEngine::new(clock);
        let snap = StopwatchSnapshot {
            is_active: true,
            ..Default::default()
        };
        assert_eq!(sw.restore(&snap), RestoreOutcome::Invalid);
        assert!(sw.state().is_idle());
    }
}
