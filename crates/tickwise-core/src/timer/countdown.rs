//! Fixed-duration countdown.
//!
//! Completion fires from a live tick only, at most once per run: the
//! `has_completed` flag is set before the fan-out so extra ticks, and
//! restores of an already expired run, never repeat it.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::base::TimerState;
use super::polling::Polling;
use super::snapshot::{validate_duration_ms, CountdownSnapshot, RestoreOutcome};
use super::{KillSummary, Tickable, TimerEngine, TimerMode};
use crate::clock::{to_datetime, Clock, Millis};
use crate::completion::{CompletionContext, CompletionReport, SessionSummary};
use crate::error::TimerError;
use crate::events::Event;

#[derive(Debug)]
pub struct CountdownEngine {
    clock: Arc<dyn Clock>,
    state: TimerState,
    total_duration: Millis,
    has_completed: bool,
    time_left: Millis,
    polling: Polling,
    completion: CompletionContext,
    last_report: Option<CompletionReport>,
}

impl CountdownEngine {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: TimerState::default(),
            total_duration: 0,
            has_completed: false,
            time_left: 0,
            polling: Polling::default(),
            completion: CompletionContext::default(),
            last_report: None,
        }
    }

    pub fn with_completion(mut self, completion: CompletionContext) -> Self {
        self.completion = completion;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn total_duration(&self) -> Millis {
        self.total_duration
    }

    pub fn has_completed(&self) -> bool {
        self.has_completed
    }

    pub fn time_left(&self) -> Millis {
        self.time_left_at(self.clock.now_ms())
    }

    /// 0.0 .. 1.0 of the configured duration consumed.
    pub fn progress(&self) -> f64 {
        progress(self.total_duration, self.time_left())
    }

    /// Outcome of the most recent completion fan-out.
    pub fn last_report(&self) -> Option<&CompletionReport> {
        self.last_report.as_ref()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start counting down from `duration_ms`.
    ///
    /// # Errors
    ///
    /// Rejects non-positive, NaN or infinite durations and starting while
    /// already running. Nothing is mutated on error.
    pub fn start(&mut self, duration_ms: f64) -> Result<Event, TimerError> {
        let duration = validate_duration_ms("duration", duration_ms)?;
        if self.state.is_active {
            warn!("countdown start rejected: already running");
            return Err(TimerError::AlreadyActive(TimerMode::Countdown));
        }
        let now = self.clock.now_ms();
        self.state.start(now);
        self.total_duration = duration;
        self.time_left = duration;
        self.has_completed = false;
        self.polling.arm();
        info!(duration_ms = duration, "countdown started");
        Ok(Event::TimerStarted {
            mode: TimerMode::Countdown,
            duration_ms: Some(duration),
            at: to_datetime(now),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn time_left_at(&self, now: Millis) -> Millis {
        if self.state.is_idle() {
            return self.time_left;
        }
        self.total_duration
            .saturating_sub(self.state.elapsed(now))
    }

    fn complete(&mut self, now: Millis) -> Event {
        self.has_completed = true;
        self.polling.cancel();
        self.state.clear();
        self.time_left = 0;

        let summary = SessionSummary {
            mode: TimerMode::Countdown,
            duration_ms: self.total_duration,
            cycle_count: 1,
            session_name: None,
            target_loop_count: None,
            completed_at: now,
        };
        info!(duration_ms = self.total_duration, "countdown completed");
        self.last_report = Some(self.completion.dispatch(&summary));

        Event::SessionCompleted {
            mode: TimerMode::Countdown,
            duration_ms: summary.duration_ms,
            cycle_count: summary.cycle_count,
            session_name: None,
            target_loop_count: None,
            at: to_datetime(now),
        }
    }

    fn clear(&mut self) {
        self.state.clear();
        self.total_duration = 0;
        self.time_left = 0;
        self.has_completed = false;
    }
}

fn progress(total: Millis, left: Millis) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (1.0 - left as f64 / total as f64).clamp(0.0, 1.0)
}

impl Tickable for CountdownEngine {
    fn polling(&self) -> Polling {
        self.polling
    }

    fn tick(&mut self) -> Option<Event> {
        if !self.polling.is_armed() || !self.state.is_active {
            return None;
        }
        let now = self.clock.now_ms();
        self.time_left = self.time_left_at(now);
        if self.time_left == 0 && !self.has_completed {
            return Some(self.complete(now));
        }
        None
    }
}

impl TimerEngine for CountdownEngine {
    type Snapshot = CountdownSnapshot;

    const MODE: TimerMode = TimerMode::Countdown;

    fn pause(&mut self) -> Option<Event> {
        let now = self.clock.now_ms();
        let elapsed = self.state.elapsed(now).min(self.total_duration);
        if !self.state.pause_at(elapsed) {
            debug!("pause ignored: countdown is not running");
            return None;
        }
        self.polling.cancel();
        self.time_left = self.total_duration - elapsed;
        Some(Event::TimerPaused {
            mode: TimerMode::Countdown,
            elapsed_ms: elapsed,
            at: to_datetime(now),
        })
    }

    fn resume(&mut self) -> Option<Event> {
        let now = self.clock.now_ms();
        if !self.state.resume(now) {
            debug!("resume ignored: countdown is not paused");
            return None;
        }
        self.polling.arm();
        Some(Event::TimerResumed {
            mode: TimerMode::Countdown,
            elapsed_ms: self.state.elapsed(now),
            at: to_datetime(now),
        })
    }

    fn kill(&mut self) -> KillSummary {
        self.polling.cancel();
        let now = self.clock.now_ms();
        let elapsed = self.state.kill(now).min(self.total_duration);
        self.clear();
        KillSummary {
            mode: TimerMode::Countdown,
            elapsed_ms: elapsed,
            cycle_count: 0,
            session_name: None,
            target_loop_count: None,
        }
    }

    fn reset(&mut self) -> Option<Event> {
        self.polling.cancel();
        self.clear();
        Some(Event::TimerReset {
            mode: TimerMode::Countdown,
            at: to_datetime(self.clock.now_ms()),
        })
    }

    fn snapshot(&self) -> CountdownSnapshot {
        CountdownSnapshot {
            is_active: self.state.is_active,
            is_paused: self.state.is_paused,
            start_time: self.state.start_time,
            paused_elapsed: self.state.paused_elapsed,
            total_duration: self.total_duration,
            has_completed: self.has_completed,
        }
    }

    fn restore(&mut self, snapshot: &CountdownSnapshot) -> RestoreOutcome {
        self.polling.cancel();
        self.clear();
        let now = self.clock.now_ms();

        if !snapshot.is_active && !snapshot.is_paused {
            return RestoreOutcome::Idle;
        }
        if snapshot.total_duration == 0 {
            warn!("countdown snapshot has no duration; restoring stopped");
            return RestoreOutcome::Invalid;
        }
        if snapshot.has_completed {
            return RestoreOutcome::Expired;
        }

        let elapsed = match (snapshot.is_active, snapshot.start_time) {
            (true, Some(start)) => now.saturating_sub(start),
            (true, None) => {
                warn!("countdown snapshot is active without a start time; restoring stopped");
                return RestoreOutcome::Invalid;
            }
            (false, _) => snapshot.paused_elapsed,
        };

        if elapsed >= snapshot.total_duration {
            debug!(
                elapsed_ms = elapsed,
                total_ms = snapshot.total_duration,
                "countdown expired while unobserved"
            );
            return RestoreOutcome::Expired;
        }

        self.total_duration = snapshot.total_duration;
        self.time_left = snapshot.total_duration - elapsed;
        if snapshot.is_active {
            self.state.rebase(now, elapsed);
            self.polling.arm();
            RestoreOutcome::Running
        } else {
            self.state.freeze(elapsed);
            RestoreOutcome::Paused
        }
    }

    fn status(&self) -> Event {
        let now = self.clock.now_ms();
        let left = self.time_left_at(now);
        Event::StateSnapshot {
            mode: TimerMode::Countdown,
            is_active: self.state.is_active,
            is_paused: self.state.is_paused,
            elapsed_ms: self.total_duration - left.min(self.total_duration),
            time_left_ms: Some(left),
            progress: progress(self.total_duration, left),
            at: to_datetime(now),
        }
    }
}
