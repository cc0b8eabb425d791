//! Work/break interval state machine.
//!
//! ```text
//! work --(phase ends)--> break                 count unchanged
//! break --(phase ends)--> work                 count + 1
//! break --(phase ends, count + 1 >= target)--> session complete
//! ```
//!
//! A boundary tick suspends polling first, then takes the transition gate.
//! If the gate is already held the tick re-arms polling and does nothing,
//! leaving the boundary to the next tick. Whoever holds the gate makes
//! exactly one decision (complete or switch) and drops the guard.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::base::TimerState;
use super::gate::{TransitionGate, TransitionPhase};
use super::polling::Polling;
use super::snapshot::{
    validate_duration_ms, validate_loop_count, IntervalSnapshot, RestoreOutcome,
};
use super::{KillSummary, Tickable, TimerEngine, TimerMode};
use crate::clock::{to_datetime, Clock, Millis};
use crate::completion::{CompletionContext, CompletionReport, SessionSummary};
use crate::error::TimerError;
use crate::events::Event;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalKind {
    #[default]
    Work,
    Break,
}

impl IntervalKind {
    pub fn next(self) -> Self {
        match self {
            IntervalKind::Work => IntervalKind::Break,
            IntervalKind::Break => IntervalKind::Work,
        }
    }
}

/// True when the phase that is ending closes the last configured loop.
///
/// Only a break ending can complete a session, since that is where the
/// next work phase would begin. Without a target the session never ends
/// on its own.
pub fn should_complete_session(
    current: IntervalKind,
    interval_count: u32,
    target_loop_count: Option<u32>,
) -> bool {
    current == IntervalKind::Break
        && target_loop_count.is_some_and(|target| interval_count.saturating_add(1) >= target)
}

/// Validated parameters for one interval session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalPlan {
    pub work_duration: Millis,
    pub break_duration: Millis,
    pub target_loop_count: Option<u32>,
    pub session_name: Option<String>,
}

impl IntervalPlan {
    /// # Errors
    ///
    /// Rejects non-positive, NaN or infinite durations and loop targets
    /// below one.
    pub fn new(
        work_ms: f64,
        break_ms: f64,
        target_loop_count: Option<i64>,
        session_name: Option<String>,
    ) -> Result<Self, TimerError> {
        Ok(Self {
            work_duration: validate_duration_ms("work", work_ms)?,
            break_duration: validate_duration_ms("break", break_ms)?,
            target_loop_count: validate_loop_count(target_loop_count)?,
            session_name: session_name.filter(|name| !name.trim().is_empty()),
        })
    }

    pub fn from_minutes(
        work_min: f64,
        break_min: f64,
        target_loop_count: Option<i64>,
        session_name: Option<String>,
    ) -> Result<Self, TimerError> {
        Self::new(
            work_min * 60_000.0,
            break_min * 60_000.0,
            target_loop_count,
            session_name,
        )
    }
}

#[derive(Debug)]
pub struct IntervalEngine {
    clock: Arc<dyn Clock>,
    /// `start_time` is the (rebased) start of the current phase and
    /// `paused_elapsed` the time into the phase at the last pause.
    state: TimerState,
    current_interval: IntervalKind,
    interval_count: u32,
    target_loop_count: Option<u32>,
    session_name: Option<String>,
    work_duration: Millis,
    break_duration: Millis,
    session_start_time: Option<Millis>,
    total_paused_time: Millis,
    paused_at: Option<Millis>,
    /// Session length fixed at completion.
    completed_elapsed: Option<Millis>,
    time_left: Millis,
    polling: Polling,
    gate: Arc<TransitionGate>,
    completion: CompletionContext,
    last_report: Option<CompletionReport>,
}

impl IntervalEngine {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: TimerState::default(),
            current_interval: IntervalKind::Work,
            interval_count: 0,
            target_loop_count: None,
            session_name: None,
            work_duration: 0,
            break_duration: 0,
            session_start_time: None,
            total_paused_time: 0,
            paused_at: None,
            completed_elapsed: None,
            time_left: 0,
            polling: Polling::default(),
            gate: Arc::new(TransitionGate::new()),
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

    pub fn current_interval(&self) -> IntervalKind {
        self.current_interval
    }

    pub fn interval_count(&self) -> u32 {
        self.interval_count
    }

    pub fn target_loop_count(&self) -> Option<u32> {
        self.target_loop_count
    }

    pub fn session_name(&self) -> Option<&str> {
        self.session_name.as_deref()
    }

    pub fn phase_duration(&self) -> Millis {
        match self.current_interval {
            IntervalKind::Work => self.work_duration,
            IntervalKind::Break => self.break_duration,
        }
    }

    pub fn time_left(&self) -> Millis {
        self.time_left_at(self.clock.now_ms())
    }

    /// 0.0 .. 1.0 through the current phase.
    pub fn progress(&self) -> f64 {
        progress(self.phase_duration(), self.time_left())
    }

    /// Session time so far, excluding pauses.
    pub fn session_elapsed(&self) -> Millis {
        self.session_elapsed_at(self.clock.now_ms())
    }

    /// The gate guarding transitions; shared so an outside holder can be
    /// observed by (or block) this engine's ticks.
    pub fn gate(&self) -> Arc<TransitionGate> {
        Arc::clone(&self.gate)
    }

    pub fn transition_phase(&self) -> TransitionPhase {
        self.gate.phase()
    }

    pub fn last_report(&self) -> Option<&CompletionReport> {
        self.last_report.as_ref()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start a new session in the work phase.
    ///
    /// # Errors
    ///
    /// Rejects starting while a session is running. The plan itself was
    /// validated when it was built.
    pub fn start(&mut self, plan: IntervalPlan) -> Result<Event, TimerError> {
        if self.state.is_active {
            warn!("interval start rejected: session already running");
            return Err(TimerError::AlreadyActive(TimerMode::Interval));
        }
        let now = self.clock.now_ms();
        self.clear_session();
        self.work_duration = plan.work_duration;
        self.break_duration = plan.break_duration;
        self.target_loop_count = plan.target_loop_count;
        self.session_name = plan.session_name;
        self.state.start(now);
        self.session_start_time = Some(now);
        self.time_left = self.work_duration;
        self.polling.arm();
        info!(
            work_ms = self.work_duration,
            break_ms = self.break_duration,
            target = ?self.target_loop_count,
            "interval session started"
        );
        Ok(Event::TimerStarted {
            mode: TimerMode::Interval,
            duration_ms: Some(self.work_duration),
            at: to_datetime(now),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn time_left_at(&self, now: Millis) -> Millis {
        if self.state.is_idle() {
            return self.time_left;
        }
        self.phase_duration()
            .saturating_sub(self.state.elapsed(now))
    }

    fn session_elapsed_at(&self, now: Millis) -> Millis {
        if let Some(done) = self.completed_elapsed {
            return done;
        }
        let Some(start) = self.session_start_time else {
            return 0;
        };
        let pending_pause = self
            .paused_at
            .map(|at| now.saturating_sub(at))
            .unwrap_or(0);
        now.saturating_sub(start)
            .saturating_sub(self.total_paused_time)
            .saturating_sub(pending_pause)
    }

    fn complete_session(&mut self, now: Millis) -> Event {
        let cycle_count = self.interval_count.saturating_add(1);
        let duration = self.session_elapsed_at(now);

        self.polling.cancel();
        self.state.clear();
        self.interval_count = cycle_count;
        self.time_left = 0;
        self.paused_at = None;
        self.completed_elapsed = Some(duration);

        let summary = SessionSummary {
            mode: TimerMode::Interval,
            duration_ms: duration,
            cycle_count,
            session_name: self.session_name.clone(),
            target_loop_count: self.target_loop_count,
            completed_at: now,
        };
        info!(
            duration_ms = duration,
            cycles = cycle_count,
            name = ?self.session_name,
            "interval session completed"
        );
        self.last_report = Some(self.completion.dispatch(&summary));

        Event::SessionCompleted {
            mode: TimerMode::Interval,
            duration_ms: summary.duration_ms,
            cycle_count: summary.cycle_count,
            session_name: summary.session_name,
            target_loop_count: summary.target_loop_count,
            at: to_datetime(now),
        }
    }

    fn switch_phase(&mut self, now: Millis) -> Event {
        let from = self.current_interval;
        let to = from.next();
        if to == IntervalKind::Work {
            self.interval_count = self.interval_count.saturating_add(1);
        }
        self.current_interval = to;
        self.state.rebase(now, 0);
        self.time_left = self.phase_duration();
        debug!(?from, ?to, count = self.interval_count, "interval switched");
        Event::IntervalSwitched {
            from,
            to,
            interval_count: self.interval_count,
            duration_ms: self.time_left,
            at: to_datetime(now),
        }
    }

    fn clear_session(&mut self) {
        self.state.clear();
        self.current_interval = IntervalKind::Work;
        self.interval_count = 0;
        self.target_loop_count = None;
        self.session_name = None;
        self.session_start_time = None;
        self.total_paused_time = 0;
        self.paused_at = None;
        self.completed_elapsed = None;
        self.time_left = 0;
    }

    /// Session start reconstructed from completed cycles, for snapshots that
    /// predate `session_start_time`. Ignores pauses and late ticks, so it
    /// overstates the session length when either happened.
    fn approximate_session_start(&self, phase_start: Millis) -> Millis {
        let cycle = self.work_duration.saturating_add(self.break_duration);
        let mut offset = cycle.saturating_mul(Millis::from(self.interval_count));
        if self.current_interval == IntervalKind::Break {
            offset = offset.saturating_add(self.work_duration);
        }
        phase_start.saturating_sub(offset)
    }
}

fn progress(total: Millis, left: Millis) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (1.0 - left as f64 / total as f64).clamp(0.0, 1.0)
}

impl Tickable for IntervalEngine {
    fn polling(&self) -> Polling {
        self.polling
    }

    fn tick(&mut self) -> Option<Event> {
        if !self.polling.is_armed() || !self.state.is_active {
            return None;
        }
        let now = self.clock.now_ms();
        self.time_left = self.time_left_at(now);
        if self.time_left > 0 {
            return None;
        }

        self.polling.suspend();

        let gate = Arc::clone(&self.gate);
        let Some(guard) = gate.try_acquire() else {
            warn!(phase = ?gate.phase(), "transition already in progress; deferring to next tick");
            self.polling.rearm();
            return Some(Event::TransitionDeferred {
                at: to_datetime(now),
            });
        };

        guard.set_phase(TransitionPhase::Completing);
        if should_complete_session(
            self.current_interval,
            self.interval_count,
            self.target_loop_count,
        ) {
            return Some(self.complete_session(now));
        }

        guard.set_phase(TransitionPhase::Switching);
        let event = self.switch_phase(now);
        self.polling.rearm();
        Some(event)
    }
}

impl TimerEngine for IntervalEngine {
    type Snapshot = IntervalSnapshot;

    const MODE: TimerMode = TimerMode::Interval;

    fn pause(&mut self) -> Option<Event> {
        let now = self.clock.now_ms();
        let into_phase = self.state.elapsed(now).min(self.phase_duration());
        if !self.state.pause_at(into_phase) {
            debug!("pause ignored: interval session is not running");
            return None;
        }
        self.polling.cancel();
        self.paused_at = Some(now);
        self.time_left = self.phase_duration() - into_phase;
        Some(Event::TimerPaused {
            mode: TimerMode::Interval,
            elapsed_ms: self.session_elapsed_at(now),
            at: to_datetime(now),
        })
    }

    fn resume(&mut self) -> Option<Event> {
        let now = self.clock.now_ms();
        if !self.state.resume(now) {
            debug!("resume ignored: interval session is not paused");
            return None;
        }
        if let Some(at) = self.paused_at.take() {
            self.total_paused_time = self
                .total_paused_time
                .saturating_add(now.saturating_sub(at));
        }
        self.polling.arm();
        Some(Event::TimerResumed {
            mode: TimerMode::Interval,
            elapsed_ms: self.session_elapsed_at(now),
            at: to_datetime(now),
        })
    }

    fn kill(&mut self) -> KillSummary {
        self.polling.cancel();
        let now = self.clock.now_ms();
        let summary = KillSummary {
            mode: TimerMode::Interval,
            elapsed_ms: self.session_elapsed_at(now),
            cycle_count: self.interval_count,
            session_name: self.session_name.clone(),
            target_loop_count: self.target_loop_count,
        };
        self.clear_session();
        summary
    }

    fn reset(&mut self) -> Option<Event> {
        self.polling.cancel();
        self.clear_session();
        Some(Event::TimerReset {
            mode: TimerMode::Interval,
            at: to_datetime(self.clock.now_ms()),
        })
    }

    fn snapshot(&self) -> IntervalSnapshot {
        IntervalSnapshot {
            is_active: self.state.is_active,
            is_paused: self.state.is_paused,
            current_interval: self.current_interval,
            interval_count: self.interval_count,
            target_loop_count: self.target_loop_count,
            session_name: self.session_name.clone(),
            work_duration: self.work_duration,
            break_duration: self.break_duration,
            interval_start_time: self.state.start_time,
            session_start_time: self.session_start_time,
            base_paused_elapsed: self.state.paused_elapsed,
            total_paused_time: self.total_paused_time,
            paused_at: self.paused_at,
        }
    }

    fn restore(&mut self, snapshot: &IntervalSnapshot) -> RestoreOutcome {
        self.polling.cancel();
        self.clear_session();
        let now = self.clock.now_ms();

        if snapshot.work_duration > 0 && snapshot.break_duration > 0 {
            self.work_duration = snapshot.work_duration;
            self.break_duration = snapshot.break_duration;
        }
        if !snapshot.is_active && !snapshot.is_paused {
            return RestoreOutcome::Idle;
        }
        if snapshot.work_duration == 0 || snapshot.break_duration == 0 {
            warn!("interval snapshot is missing phase durations; restoring stopped");
            return RestoreOutcome::Invalid;
        }

        self.current_interval = snapshot.current_interval;
        let phase_duration = self.phase_duration();
        let into_phase = match (snapshot.is_active, snapshot.interval_start_time) {
            (true, Some(start)) => now.saturating_sub(start),
            (true, None) => {
                warn!("interval snapshot is active without a phase start; restoring stopped");
                self.current_interval = IntervalKind::Work;
                return RestoreOutcome::Invalid;
            }
            // A pause never records more than the whole phase; the boundary
            // is crossed by the first tick after resume.
            (false, _) => snapshot.base_paused_elapsed.min(phase_duration),
        };
        if snapshot.is_active && into_phase >= phase_duration {
            debug!(
                into_phase_ms = into_phase,
                phase_ms = phase_duration,
                "interval phase ended while unobserved"
            );
            self.current_interval = IntervalKind::Work;
            return RestoreOutcome::Expired;
        }

        self.interval_count = snapshot.interval_count;
        self.target_loop_count = snapshot.target_loop_count.filter(|&t| t > 0);
        self.session_name = snapshot.session_name.clone();
        self.total_paused_time = snapshot.total_paused_time;
        self.time_left = phase_duration - into_phase;

        let phase_start = now.saturating_sub(into_phase);
        self.session_start_time = Some(match snapshot.session_start_time {
            Some(start) => start,
            None => {
                let approx = self.approximate_session_start(phase_start);
                debug!(approx, "session start approximated from completed cycles");
                approx
            }
        });

        if snapshot.is_active {
            self.state.rebase(now, into_phase);
            self.polling.arm();
            RestoreOutcome::Running
        } else {
            self.state.freeze(into_phase);
            self.paused_at = Some(snapshot.paused_at.unwrap_or(now).min(now));
            RestoreOutcome::Paused
        }
    }

    fn status(&self) -> Event {
        let now = self.clock.now_ms();
        let left = self.time_left_at(now);
        Event::StateSnapshot {
            mode: TimerMode::Interval,
            is_active: self.state.is_active,
            is_paused: self.state.is_paused,
            elapsed_ms: self.session_elapsed_at(now),
            time_left_ms: Some(left),
            progress: progress(self.phase_duration(), left),
            at: to_datetime(now),
        }
    }
}
