use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{IntervalKind, KillSummary, Lap, RestoreOutcome, TimerMode};

/// Every state change in an engine produces an Event.
/// The view layer renders them; the CLI prints them as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        mode: TimerMode,
        /// Target duration for countdowns and the first work phase of intervals.
        duration_ms: Option<u64>,
        at: DateTime<Utc>,
    },
    TimerPaused {
        mode: TimerMode,
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        mode: TimerMode,
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    TimerKilled {
        summary: KillSummary,
        at: DateTime<Utc>,
    },
    TimerReset {
        mode: TimerMode,
        at: DateTime<Utc>,
    },
    LapRecorded {
        lap: Lap,
        at: DateTime<Utc>,
    },
    /// Interval engine crossed a work/break boundary.
    IntervalSwitched {
        from: IntervalKind,
        to: IntervalKind,
        interval_count: u32,
        duration_ms: u64,
        at: DateTime<Utc>,
    },
    /// A boundary tick found the transition lock held and will retry.
    TransitionDeferred {
        at: DateTime<Utc>,
    },
    SessionCompleted {
        mode: TimerMode,
        duration_ms: u64,
        cycle_count: u32,
        session_name: Option<String>,
        target_loop_count: Option<u32>,
        at: DateTime<Utc>,
    },
    TimerRestored {
        mode: TimerMode,
        outcome: RestoreOutcome,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        mode: TimerMode,
        is_active: bool,
        is_paused: bool,
        elapsed_ms: u64,
        /// `None` for the stopwatch, which has no terminal condition.
        time_left_ms: Option<u64>,
        progress: f64,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// True for events that end a session or discard one.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Event::SessionCompleted { .. } | Event::TimerKilled { .. } | Event::TimerReset { .. }
        )
    }
}
