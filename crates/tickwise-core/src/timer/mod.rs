//! Timer engines.
//!
//! Three independent wall-clock state machines share the same shape: a
//! [`TimerState`] for start/pause/resume bookkeeping, a [`Polling`] handle,
//! and an injected [`Clock`](crate::clock::Clock). None of them spawn
//! threads; the caller (or [`crate::driver::spawn_ticker`]) calls `tick()`
//! on a fixed cadence while the engine is active.
//!
//! ```text
//! Idle -> Active <-> Paused
//!   ^        |
//!   +--------+ kill / reset / completion
//! ```

mod base;
mod countdown;
mod gate;
mod interval;
mod polling;
mod snapshot;
mod stopwatch;

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub use base::TimerState;
pub use countdown::CountdownEngine;
pub use gate::{TransitionGate, TransitionGuard, TransitionPhase};
pub use interval::{should_complete_session, IntervalEngine, IntervalKind, IntervalPlan};
pub use polling::Polling;
pub use snapshot::{
    validate_duration_ms, validate_loop_count, CountdownSnapshot, IntervalSnapshot,
    RestoreOutcome, StopwatchSnapshot,
};
pub use stopwatch::{Lap, StopwatchEngine};

use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    Stopwatch,
    Countdown,
    Interval,
}

impl TimerMode {
    pub const ALL: [TimerMode; 3] = [TimerMode::Stopwatch, TimerMode::Countdown, TimerMode::Interval];

    pub fn as_str(self) -> &'static str {
        match self {
            TimerMode::Stopwatch => "stopwatch",
            TimerMode::Countdown => "countdown",
            TimerMode::Interval => "interval",
        }
    }
}

impl fmt::Display for TimerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What `kill` hands back: the time that had accrued plus session metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillSummary {
    pub mode: TimerMode,
    pub elapsed_ms: u64,
    /// Laps for the stopwatch, completed work/break cycles for intervals.
    pub cycle_count: u32,
    pub session_name: Option<String>,
    pub target_loop_count: Option<u32>,
}

/// Something a polling driver can advance.
pub trait Tickable: Send + 'static {
    fn polling(&self) -> Polling;

    /// Recompute from the clock. Returns an event on phase changes or
    /// completion; a tick with nothing to report returns `None`.
    fn tick(&mut self) -> Option<Event>;
}

/// Commands every mode supports. `start` differs per mode and lives on the
/// concrete engines.
pub trait TimerEngine: Tickable {
    type Snapshot: Serialize + DeserializeOwned + Default;

    const MODE: TimerMode;

    fn pause(&mut self) -> Option<Event>;
    fn resume(&mut self) -> Option<Event>;
    fn kill(&mut self) -> KillSummary;
    fn reset(&mut self) -> Option<Event>;

    fn snapshot(&self) -> Self::Snapshot;
    fn restore(&mut self, snapshot: &Self::Snapshot) -> RestoreOutcome;

    /// Current state as a [`Event::StateSnapshot`].
    fn status(&self) -> Event;
}
