//! Persisted per-mode snapshots and input validation.
//!
//! Snapshots are plain data written to the snapshot store whenever state
//! changes. Every field defaults, so a snapshot from an older build or a
//! partially written one still deserializes; the engines then degrade
//! anything inconsistent to a stopped state.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::interval::IntervalKind;
use super::stopwatch::Lap;
use crate::clock::Millis;
use crate::error::TimerError;

/// How a `restore` call resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestoreOutcome {
    /// Snapshot described a stopped timer.
    Idle,
    Running,
    Paused,
    /// Remaining time ran out while unobserved; restored as stopped.
    Expired,
    /// Snapshot was inconsistent; restored as stopped.
    Invalid,
}

impl RestoreOutcome {
    pub fn is_live(self) -> bool {
        matches!(self, RestoreOutcome::Running | RestoreOutcome::Paused)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StopwatchSnapshot {
    pub is_active: bool,
    pub is_paused: bool,
    pub start_time: Option<Millis>,
    pub paused_elapsed: Millis,
    pub laps: Vec<Lap>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountdownSnapshot {
    pub is_active: bool,
    pub is_paused: bool,
    pub start_time: Option<Millis>,
    pub paused_elapsed: Millis,
    pub total_duration: Millis,
    pub has_completed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntervalSnapshot {
    pub is_active: bool,
    pub is_paused: bool,
    pub current_interval: IntervalKind,
    pub interval_count: u32,
    pub target_loop_count: Option<u32>,
    pub session_name: Option<String>,
    pub work_duration: Millis,
    pub break_duration: Millis,
    /// Synthetic start of the current phase while active.
    pub interval_start_time: Option<Millis>,
    /// Persisted directly; older snapshots without it get an approximation.
    pub session_start_time: Option<Millis>,
    pub base_paused_elapsed: Millis,
    pub total_paused_time: Millis,
    pub paused_at: Option<Millis>,
}

/// Accept a positive, finite millisecond duration.
pub fn validate_duration_ms(field: &'static str, value: f64) -> Result<Millis, TimerError> {
    if !value.is_finite() || value <= 0.0 {
        warn!(field, value, "rejected invalid duration");
        return Err(TimerError::InvalidDuration { field, value });
    }
    // Sub-millisecond positives round up so they never become zero.
    Ok(value.ceil() as Millis)
}

/// Accept an optional loop target of at least one.
pub fn validate_loop_count(value: Option<i64>) -> Result<Option<u32>, TimerError> {
    match value {
        None => Ok(None),
        Some(n) if n >= 1 => u32::try_from(n)
            .map(Some)
            .map_err(|_| TimerError::InvalidLoopCount(n)),
        Some(n) => {
            warn!(loops = n, "rejected invalid loop count");
            Err(TimerError::InvalidLoopCount(n))
        }
    }
}
