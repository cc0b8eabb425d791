//! Mode-agnostic start/pause/resume bookkeeping.
//!
//! Elapsed time is always derived from an absolute `start_time`. Resuming
//! does not keep a separate "time spent paused" counter; instead it rebases
//! `start_time` to `now - paused_elapsed`, so `now - start_time` stays the
//! elapsed formula while active.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::clock::Millis;

/// Shared state embedded in every mode engine.
///
/// Invariant: at most one of `is_active`/`is_paused` is set, and
/// `start_time` is `Some` iff `is_active`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub is_active: bool,
    pub is_paused: bool,
    pub start_time: Option<Millis>,
    /// Elapsed time frozen at the last pause, carried into the next resume.
    pub paused_elapsed: Millis,
}

impl TimerState {
    /// Begin a fresh run. Returns `false` (and changes nothing) if already active.
    pub fn start(&mut self, now: Millis) -> bool {
        if self.is_active {
            warn!("start ignored: timer is already active");
            return false;
        }
        self.start_time = Some(now);
        self.paused_elapsed = 0;
        self.is_active = true;
        self.is_paused = false;
        true
    }

    /// Elapsed time at `now`: live while active, frozen while paused.
    pub fn elapsed(&self, now: Millis) -> Millis {
        match self.start_time {
            Some(start) if self.is_active => now.saturating_sub(start),
            _ => self.paused_elapsed,
        }
    }

    /// Flip to paused, keeping the elapsed value the mode computed.
    pub fn pause_at(&mut self, elapsed: Millis) -> bool {
        if !self.is_active {
            return false;
        }
        self.paused_elapsed = elapsed;
        self.start_time = None;
        self.is_active = false;
        self.is_paused = true;
        true
    }

    /// Resume with a synthetic start so `now - start_time == paused_elapsed`.
    pub fn resume(&mut self, now: Millis) -> bool {
        if !self.is_paused {
            return false;
        }
        self.rebase(now, self.paused_elapsed);
        true
    }

    /// Mark active with `elapsed` already on the clock at `now`.
    pub(crate) fn rebase(&mut self, now: Millis, elapsed: Millis) {
        self.start_time = Some(now.saturating_sub(elapsed));
        self.is_active = true;
        self.is_paused = false;
    }

    /// Put the state into paused with a known elapsed value (restore path).
    pub(crate) fn freeze(&mut self, elapsed: Millis) {
        self.start_time = None;
        self.paused_elapsed = elapsed;
        self.is_active = false;
        self.is_paused = true;
    }

    /// Return whatever elapsed time had accrued and clear to defaults.
    pub fn kill(&mut self, now: Millis) -> Millis {
        let elapsed = self.elapsed(now);
        self.clear();
        elapsed
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_idle(&self) -> bool {
        !self.is_active && !self.is_paused
    }
}
