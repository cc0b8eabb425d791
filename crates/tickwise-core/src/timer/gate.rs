//! Try-lock guarding interval transitions.
//!
//! Exactly one completion check or phase switch may be in flight. A tick that
//! cannot acquire the gate does nothing and lets the next tick retry. The
//! guard releases the gate on drop, so unwinding out of a completion callback
//! still leaves the gate open.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionPhase {
    Idle,
    Completing,
    Switching,
}

impl TransitionPhase {
    fn as_u8(self) -> u8 {
        match self {
            TransitionPhase::Idle => 0,
            TransitionPhase::Completing => 1,
            TransitionPhase::Switching => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => TransitionPhase::Completing,
            2 => TransitionPhase::Switching,
            _ => TransitionPhase::Idle,
        }
    }
}

#[derive(Debug, Default)]
pub struct TransitionGate {
    locked: AtomicBool,
    phase: AtomicU8,
}

impl TransitionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the gate, or `None` if another transition holds it.
    pub fn try_acquire(&self) -> Option<TransitionGuard<'_>> {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| TransitionGuard { gate: self })
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }

    pub fn phase(&self) -> TransitionPhase {
        TransitionPhase::from_u8(self.phase.load(Ordering::Acquire))
    }
}

/// Exclusive ownership of a [`TransitionGate`] for one decision.
#[derive(Debug)]
pub struct TransitionGuard<'a> {
    gate: &'a TransitionGate,
}

impl TransitionGuard<'_> {
    pub fn set_phase(&self, phase: TransitionPhase) {
        self.gate.phase.store(phase.as_u8(), Ordering::Release);
    }
}

impl Drop for TransitionGuard<'_> {
    fn drop(&mut self) {
        self.gate
            .phase
            .store(TransitionPhase::Idle.as_u8(), Ordering::Release);
        self.gate.locked.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_while_held() {
        let gate = TransitionGate::new();
        let guard = gate.try_acquire().unwrap();
        assert!(gate.is_locked());
        assert!(gate.try_acquire().is_none());
        drop(guard);
        assert!(!gate.is_locked());
        assert!(gate.try_acquire().is_some());
    }

    #[test]
    fn phase_resets_to_idle_on_release() {
        let gate = TransitionGate::new();
        {
            let guard = gate.try_acquire().unwrap();
            guard.set_phase(TransitionPhase::Switching);
            assert_eq!(gate.phase(), TransitionPhase::Switching);
        }
        assert_eq!(gate.phase(), TransitionPhase::Idle);
    }

    #[test]
    fn released_when_holder_panics() {
        let gate = TransitionGate::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let guard = gate.try_acquire().unwrap();
            guard.set_phase(TransitionPhase::Completing);
            panic!("callback blew up");
        }));
        assert!(result.is_err());
        assert!(!gate.is_locked());
        assert_eq!(gate.phase(), TransitionPhase::Idle);
    }
}
