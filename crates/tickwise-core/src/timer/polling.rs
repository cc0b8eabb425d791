//! Polling handle owned by each engine.
//!
//! A driver captures the generation when it starts polling and must stop as
//! soon as [`Polling::is_current`] turns false. Cancelling bumps the
//! generation, so a tick scheduled before a kill can never act on the state
//! left behind by a later start.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Polling {
    generation: u64,
    armed: bool,
}

impl Polling {
    /// Begin a new polling run and return its generation.
    pub fn arm(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.armed = true;
        self.generation
    }

    /// Stop polling and invalidate every outstanding driver.
    pub fn cancel(&mut self) {
        self.armed = false;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Stop the current tick from being re-entered without ending the run.
    pub(crate) fn suspend(&mut self) {
        self.armed = false;
    }

    /// Continue the run that `suspend` interrupted.
    pub(crate) fn rearm(&mut self) {
        self.armed = true;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.armed && self.generation == generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_invalidates_old_generation() {
        let mut polling = Polling::default();
        let first = polling.arm();
        assert!(polling.is_current(first));
        polling.cancel();
        assert!(!polling.is_current(first));

        let second = polling.arm();
        assert_ne!(first, second);
        assert!(!polling.is_current(first));
        assert!(polling.is_current(second));
    }

    #[test]
    fn suspend_and_rearm_keep_generation() {
        let mut polling = Polling::default();
        let generation = polling.arm();
        polling.suspend();
        assert!(!polling.is_current(generation));
        polling.rearm();
        assert!(polling.is_current(generation));
    }
}
