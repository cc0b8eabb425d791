//! Tokio polling driver.
//!
//! Engines never schedule themselves. [`spawn_ticker`] polls an engine on a
//! fixed cadence for as long as the polling generation it captured at spawn
//! is current; kill, reset, pause and completion all cancel that generation,
//! which ends the task on its next wake-up without touching the engine.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

use crate::events::Event;
use crate::timer::Tickable;

pub const DEFAULT_CADENCE: Duration = Duration::from_millis(100);

/// Lock an engine, recovering it if a previous holder panicked.
///
/// Engine state is recomputed from absolute timestamps on every tick, so a
/// poisoned lock still holds usable state.
pub fn lock_engine<E>(engine: &Mutex<E>) -> MutexGuard<'_, E> {
    engine.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Poll `engine` every `cadence` until its polling handle is cancelled.
///
/// Returns `None` when the engine is not armed. Events produced by ticks are
/// forwarded to `events` when given; a closed receiver does not stop polling.
pub fn spawn_ticker<E: Tickable>(
    engine: Arc<Mutex<E>>,
    cadence: Duration,
    events: Option<UnboundedSender<Event>>,
) -> Option<JoinHandle<()>> {
    let generation = {
        let guard = lock_engine(&engine);
        let polling = guard.polling();
        if !polling.is_armed() {
            return None;
        }
        polling.generation()
    };

    Some(tokio::spawn(async move {
        let mut interval = time::interval(cadence);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let event = {
                let mut guard = lock_engine(&engine);
                if !guard.polling().is_current(generation) {
                    debug!(generation, "polling handle no longer current; ticker stopping");
                    break;
                }
                guard.tick()
            };
            if let (Some(event), Some(tx)) = (event, events.as_ref()) {
                let _ = tx.send(event);
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::completion::CompletionContext;
    use crate::timer::{CountdownEngine, StopwatchEngine, TimerEngine};
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn ticker_drives_countdown_to_single_completion() {
        let clock = ManualClock::new(0);
        let fired = Arc::new(AtomicU32::new(0));
        let f = fired.clone();
        let mut engine = CountdownEngine::new(clock.clone()).with_completion(
            CompletionContext::default().on_timer_complete(move || {
                f.fetch_add(1, Ordering::SeqCst);
            }),
        );
        engine.start(1_000.0).unwrap();
        let engine = Arc::new(Mutex::new(engine));

        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = spawn_ticker(engine.clone(), DEFAULT_CADENCE, Some(tx)).unwrap();

        time::sleep(Duration::from_millis(250)).await;
        clock.advance(1_000);
        handle.await.unwrap();

        assert!(matches!(rx.recv().await, Some(Event::SessionCompleted { .. })));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!lock_engine(&engine).polling().is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn kill_stops_ticker() {
        let clock = ManualClock::new(0);
        let mut engine = StopwatchEngine::new(clock.clone());
        engine.start();
        let engine = Arc::new(Mutex::new(engine));
        let handle = spawn_ticker(engine.clone(), DEFAULT_CADENCE, None).unwrap();

        time::sleep(Duration::from_millis(300)).await;
        lock_engine(&engine).kill();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn stale_ticker_exits_after_restart() {
        let clock = ManualClock::new(0);
        let mut engine = StopwatchEngine::new(clock.clone());
        engine.start();
        let engine = Arc::new(Mutex::new(engine));
        let stale = spawn_ticker(engine.clone(), DEFAULT_CADENCE, None).unwrap();

        {
            let mut guard = lock_engine(&engine);
            guard.reset();
            guard.start();
        }
        let fresh = spawn_ticker(engine.clone(), DEFAULT_CADENCE, None).unwrap();

        stale.await.unwrap();
        assert!(!fresh.is_finished());
        lock_engine(&engine).reset();
        fresh.await.unwrap();
    }

    #[test]
    fn unarmed_engine_is_not_spawned() {
        let engine = Arc::new(Mutex::new(StopwatchEngine::new(ManualClock::new(0))));
        // No runtime needed: returns before spawning.
        assert!(spawn_ticker(engine, DEFAULT_CADENCE, None).is_none());
    }
}
