//! Plumbing shared by the timer commands: snapshot load/save, output, and
//! the completion wiring that records finished sessions.

use std::sync::Arc;

use tickwise_core::clock::to_datetime;
use tickwise_core::storage::{load_snapshot, save_snapshot};
use tickwise_core::{
    Clock, CompletionContext, Config, CoreError, Database, Event, KillSummary, RestoreOutcome,
    SystemClock, TimerEngine,
};
use tracing::{debug, info};

use crate::feedback::terminal_feedback;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

pub fn system_clock() -> Arc<dyn Clock> {
    Arc::new(SystemClock)
}

pub fn restore<E: TimerEngine>(db: &Database, engine: &mut E) -> RestoreOutcome {
    let snapshot: E::Snapshot = load_snapshot(db, E::MODE);
    let outcome = engine.restore(&snapshot);
    debug!(mode = %E::MODE, ?outcome, "restored from snapshot store");
    outcome
}

/// # Errors
/// Returns an error if the snapshot cannot be written.
pub fn save<E: TimerEngine>(db: &Database, engine: &E) -> Result<(), CoreError> {
    save_snapshot(db, E::MODE, &engine.snapshot())
}

pub fn print_event(event: &Event) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(event)?);
    Ok(())
}

/// Print the event a command produced, or the current state when the
/// command was a no-op.
pub fn print_or_status<E: TimerEngine>(event: Option<Event>, engine: &E) -> CmdResult {
    let event = event.unwrap_or_else(|| engine.status());
    print_event(&event)?;
    Ok(())
}

pub fn killed(summary: KillSummary, clock: &dyn Clock) -> Event {
    Event::TimerKilled {
        summary,
        at: to_datetime(clock.now_ms()),
    }
}

pub fn restored<E: TimerEngine>(outcome: RestoreOutcome, clock: &dyn Clock) -> Event {
    Event::TimerRestored {
        mode: E::MODE,
        outcome,
        at: to_datetime(clock.now_ms()),
    }
}

/// Completion wiring for the CLI: terminal feedback from the config, and
/// every completed session appended to history.
pub fn completion_context(config: &Config) -> CompletionContext {
    CompletionContext::new(config.completion_settings(), terminal_feedback()).on_session_complete(
        |summary| {
            let id = Database::open()?.record_session(summary)?;
            info!(%id, mode = %summary.mode, cycles = summary.cycle_count, "session recorded");
            Ok(())
        },
    )
}
