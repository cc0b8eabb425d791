use clap::Subcommand;
use tickwise_core::{Database, StopwatchEngine, Tickable, TimerEngine};

use super::session::{self, CmdResult};

#[derive(Subcommand)]
pub enum StopwatchAction {
    /// Start counting up
    Start,
    /// Pause, keeping elapsed time
    Pause,
    /// Resume from where it was paused
    Resume,
    /// Record a lap split
    Lap,
    /// Stop and print the elapsed time and laps
    Kill,
    /// Clear elapsed time and laps
    Reset,
    /// Print current state as JSON
    Status,
    /// Print recorded laps, most recent first
    Laps,
}

pub fn run(action: StopwatchAction) -> CmdResult {
    let db = Database::open()?;
    let clock = session::system_clock();
    let mut engine = StopwatchEngine::new(clock.clone());
    session::restore(&db, &mut engine);

    match action {
        StopwatchAction::Start => {
            let event = engine.start();
            session::print_or_status(event, &engine)?;
        }
        StopwatchAction::Pause => {
            let event = engine.pause();
            session::print_or_status(event, &engine)?;
        }
        StopwatchAction::Resume => {
            let event = engine.resume();
            session::print_or_status(event, &engine)?;
        }
        StopwatchAction::Lap => {
            let event = engine.add_lap();
            session::print_or_status(event, &engine)?;
        }
        StopwatchAction::Kill => {
            let summary = engine.kill();
            session::print_event(&session::killed(summary, clock.as_ref()))?;
        }
        StopwatchAction::Reset => {
            let event = engine.reset();
            session::print_or_status(event, &engine)?;
        }
        StopwatchAction::Status => {
            engine.tick();
            session::print_event(&engine.status())?;
        }
        StopwatchAction::Laps => {
            println!("{}", serde_json::to_string_pretty(engine.laps())?);
        }
    }

    session::save(&db, &engine)?;
    Ok(())
}
