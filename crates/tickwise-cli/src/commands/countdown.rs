use clap::Subcommand;
use tickwise_core::{Config, CountdownEngine, Database, Tickable, TimerEngine};

use super::session::{self, CmdResult};

#[derive(Subcommand)]
pub enum CountdownAction {
    /// Start a countdown of the given length
    Start {
        /// Length in minutes (fractions allowed)
        #[arg(allow_negative_numbers = true)]
        minutes: f64,
    },
    /// Pause, freezing the remaining time
    Pause,
    /// Resume with the remaining time
    Resume,
    /// Stop without completing
    Kill,
    /// Clear back to idle
    Reset,
    /// Print current state as JSON
    Status,
}

pub fn run(action: CountdownAction) -> CmdResult {
    let db = Database::open()?;
    let config = Config::load_or_default();
    let clock = session::system_clock();
    let mut engine =
        CountdownEngine::new(clock.clone()).with_completion(session::completion_context(&config));
    session::restore(&db, &mut engine);

    match action {
        CountdownAction::Start { minutes } => {
            let event = engine.start(minutes * 60_000.0)?;
            session::print_event(&event)?;
        }
        CountdownAction::Pause => {
            let event = engine.pause();
            session::print_or_status(event, &engine)?;
        }
        CountdownAction::Resume => {
            let event = engine.resume();
            session::print_or_status(event, &engine)?;
        }
        CountdownAction::Kill => {
            let summary = engine.kill();
            session::print_event(&session::killed(summary, clock.as_ref()))?;
        }
        CountdownAction::Reset => {
            let event = engine.reset();
            session::print_or_status(event, &engine)?;
        }
        CountdownAction::Status => {
            if let Some(event) = engine.tick() {
                session::print_event(&event)?;
            }
            session::print_event(&engine.status())?;
        }
    }

    session::save(&db, &engine)?;
    Ok(())
}
