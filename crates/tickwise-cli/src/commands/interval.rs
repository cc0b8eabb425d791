use clap::Subcommand;
use tickwise_core::{Config, Database, IntervalEngine, Tickable, TimerEngine};

use super::session::{self, CmdResult};

#[derive(Subcommand)]
pub enum IntervalAction {
    /// Start a work/break session
    Start {
        /// Work phase length in minutes [default: from config]
        #[arg(long, allow_negative_numbers = true)]
        work: Option<f64>,
        /// Break phase length in minutes [default: from config]
        #[arg(long = "break", allow_negative_numbers = true)]
        break_minutes: Option<f64>,
        /// Complete after this many work/break cycles
        #[arg(long, allow_negative_numbers = true)]
        loops: Option<i64>,
        /// Session label shown in notifications and history
        #[arg(long)]
        name: Option<String>,
    },
    /// Pause the current phase
    Pause,
    /// Resume the current phase
    Resume,
    /// Stop the session without completing
    Kill,
    /// Clear back to idle
    Reset,
    /// Print current state as JSON
    Status,
}

pub fn run(action: IntervalAction) -> CmdResult {
    let db = Database::open()?;
    let config = Config::load_or_default();
    let clock = session::system_clock();
    let mut engine =
        IntervalEngine::new(clock.clone()).with_completion(session::completion_context(&config));
    session::restore(&db, &mut engine);

    match action {
        IntervalAction::Start {
            work,
            break_minutes,
            loops,
            name,
        } => {
            let plan = config.interval_plan(work, break_minutes, loops, name)?;
            let event = engine.start(plan)?;
            session::print_event(&event)?;
        }
        IntervalAction::Pause => {
            let event = engine.pause();
            session::print_or_status(event, &engine)?;
        }
        IntervalAction::Resume => {
            let event = engine.resume();
            session::print_or_status(event, &engine)?;
        }
        IntervalAction::Kill => {
            let summary = engine.kill();
            session::print_event(&session::killed(summary, clock.as_ref()))?;
        }
        IntervalAction::Reset => {
            let event = engine.reset();
            session::print_or_status(event, &engine)?;
        }
        IntervalAction::Status => {
            if let Some(event) = engine.tick() {
                session::print_event(&event)?;
            }
            session::print_event(&engine.status())?;
        }
    }

    session::save(&db, &engine)?;
    Ok(())
}
