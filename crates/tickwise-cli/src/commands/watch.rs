//! Live driving of a restored timer.
//!
//! Restores the mode from the snapshot store, polls it with
//! [`spawn_ticker`] and streams events as JSON lines until the session
//! ends or Ctrl-C. The snapshot is written after every event and on exit,
//! so an interrupted watch can be picked up again.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::ValueEnum;
use tickwise_core::driver::{lock_engine, spawn_ticker};
use tickwise_core::{
    Clock, Config, CountdownEngine, Database, Event, IntervalEngine, StopwatchEngine, TimerEngine,
    TimerMode,
};
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tracing::info;

use super::session::{self, CmdResult};

#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Stopwatch,
    Countdown,
    Interval,
}

impl From<ModeArg> for TimerMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Stopwatch => TimerMode::Stopwatch,
            ModeArg::Countdown => TimerMode::Countdown,
            ModeArg::Interval => TimerMode::Interval,
        }
    }
}

pub fn run(mode: ModeArg, every: u64) -> CmdResult {
    let config = Config::load_or_default();
    let db = Database::open()?;
    let clock = session::system_clock();
    let status_every = (every > 0).then(|| Duration::from_secs(every));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        match TimerMode::from(mode) {
            TimerMode::Stopwatch => {
                let engine = StopwatchEngine::new(clock.clone());
                drive(engine, &db, clock.as_ref(), config.cadence(), status_every).await
            }
            TimerMode::Countdown => {
                let engine = CountdownEngine::new(clock.clone())
                    .with_completion(session::completion_context(&config));
                drive(engine, &db, clock.as_ref(), config.cadence(), status_every).await
            }
            TimerMode::Interval => {
                let engine = IntervalEngine::new(clock.clone())
                    .with_completion(session::completion_context(&config));
                drive(engine, &db, clock.as_ref(), config.cadence(), status_every).await
            }
        }
    })
}

fn print_line(event: &Event) -> CmdResult {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}

async fn drive<E: TimerEngine>(
    mut engine: E,
    db: &Database,
    clock: &dyn Clock,
    cadence: Duration,
    status_every: Option<Duration>,
) -> CmdResult {
    let outcome = session::restore(db, &mut engine);
    print_line(&session::restored::<E>(outcome, clock))?;

    let engine = Arc::new(Mutex::new(engine));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let Some(ticker) = spawn_ticker(engine.clone(), cadence, Some(tx)) else {
        // Idle, paused, expired or invalid: nothing to drive.
        let guard = lock_engine(&engine);
        print_line(&guard.status())?;
        session::save(db, &*guard)?;
        return Ok(());
    };
    info!(mode = %E::MODE, ?cadence, "watching");

    let mut status = time::interval(status_every.unwrap_or(Duration::from_secs(1)));
    status.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else { break };
                print_line(&event)?;
                session::save(db, &*lock_engine(&engine))?;
                if event.is_terminal() {
                    break;
                }
            }
            _ = status.tick(), if status_every.is_some() => {
                print_line(&lock_engine(&engine).status())?;
            }
            _ = &mut ctrl_c => {
                info!(mode = %E::MODE, "interrupted; timer left running in the snapshot store");
                break;
            }
        }
    }

    ticker.abort();
    let guard = lock_engine(&engine);
    print_line(&guard.status())?;
    session::save(db, &*guard)?;
    Ok(())
}
