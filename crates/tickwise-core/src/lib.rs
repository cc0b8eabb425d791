//! # Tickwise Core Library
//!
//! The timer engine behind the Tickwise CLI: three independent wall-clock
//! state machines (stopwatch, countdown, work/break intervals) that survive
//! pause/resume and process restarts, plus the completion fan-out that hands
//! finished sessions to sound, vibration, notification and history.
//!
//! ## Architecture
//!
//! - **Clock**: every engine reads an injected [`Clock`] once per command or
//!   tick and derives elapsed time from absolute timestamps
//! - **Timer engines**: caller-driven state machines; nothing ticks unless
//!   `tick()` is called, either by hand or by [`driver::spawn_ticker`]
//! - **Completion**: [`completion::dispatch`] isolates each feedback step so a
//!   failing collaborator never blocks the others
//! - **Storage**: SQLite history and snapshot store, TOML configuration
//!
//! ## Key Components
//!
//! - [`StopwatchEngine`], [`CountdownEngine`], [`IntervalEngine`]
//! - [`TimerEngine`]: commands shared by every mode, including restore
//! - [`Database`]: history and snapshot persistence
//! - [`Config`]: application configuration management

pub mod clock;
pub mod completion;
pub mod driver;
pub mod error;
pub mod events;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, Millis, SystemClock};
pub use completion::{
    CompletionContext, CompletionReport, CompletionSettings, Feedback, Notifier, SessionSummary,
    SoundPlayer, SoundType, VibrationPattern, Vibrator,
};
pub use error::{ConfigError, CoreError, DatabaseError, FeedbackError, TimerError};
pub use events::Event;
pub use storage::{Config, Database, SnapshotStore};
pub use timer::{
    CountdownEngine, IntervalEngine, IntervalKind, IntervalPlan, KillSummary, RestoreOutcome,
    StopwatchEngine, Tickable, TimerEngine, TimerMode,
};
