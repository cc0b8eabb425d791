//! Completion fan-out.
//!
//! When a countdown reaches zero or an interval session hits its loop target
//! the engine hands a [`SessionSummary`] to [`dispatch`], which runs, in
//! order: sound, vibration, desktop notification, the session-complete
//! callback and the timer-complete callback. Each step is isolated: an `Err`
//! or a panic is logged and the next step still runs.
//!
//! Feedback collaborators are injected capability traits rather than global
//! managers, so engines can be tested with fakes.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::clock::Millis;
use crate::error::FeedbackError;
use crate::timer::TimerMode;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundType {
    #[default]
    Bell,
    Chime,
    Digital,
    Gentle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VibrationPattern {
    #[default]
    Short,
    Long,
    Double,
    Pulse,
}

impl VibrationPattern {
    /// Alternating on/off durations in milliseconds.
    pub fn durations_ms(self) -> &'static [u64] {
        match self {
            VibrationPattern::Short => &[200],
            VibrationPattern::Long => &[800],
            VibrationPattern::Double => &[200, 100, 200],
            VibrationPattern::Pulse => &[100, 100, 100, 100, 100],
        }
    }
}

/// Immutable feedback settings captured when a session is configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionSettings {
    pub sound_enabled: bool,
    pub sound_type: SoundType,
    /// 0..=100
    pub volume: u8,
    pub vibration_enabled: bool,
    pub vibration_pattern: VibrationPattern,
    pub notification_enabled: bool,
    /// Overrides the generated notification body.
    pub notification_message: Option<String>,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            sound_type: SoundType::default(),
            volume: 50,
            vibration_enabled: true,
            vibration_pattern: VibrationPattern::default(),
            notification_enabled: true,
            notification_message: None,
        }
    }
}

pub trait SoundPlayer: Send + Sync {
    fn play(&self, sound: SoundType, volume: u8) -> Result<(), FeedbackError>;
}

pub trait Vibrator: Send + Sync {
    fn vibrate(&self, pattern: VibrationPattern) -> Result<(), FeedbackError>;
}

pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str) -> Result<(), FeedbackError>;
}

/// The set of feedback collaborators available to an engine.
#[derive(Clone, Default)]
pub struct Feedback {
    pub sound: Option<Arc<dyn SoundPlayer>>,
    pub vibration: Option<Arc<dyn Vibrator>>,
    pub notifier: Option<Arc<dyn Notifier>>,
}

impl fmt::Debug for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Feedback")
            .field("sound", &self.sound.is_some())
            .field("vibration", &self.vibration.is_some())
            .field("notifier", &self.notifier.is_some())
            .finish()
    }
}

/// What a finished session hands to the completion fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub mode: TimerMode,
    pub duration_ms: Millis,
    pub cycle_count: u32,
    pub session_name: Option<String>,
    pub target_loop_count: Option<u32>,
    pub completed_at: Millis,
}

pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;
pub type SessionCompleteFn = Box<dyn FnMut(&SessionSummary) -> Result<(), CallbackError> + Send>;
pub type TimerCompleteFn = Box<dyn FnMut() + Send>;

/// Optional callback slots.
///
/// `session_complete` drives history recording; `timer_complete` is a bare
/// UI hook with no data.
#[derive(Default)]
pub struct SessionCallbacks {
    pub session_complete: Option<SessionCompleteFn>,
    pub timer_complete: Option<TimerCompleteFn>,
}

impl fmt::Debug for SessionCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCallbacks")
            .field("session_complete", &self.session_complete.is_some())
            .field("timer_complete", &self.timer_complete.is_some())
            .finish()
    }
}

/// Everything an engine needs to fan out a completion.
#[derive(Debug, Default)]
pub struct CompletionContext {
    pub settings: CompletionSettings,
    pub feedback: Feedback,
    pub callbacks: SessionCallbacks,
}

impl CompletionContext {
    pub fn new(settings: CompletionSettings, feedback: Feedback) -> Self {
        Self {
            settings,
            feedback,
            callbacks: SessionCallbacks::default(),
        }
    }

    pub fn on_session_complete<F>(mut self, f: F) -> Self
    where
        F: FnMut(&SessionSummary) -> Result<(), CallbackError> + Send + 'static,
    {
        self.callbacks.session_complete = Some(Box::new(f));
        self
    }

    pub fn on_timer_complete<F>(mut self, f: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        self.callbacks.timer_complete = Some(Box::new(f));
        self
    }

    pub fn dispatch(&mut self, summary: &SessionSummary) -> CompletionReport {
        dispatch(summary, &self.settings, &self.feedback, &mut self.callbacks)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStep {
    Sound,
    Vibration,
    Notification,
    SessionComplete,
    TimerComplete,
}

/// Which steps ran, failed, or were skipped (disabled or not wired).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionReport {
    pub succeeded: Vec<CompletionStep>,
    pub failed: Vec<CompletionStep>,
    pub skipped: Vec<CompletionStep>,
}

impl CompletionReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Run the completion fan-out for `summary`.
pub fn dispatch(
    summary: &SessionSummary,
    settings: &CompletionSettings,
    feedback: &Feedback,
    callbacks: &mut SessionCallbacks,
) -> CompletionReport {
    let mut report = CompletionReport::default();

    match feedback.sound.as_deref().filter(|_| settings.sound_enabled) {
        Some(player) => isolate(CompletionStep::Sound, &mut report, || {
            player
                .play(settings.sound_type, settings.volume.min(100))
                .map_err(|e| e.to_string())
        }),
        None => report.skipped.push(CompletionStep::Sound),
    }

    match feedback
        .vibration
        .as_deref()
        .filter(|_| settings.vibration_enabled)
    {
        Some(vibrator) => isolate(CompletionStep::Vibration, &mut report, || {
            vibrator
                .vibrate(settings.vibration_pattern)
                .map_err(|e| e.to_string())
        }),
        None => report.skipped.push(CompletionStep::Vibration),
    }

    match feedback
        .notifier
        .as_deref()
        .filter(|_| settings.notification_enabled)
    {
        Some(notifier) => {
            let title = notification_title(summary);
            let body = settings
                .notification_message
                .clone()
                .unwrap_or_else(|| notification_body(summary));
            isolate(CompletionStep::Notification, &mut report, || {
                notifier.notify(&title, &body).map_err(|e| e.to_string())
            })
        }
        None => report.skipped.push(CompletionStep::Notification),
    }

    match callbacks.session_complete.as_mut() {
        Some(callback) => isolate(CompletionStep::SessionComplete, &mut report, || {
            callback(summary).map_err(|e| e.to_string())
        }),
        None => report.skipped.push(CompletionStep::SessionComplete),
    }

    match callbacks.timer_complete.as_mut() {
        Some(callback) => isolate(CompletionStep::TimerComplete, &mut report, || {
            callback();
            Ok(())
        }),
        None => report.skipped.push(CompletionStep::TimerComplete),
    }

    debug!(
        mode = %summary.mode,
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        "completion dispatched"
    );
    report
}

fn isolate<F>(step: CompletionStep, report: &mut CompletionReport, f: F)
where
    F: FnOnce() -> Result<(), String>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => report.succeeded.push(step),
        Ok(Err(message)) => {
            warn!(?step, %message, "completion step failed");
            report.failed.push(step);
        }
        Err(payload) => {
            error!(?step, message = panic_message(payload.as_ref()), "completion step panicked");
            report.failed.push(step);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

fn notification_title(summary: &SessionSummary) -> String {
    match summary.mode {
        TimerMode::Stopwatch => "Stopwatch stopped".to_string(),
        TimerMode::Countdown => "Countdown finished".to_string(),
        TimerMode::Interval => "Interval session complete".to_string(),
    }
}

fn notification_body(summary: &SessionSummary) -> String {
    let minutes = summary.duration_ms / 60_000;
    match (&summary.session_name, summary.mode) {
        (Some(name), TimerMode::Interval) => {
            format!("{name}: {} cycles in {minutes} min", summary.cycle_count)
        }
        (None, TimerMode::Interval) => {
            format!("{} cycles in {minutes} min", summary.cycle_count)
        }
        _ => format!("{minutes} min elapsed"),
    }
}
