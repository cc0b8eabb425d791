//! Completion feedback available to a terminal process.
//!
//! Sound is the terminal bell, notifications go through the desktop's
//! notification command, and vibration is never available.

use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::thread::JoinHandle;

use tickwise_core::completion::{Feedback, Notifier, SoundPlayer, SoundType, Vibrator};
use tickwise_core::{FeedbackError, VibrationPattern};
use tracing::debug;

pub fn terminal_feedback() -> Feedback {
    Feedback {
        sound: Some(Arc::new(TerminalBell)),
        vibration: Some(Arc::new(NoVibration)),
        notifier: Some(Arc::new(DesktopNotifier)),
    }
}

/// Rings the terminal bell on stderr; richer sounds ring more than once.
pub struct TerminalBell;

impl SoundPlayer for TerminalBell {
    fn play(&self, sound: SoundType, volume: u8) -> Result<(), FeedbackError> {
        if volume == 0 {
            return Ok(());
        }
        let rings = match sound {
            SoundType::Bell | SoundType::Gentle => 1,
            SoundType::Chime => 2,
            SoundType::Digital => 3,
        };
        let failed = |e: std::io::Error| FeedbackError::Failed {
            channel: "sound",
            message: e.to_string(),
        };
        let mut stderr = std::io::stderr().lock();
        for _ in 0..rings {
            stderr.write_all(b"\x07").map_err(failed)?;
        }
        stderr.flush().map_err(failed)
    }
}

pub struct NoVibration;

impl Vibrator for NoVibration {
    fn vibrate(&self, _pattern: VibrationPattern) -> Result<(), FeedbackError> {
        Err(FeedbackError::Unsupported("vibration"))
    }
}

/// Desktop notification sent without blocking; the child is reaped on a
/// detached thread.
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, body: &str) -> Result<(), FeedbackError> {
        spawn_reaped(notification_command(title, body)?).map(drop)
    }
}

fn spawn_reaped(mut command: Command) -> Result<JoinHandle<()>, FeedbackError> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| FeedbackError::Failed {
            channel: "notification",
            message: e.to_string(),
        })?;
    Ok(std::thread::spawn(move || {
        if let Err(e) = child.wait() {
            debug!(error = %e, "notification process could not be reaped");
        }
    }))
}

#[cfg(target_os = "macos")]
fn notification_command(title: &str, body: &str) -> Result<Command, FeedbackError> {
    let quote = |s: &str| s.replace('\\', "\\\\").replace('"', "\\\"");
    let mut command = Command::new("osascript");
    command.arg("-e").arg(format!(
        "display notification \"{}\" with title \"{}\"",
        quote(body),
        quote(title)
    ));
    Ok(command)
}

#[cfg(all(unix, not(target_os = "macos")))]
fn notification_command(title: &str, body: &str) -> Result<Command, FeedbackError> {
    let mut command = Command::new("notify-send");
    command.arg("--app-name=tickwise").arg(title).arg(body);
    Ok(command)
}

#[cfg(not(unix))]
fn notification_command(_title: &str, _body: &str) -> Result<Command, FeedbackError> {
    Err(FeedbackError::Unsupported("desktop notification"))
}
