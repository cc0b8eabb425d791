//! Error types for the Tickwise core library.
//!
//! Only [`TimerError`] is meant to reach the user; feedback failures, restore
//! degradation and lock contention are logged and absorbed inside the engines.

use std::path::PathBuf;
use thiserror::Error;

use crate::timer::TimerMode;

/// Top-level error type for core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Rejected timer command
    #[error("Timer error: {0}")]
    Timer(#[from] TimerError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Invalid input handed to a timer engine.
///
/// Every variant is produced before any state is touched, so a caller that
/// receives one can assume the engine is exactly as it was.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimerError {
    /// Duration was zero, negative, NaN or infinite
    #[error("Invalid duration for '{field}': {value} (enter a positive, finite number of milliseconds)")]
    InvalidDuration { field: &'static str, value: f64 },

    /// Loop target was zero or negative
    #[error("Invalid loop count: {0} (must be at least 1)")]
    InvalidLoopCount(i64),

    /// `start` called on a running timer
    #[error("{0} timer is already running")]
    AlreadyActive(TimerMode),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Failure reported by a sound, vibration or notification collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedbackError {
    /// Capability not present on this platform
    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),

    /// Collaborator tried and failed
    #[error("{channel} failed: {message}")]
    Failed {
        channel: &'static str,
        message: String,
    },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for CoreError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        CoreError::Custom(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_error_messages_are_user_facing() {
        let err = TimerError::InvalidDuration {
            field: "duration",
            value: -5.0,
        };
        assert!(err.to_string().contains("positive"));
        assert_eq!(
            TimerError::AlreadyActive(TimerMode::Countdown).to_string(),
            "countdown timer is already running"
        );
    }

    #[test]
    fn timer_error_converts_into_core_error() {
        let core: CoreError = TimerError::InvalidLoopCount(0).into();
        assert!(matches!(core, CoreError::Timer(TimerError::InvalidLoopCount(0))));
    }
}
