mod config;
pub mod database;
pub mod snapshots;

pub use config::{Config, FeedbackConfig, IntervalDefaults, TickerConfig};
pub use database::{Database, SessionRecord, Stats};
pub use snapshots::{load_snapshot, save_snapshot, snapshot_key, MemoryStore, SnapshotStore};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the Tickwise data directory, creating it if needed.
///
/// `TICKWISE_DATA_DIR` wins when set. Otherwise `~/.config/tickwise`, or
/// `~/.config/tickwise-dev` when `TICKWISE_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("TICKWISE_DATA_DIR") {
        Some(custom) if !custom.is_empty() => PathBuf::from(custom),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("TICKWISE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("tickwise-dev")
            } else {
                base_dir.join("tickwise")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
