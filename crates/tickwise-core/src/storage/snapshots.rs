//! Snapshot store: one serialized snapshot per timer mode.
//!
//! Reads never fail outward. A missing key, an unreadable store or a
//! snapshot that no longer parses all yield the mode's default snapshot,
//! which restores as a stopped timer.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::Result;
use crate::timer::TimerMode;

pub trait SnapshotStore {
    fn load_raw(&self, key: &str) -> Result<Option<String>>;
    fn save_raw(&self, key: &str, value: &str) -> Result<()>;
}

pub fn snapshot_key(mode: TimerMode) -> String {
    format!("snapshot.{}", mode.as_str())
}

/// Load the snapshot for `mode`, degrading to the default on any failure.
pub fn load_snapshot<T, S>(store: &S, mode: TimerMode) -> T
where
    T: DeserializeOwned + Default,
    S: SnapshotStore + ?Sized,
{
    let key = snapshot_key(mode);
    match store.load_raw(&key) {
        Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
            warn!(%mode, error = %e, "discarding unreadable snapshot");
            T::default()
        }),
        Ok(None) => T::default(),
        Err(e) => {
            warn!(%mode, error = %e, "snapshot store unavailable");
            T::default()
        }
    }
}

/// # Errors
/// Returns an error if serialization or the store write fails.
pub fn save_snapshot<T, S>(store: &S, mode: TimerMode, snapshot: &T) -> Result<()>
where
    T: Serialize,
    S: SnapshotStore + ?Sized,
{
    let json = serde_json::to_string(snapshot)?;
    store.save_raw(&snapshot_key(mode), &json)
}

/// In-process store, for tests and embedders without a database.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn load_raw(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn save_raw(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
