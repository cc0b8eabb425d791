//! SQLite-based session history and snapshot storage.
//!
//! Provides persistent storage for:
//! - Completed countdown and interval sessions
//! - History statistics (today and all-time)
//! - Key-value store backing [`SnapshotStore`]

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::data_dir;
use super::snapshots::SnapshotStore;
use crate::clock::to_datetime;
use crate::completion::SessionSummary;
use crate::error::{CoreError, DatabaseError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub mode: String,
    pub duration_ms: u64,
    pub cycle_count: u32,
    pub session_name: Option<String>,
    pub target_loop_count: Option<u32>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total_sessions: u64,
    pub total_duration_ms: u64,
    pub countdown_sessions: u64,
    pub interval_sessions: u64,
    pub interval_cycles: u64,
    pub today_sessions: u64,
    pub today_duration_ms: u64,
}

/// SQLite database for history and snapshots.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data_dir>/tickwise.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("tickwise.db");
        Self::open_at(&path)
    }

    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id                TEXT PRIMARY KEY,
                mode              TEXT NOT NULL,
                duration_ms       INTEGER NOT NULL,
                cycle_count       INTEGER NOT NULL DEFAULT 0,
                session_name      TEXT,
                target_loop_count INTEGER,
                completed_at      TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_completed_at ON sessions(completed_at);
            CREATE INDEX IF NOT EXISTS idx_sessions_mode ON sessions(mode);",
        )?;
        Ok(())
    }

    /// Record a completed session. Returns the new record id.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_session(&self, summary: &SessionSummary) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.conn
            .execute(
                "INSERT INTO sessions
                    (id, mode, duration_ms, cycle_count, session_name, target_loop_count, completed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    id,
                    summary.mode.as_str(),
                    summary.duration_ms,
                    summary.cycle_count,
                    summary.session_name,
                    summary.target_loop_count,
                    to_datetime(summary.completed_at).to_rfc3339(),
                ],
            )
            .map_err(DatabaseError::from)?;
        Ok(id)
    }

    /// Most recent sessions first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn list_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, mode, duration_ms, cycle_count, session_name, target_loop_count, completed_at
             FROM sessions
             ORDER BY completed_at DESC
             LIMIT ?1",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![limit], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u64>(2)?,
                row.get::<_, u32>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<u32>>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, mode, duration_ms, cycle_count, session_name, target_loop_count, at) = row?;
            let completed_at = DateTime::parse_from_rfc3339(&at)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| CoreError::Custom(format!("bad timestamp in history: {e}")))?;
            records.push(SessionRecord {
                id,
                mode,
                duration_ms,
                cycle_count,
                session_name,
                target_loop_count,
                completed_at,
            });
        }
        Ok(records)
    }

    /// # Errors
    /// Returns an error if the query fails.
    pub fn stats_all(&self) -> Result<Stats> {
        let mut stmt = self.conn.prepare(
            "SELECT mode, COUNT(*), COALESCE(SUM(duration_ms), 0), COALESCE(SUM(cycle_count), 0)
             FROM sessions
             GROUP BY mode",
        )?;

        let mut stats = Stats::default();
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, u64>(2)?,
                row.get::<_, u64>(3)?,
            ))
        })?;

        for row in rows {
            let (mode, count, duration, cycles) = row?;
            stats.total_sessions += count;
            stats.total_duration_ms += duration;
            match mode.as_str() {
                "countdown" => stats.countdown_sessions += count,
                "interval" => {
                    stats.interval_sessions += count;
                    stats.interval_cycles += cycles;
                }
                _ => {}
            }
        }

        let today = Utc::now().format("%Y-%m-%d").to_string();
        let (today_sessions, today_duration_ms) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(duration_ms), 0)
             FROM sessions
             WHERE completed_at >= ?1",
            params![format!("{today}T00:00:00+00:00")],
            |row| Ok((row.get::<_, u64>(0)?, row.get::<_, u64>(1)?)),
        )?;
        stats.today_sessions = today_sessions;
        stats.today_duration_ms = today_duration_ms;

        Ok(stats)
    }

    /// Get a value from the kv store.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        Ok(self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?)
    }

    /// Set a value in the kv store.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl SnapshotStore for Database {
    fn load_raw(&self, key: &str) -> Result<Option<String>> {
        Ok(self.kv_get(key)?)
    }

    fn save_raw(&self, key: &str, value: &str) -> Result<()> {
        Ok(self.kv_set(key, value)?)
    }
}
