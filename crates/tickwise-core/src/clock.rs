//! Clock source shared by every timer engine.
//!
//! Engines read `now_ms()` once per command or tick and derive everything
//! from absolute timestamps, so a late or duplicated tick never skews the
//! result.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Wall-clock milliseconds since the Unix epoch.
pub type Millis = u64;

/// Clock abstraction so timing can be faked in tests.
pub trait Clock: Send + Sync + Debug {
    fn now_ms(&self) -> Millis;
}

/// Wall clock backed by `chrono::Utc::now()`.
///
/// Wall time (not `Instant`) is required because snapshots must stay
/// meaningful across process restarts.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> Millis {
        u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
    }
}

/// Manually advanced clock for tests and simulations.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: Millis) -> Arc<Self> {
        Arc::new(Self {
            now: AtomicU64::new(start_ms),
        })
    }

    pub fn set(&self, ms: Millis) {
        self.now.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: Millis) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Millis {
        self.now.load(Ordering::SeqCst)
    }
}

/// Convert a clock reading into a UTC timestamp for events and history rows.
pub fn to_datetime(ms: Millis) -> DateTime<Utc> {
    i64::try_from(ms)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or_default()
}
