//! Time source for commit timestamps and memory records.

use chrono::{DateTime, Utc};

/// Supplies "now" to the stages that stamp persisted data.
///
/// The world-state applier reads it once per commit, so every entry appended
/// in the same turn carries the same timestamp.
pub trait Clock: Send + Sync {
    /// Returns the current instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock used by the server.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
