//! Per-session mutual exclusion for the load-mutate-save unit.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

/// Hands out one async mutex per session.
///
/// Only the commit unit holds a session lock; reasoning calls for the same
/// session run unlocked. Locks nobody holds are pruned on the next lookup.
#[derive(Debug, Default)]
pub struct SessionLocks {
    locks: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl SessionLocks {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the lock for `session_id`, creating it if needed.
    pub fn lock_for(&self, session_id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        // The map is only touched synchronously, never across an await.
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.retain(|id, lock| *id == session_id || Arc::strong_count(lock) > 1);
        Arc::clone(locks.entry(session_id).or_default())
    }

    /// Number of sessions currently tracked.
    pub fn tracked(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_session_shares_a_lock() {
        let locks = SessionLocks::new();
        let id = Uuid::new_v4();
        assert!(Arc::ptr_eq(&locks.lock_for(id), &locks.lock_for(id)));
    }

    #[test]
    fn test_different_sessions_get_different_locks() {
        let locks = SessionLocks::new();
        assert!(!Arc::ptr_eq(
            &locks.lock_for(Uuid::new_v4()),
            &locks.lock_for(Uuid::new_v4())
        ));
    }

    #[test]
    fn test_idle_locks_are_pruned() {
        let locks = SessionLocks::new();
        let held = locks.lock_for(Uuid::new_v4());
        drop(locks.lock_for(Uuid::new_v4()));
        let _third = locks.lock_for(Uuid::new_v4());

        // The idle second lock is gone; the held one and the new one remain.
        assert_eq!(locks.tracked(), 2);
        drop(held);
    }
}
