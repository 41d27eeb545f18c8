//! Test repositories — `WorldStateRepository` doubles.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use loreforge_core::error::DomainError;
use loreforge_core::repository::WorldStateRepository;
use loreforge_core::world::WorldState;
use uuid::Uuid;

/// An in-memory repository that counts loads and saves.
///
/// Worlds are stored as serialized JSON so a test can compare the persisted
/// form byte for byte before and after a turn.
#[derive(Debug, Default)]
pub struct InMemoryWorldStateRepository {
    worlds: Mutex<HashMap<Uuid, String>>,
    loads: AtomicUsize,
    saves: AtomicUsize,
}

impl InMemoryWorldStateRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository holding `state`.
    ///
    /// # Panics
    ///
    /// Panics if the state cannot be serialized.
    #[must_use]
    pub fn with_world(state: &WorldState) -> Self {
        let repo = Self::new();
        repo.worlds.lock().unwrap().insert(
            state.session_id,
            serde_json::to_string(state).expect("world state serializes"),
        );
        repo
    }

    /// Returns the stored world, if any.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn snapshot(&self, session_id: Uuid) -> Option<WorldState> {
        self.raw(session_id)
            .map(|raw| serde_json::from_str(&raw).expect("stored world deserializes"))
    }

    /// Returns the serialized form of the stored world, if any.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn raw(&self, session_id: Uuid) -> Option<String> {
        self.worlds.lock().unwrap().get(&session_id).cloned()
    }

    /// Number of `load_world_state` calls.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Number of successful `save_world_state` calls.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorldStateRepository for InMemoryWorldStateRepository {
    async fn load_world_state(&self, session_id: Uuid) -> Result<WorldState, DomainError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let raw = self.worlds.lock().unwrap().get(&session_id).cloned();
        match raw {
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|e| DomainError::Infrastructure(format!("corrupt world state: {e}"))),
            None => Ok(WorldState::new(session_id)),
        }
    }

    async fn save_world_state(&self, state: &WorldState) -> Result<(), DomainError> {
        let raw = serde_json::to_string(state)
            .map_err(|e| DomainError::Infrastructure(format!("serialization failed: {e}")))?;
        self.worlds.lock().unwrap().insert(state.session_id, raw);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A repository whose loads succeed from a fixed world but whose saves
/// always fail. Useful for testing the persistence failure path.
#[derive(Debug)]
pub struct FailingWorldStateRepository {
    world: WorldState,
    fail_loads: bool,
}

impl FailingWorldStateRepository {
    /// Loads return `world`; every save fails.
    #[must_use]
    pub fn failing_saves(world: WorldState) -> Self {
        Self {
            world,
            fail_loads: false,
        }
    }

    /// Every load and save fails.
    #[must_use]
    pub fn failing_everything() -> Self {
        Self {
            world: WorldState::new(Uuid::nil()),
            fail_loads: true,
        }
    }
}

#[async_trait]
impl WorldStateRepository for FailingWorldStateRepository {
    async fn load_world_state(&self, _session_id: Uuid) -> Result<WorldState, DomainError> {
        if self.fail_loads {
            return Err(DomainError::Infrastructure("connection refused".into()));
        }
        Ok(self.world.clone())
    }

    async fn save_world_state(&self, _state: &WorldState) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}
