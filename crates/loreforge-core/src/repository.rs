//! World state repository abstraction.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DomainError;
use crate::world::WorldState;

/// Loads and saves the canonical world state of a session.
#[async_trait]
pub trait WorldStateRepository: Send + Sync {
    /// Loads the world for `session_id`. A session that was never saved
    /// loads as a fresh world at turn 0.
    async fn load_world_state(&self, session_id: Uuid) -> Result<WorldState, DomainError>;

    /// Persists the whole world state, replacing the previous save.
    async fn save_world_state(&self, state: &WorldState) -> Result<(), DomainError>;
}
