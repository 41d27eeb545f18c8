//! Builds the per-turn context snapshot from the persisted world.

use std::sync::Arc;

use async_trait::async_trait;
use loreforge_core::cancel::{CancellationToken, until_cancelled};
use loreforge_core::context::ContextSnapshot;
use loreforge_core::error::DomainError;
use loreforge_core::repository::WorldStateRepository;
use loreforge_core::world::WorldState;
use tracing::instrument;
use uuid::Uuid;

/// Prefix of event log entries recorded from `Dialogue` events.
const DIALOGUE_PREFIX: &str = "Dialogue:";

/// Assembles the context a turn is decided in.
#[async_trait]
pub trait ContextBuilder: Send + Sync {
    /// Builds a fresh snapshot for `session_id`.
    async fn build_context(
        &self,
        session_id: Uuid,
        player_input: &str,
        cancellation: &CancellationToken,
    ) -> Result<ContextSnapshot, DomainError>;
}

/// Reads the session's world without taking the session lock.
pub struct WorldContextBuilder {
    repository: Arc<dyn WorldStateRepository>,
    recent_event_window: usize,
}

impl std::fmt::Debug for WorldContextBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorldContextBuilder")
            .field("recent_event_window", &self.recent_event_window)
            .finish_non_exhaustive()
    }
}

impl WorldContextBuilder {
    /// Creates a builder that includes up to `recent_event_window` log entries.
    #[must_use]
    pub fn new(repository: Arc<dyn WorldStateRepository>, recent_event_window: usize) -> Self {
        Self {
            repository,
            recent_event_window,
        }
    }
}

/// Builds a snapshot from `world`.
#[must_use]
pub fn snapshot_of(world: &WorldState, recent_event_window: usize) -> ContextSnapshot {
    let dialogue: Vec<String> = world
        .event_log
        .iter()
        .filter_map(|entry| entry.description.strip_prefix(DIALOGUE_PREFIX))
        .map(|line| line.trim().to_owned())
        .collect();
    let skip = dialogue.len().saturating_sub(recent_event_window);

    ContextSnapshot {
        session_id: world.session_id,
        scene_id: world.scene.scene_id.clone(),
        scene_summary: world.scene.summary.clone(),
        dialogue_recap: dialogue.into_iter().skip(skip).collect(),
        recent_events: world.recent_events(recent_event_window).to_vec(),
        time_of_day: world.scene.time_of_day.clone(),
        weather: world.scene.weather.clone(),
    }
}

#[async_trait]
impl ContextBuilder for WorldContextBuilder {
    #[instrument(skip(self, _player_input, cancellation))]
    async fn build_context(
        &self,
        session_id: Uuid,
        _player_input: &str,
        cancellation: &CancellationToken,
    ) -> Result<ContextSnapshot, DomainError> {
        let world = until_cancelled(cancellation, self.repository.load_world_state(session_id)).await?;
        Ok(snapshot_of(&world, self.recent_event_window))
    }
}
