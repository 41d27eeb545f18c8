//! `PostgreSQL` implementation of the `WorldStateRepository` trait.

use async_trait::async_trait;
use loreforge_core::error::DomainError;
use loreforge_core::repository::WorldStateRepository;
use loreforge_core::world::WorldState;
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::debug;
use uuid::Uuid;

use crate::infrastructure;

/// Stores each session's world as one JSONB document.
#[derive(Debug, Clone)]
pub struct PgWorldStateRepository {
    pool: PgPool,
}

impl PgWorldStateRepository {
    /// Creates a new `PgWorldStateRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorldStateRepository for PgWorldStateRepository {
    async fn load_world_state(&self, session_id: Uuid) -> Result<WorldState, DomainError> {
        let row: Option<(Json<WorldState>,)> =
            sqlx::query_as("SELECT state FROM world_states WHERE session_id = $1")
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| infrastructure("loading world state", &e))?;

        Ok(match row {
            Some((Json(world),)) => world,
            None => {
                debug!(%session_id, "no saved world, starting fresh");
                WorldState::new(session_id)
            }
        })
    }

    async fn save_world_state(&self, state: &WorldState) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO world_states (session_id, turn_number, state, updated_at) \
             VALUES ($1, $2, $3, NOW()) \
             ON CONFLICT (session_id) DO UPDATE \
             SET turn_number = EXCLUDED.turn_number, state = EXCLUDED.state, updated_at = NOW()",
        )
        .bind(state.session_id)
        .bind(state.turn_number)
        .bind(Json(state))
        .execute(&self.pool)
        .await
        .map_err(|e| infrastructure("saving world state", &e))?;
        Ok(())
    }
}
