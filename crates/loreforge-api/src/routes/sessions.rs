//! Routes for playing turns in a session and viewing its world.

use std::time::Duration;

use axum::extract::{Path, State};
use axum::{Json, Router, routing::get, routing::post};
use chrono::{DateTime, Utc};
use loreforge_core::cancel::CancellationToken;
use loreforge_core::error::DomainError;
use loreforge_core::world::{EventLogEntry, SceneState, WorldState};
use loreforge_narrative::domain::report::{TurnOutcome, TurnReport};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Longest accepted player input, in characters.
const MAX_INPUT_CHARS: usize = 2_000;

/// Request body for POST /{id}/turns.
#[derive(Debug, Deserialize)]
pub struct TurnRequest {
    /// What the player wants to do.
    pub input: String,
}

/// Response body for a played turn.
#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub narrative: String,
    pub outcome: TurnOutcome,
    pub committed_turn: Option<i64>,
}

impl From<TurnReport> for TurnResponse {
    fn from(report: TurnReport) -> Self {
        Self {
            narrative: report.narrative,
            outcome: report.outcome,
            committed_turn: report.committed_turn,
        }
    }
}

/// Response body for GET /{id}/world.
#[derive(Debug, Serialize)]
pub struct WorldView {
    pub session_id: Uuid,
    pub turn_number: i64,
    pub scene: SceneState,
    pub event_log: Vec<EventLogEntry>,
    pub last_save_time: Option<DateTime<Utc>>,
}

impl From<WorldState> for WorldView {
    fn from(world: WorldState) -> Self {
        Self {
            session_id: world.session_id,
            turn_number: world.turn_number,
            scene: world.scene,
            event_log: world.event_log,
            last_save_time: world.last_save_time,
        }
    }
}

/// POST /{id}/turns
///
/// The turn is cancelled when it exceeds the configured timeout or when the
/// client goes away, except once its commit has started.
#[instrument(skip(state, request), fields(session_id = %session_id))]
async fn play_turn(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<TurnRequest>,
) -> Result<Json<TurnResponse>, ApiError> {
    let input = request.input.trim();
    if input.is_empty() {
        return Err(DomainError::Validation("input must not be empty".into()).into());
    }
    if input.chars().count() > MAX_INPUT_CHARS {
        return Err(DomainError::Validation(format!(
            "input must be at most {MAX_INPUT_CHARS} characters"
        ))
        .into());
    }

    let cancellation = CancellationToken::new();
    let _cancel_on_drop = cancellation.clone().drop_guard();
    let report = with_deadline(
        &cancellation,
        state.turn_timeout,
        state
            .pipeline
            .process_turn_report(session_id, input, &cancellation),
    )
    .await?;

    info!(outcome = ?report.outcome, committed_turn = ?report.committed_turn, "turn played");
    Ok(Json(report.into()))
}

/// Drives `work` to completion, cancelling `cancellation` once `timeout`
/// elapses. The deadline lives in the caller's task, so dropping the returned
/// future (a client disconnect) leaves nothing running.
async fn with_deadline<F: Future>(
    cancellation: &CancellationToken,
    timeout: Duration,
    work: F,
) -> F::Output {
    tokio::pin!(work);
    tokio::select! {
        output = &mut work => output,
        () = tokio::time::sleep(timeout) => {
            cancellation.cancel();
            work.await
        }
    }
}

/// GET /{id}/world
#[instrument(skip(state))]
async fn world(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<WorldView>, ApiError> {
    let world = state.worlds.load_world_state(session_id).await?;
    Ok(Json(world.into()))
}

/// Returns the router for sessions.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/turns", post(play_turn))
        .route("/{id}/world", get(world))
}
