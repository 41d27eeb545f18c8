//! The memory curator, run after a turn's delta has committed.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use loreforge_core::cancel::{CancellationToken, until_cancelled};
use loreforge_core::clock::Clock;
use loreforge_core::error::DomainError;
use loreforge_core::reasoning::{AgentRole, ReasoningRequest, ReasoningService};
use loreforge_core::repository::WorldStateRepository;
use loreforge_core::world::EventLogEntry;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::store::MemoryStore;
use crate::domain::record::{MemoryRecord, fallback_summary};

const SUMMARY_INSTRUCTIONS: &str = "You keep the long-term memory of a narrative role-playing game. \
Summarize the events of one turn in one short paragraph written in the past tense. \
Respond with JSON: {\"summary\": string}.";

/// Distills committed events into long-term memory.
#[async_trait]
pub trait MemoryCurator: Send + Sync {
    /// Curates the events `session_id` committed in `turn_number`.
    async fn curate(
        &self,
        session_id: Uuid,
        turn_number: i64,
        cancellation: &CancellationToken,
    ) -> Result<(), DomainError>;
}

/// Summarizes one committed turn of the event log into a [`MemoryRecord`].
///
/// The turn is named by the caller. Later turns committed in the meantime
/// are left for their own curation.
pub struct EventLogMemoryCurator {
    repository: Arc<dyn WorldStateRepository>,
    reasoning: Arc<dyn ReasoningService>,
    store: Arc<dyn MemoryStore>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for EventLogMemoryCurator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLogMemoryCurator").finish_non_exhaustive()
    }
}

impl EventLogMemoryCurator {
    /// Creates a curator.
    #[must_use]
    pub fn new(
        repository: Arc<dyn WorldStateRepository>,
        reasoning: Arc<dyn ReasoningService>,
        store: Arc<dyn MemoryStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            reasoning,
            store,
            clock,
        }
    }

    async fn summarize(
        &self,
        entries: &[EventLogEntry],
        cancellation: &CancellationToken,
    ) -> Result<String, DomainError> {
        let mut prompt = String::from("Events:\n");
        for entry in entries {
            let _ = writeln!(prompt, "- {}", entry.description);
        }
        let request = ReasoningRequest {
            role: AgentRole::MemoryCurator,
            instructions: SUMMARY_INSTRUCTIONS.to_owned(),
            prompt,
        };

        match until_cancelled(cancellation, self.reasoning.reason(&request)).await {
            Ok(response) => {
                let summary = response
                    .get("summary")
                    .and_then(serde_json::Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty());
                match summary {
                    Some(summary) => Ok(summary.to_owned()),
                    None => {
                        warn!("summary missing from reasoning output, using event descriptions");
                        Ok(fallback_summary(entries))
                    }
                }
            }
            Err(DomainError::Cancelled) => Err(DomainError::Cancelled),
            Err(e) => {
                warn!(error = %e, "summary request failed, using event descriptions");
                Ok(fallback_summary(entries))
            }
        }
    }
}

#[async_trait]
impl MemoryCurator for EventLogMemoryCurator {
    #[instrument(skip(self, cancellation))]
    async fn curate(
        &self,
        session_id: Uuid,
        turn_number: i64,
        cancellation: &CancellationToken,
    ) -> Result<(), DomainError> {
        let world =
            until_cancelled(cancellation, self.repository.load_world_state(session_id)).await?;
        let entries: Vec<EventLogEntry> = world.entries_for_turn(turn_number).cloned().collect();
        if entries.is_empty() {
            debug!(latest_turn = world.turn_number, "nothing to curate");
            return Ok(());
        }

        let summary = self.summarize(&entries, cancellation).await?;
        let record = MemoryRecord {
            session_id,
            turn_number,
            summary,
            source_events: entries.into_iter().map(|e| e.description).collect(),
            recorded_at: self.clock.now(),
        };
        until_cancelled(cancellation, self.store.save_memory(&record)).await?;

        info!(turn_number = record.turn_number, "memory recorded");
        Ok(())
    }
}
