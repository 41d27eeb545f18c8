//! The turn pipeline.
//!
//! ```text
//! Start -> ContextBuilt -> Guarded{Valid|Reject} -> [Reject: Done]
//!       -> Directed -> Resolved{Completed|Error} -> [no delta: Done]
//!       -> Applied -> Curated -> Done
//! ```
//!
//! Curation covers the turn the commit produced. A delta that was already
//! applied on an earlier attempt is not curated again.
//!
//! Stages run strictly in sequence. Cancellation is honored at every
//! suspension point up to the state commit; once the commit unit has started
//! it runs to completion. Side effects only happen after the guard approves.

use std::sync::Arc;

use loreforge_core::cancel::{CancellationToken, until_cancelled};
use loreforge_memory::application::curator::MemoryCurator;
use loreforge_rules::application::executor::DomainExecutor;
use loreforge_rules::domain::result::ResolutionStatus;
use loreforge_world_state::application::applier::WorldStateApplier;
use loreforge_world_state::domain::commit::CommitOutcome;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::context::ContextBuilder;
use super::guard::Guard;
use super::plot::PlotDirector;
use crate::domain::error::TurnError;
use crate::domain::report::{TurnOutcome, TurnReport, TurnStage};

/// The collaborators a pipeline is composed of.
pub struct TurnStages {
    pub context_builder: Arc<dyn ContextBuilder>,
    pub guard: Arc<dyn Guard>,
    pub plot_director: Arc<dyn PlotDirector>,
    pub executor: Arc<dyn DomainExecutor>,
    pub applier: Arc<WorldStateApplier>,
    pub curator: Arc<dyn MemoryCurator>,
}

/// Runs player turns.
pub struct TurnPipeline {
    stages: TurnStages,
}

impl std::fmt::Debug for TurnPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnPipeline").finish_non_exhaustive()
    }
}

impl TurnPipeline {
    /// Composes a pipeline.
    #[must_use]
    pub fn new(stages: TurnStages) -> Self {
        Self { stages }
    }

    /// Runs one turn and returns its narrative.
    ///
    /// # Errors
    ///
    /// See [`TurnPipeline::process_turn_report`].
    pub async fn process_turn(
        &self,
        session_id: Uuid,
        player_input: &str,
        cancellation: &CancellationToken,
    ) -> Result<String, TurnError> {
        self.process_turn_report(session_id, player_input, cancellation)
            .await
            .map(|report| report.narrative)
    }

    /// Runs one turn and reports how it ended.
    ///
    /// Guard rejections and failed resolutions are reported, not returned as
    /// errors. A curation failure is recorded in the report; the commit it
    /// follows stands.
    ///
    /// # Errors
    ///
    /// Returns `TurnError::Cancelled` if cancellation is observed before the
    /// commit, `TurnError::Persistence` if the commit fails, and
    /// `TurnError::Collaborator` if any other collaborator fails.
    #[instrument(skip(self, player_input, cancellation))]
    pub async fn process_turn_report(
        &self,
        session_id: Uuid,
        player_input: &str,
        cancellation: &CancellationToken,
    ) -> Result<TurnReport, TurnError> {
        let stages = &self.stages;

        let context = until_cancelled(
            cancellation,
            stages
                .context_builder
                .build_context(session_id, player_input, cancellation),
        )
        .await
        .map_err(|e| TurnError::at(TurnStage::BuildContext, e))?;

        let decision = until_cancelled(
            cancellation,
            stages.guard.assess(&context, player_input, cancellation),
        )
        .await
        .map_err(|e| TurnError::at(TurnStage::Guard, e))?;
        if decision.is_reject() {
            info!("turn rejected by guard");
            return Ok(TurnReport {
                narrative: decision.rejection_narrative().to_owned(),
                outcome: TurnOutcome::Rejected,
                committed_turn: None,
                curation_error: None,
            });
        }

        let directive = until_cancelled(
            cancellation,
            stages.plot_director.direct(&context, player_input, cancellation),
        )
        .await
        .map_err(|e| TurnError::at(TurnStage::Direct, e))?;

        let result = until_cancelled(
            cancellation,
            stages
                .executor
                .execute(&context, &directive, player_input, cancellation),
        )
        .await
        .map_err(|e| TurnError::at(TurnStage::Resolve, e))?;
        info!(status = ?result.status, has_delta = result.state_delta.is_some(), "turn resolved");

        let outcome = match result.status {
            ResolutionStatus::Completed => TurnOutcome::Completed,
            ResolutionStatus::Error => TurnOutcome::Failed,
        };
        if result.status == ResolutionStatus::Error && result.state_delta.is_some() {
            warn!("failed resolution proposed changes, discarding them");
        }
        let delta = result
            .state_delta
            .filter(|_| outcome == TurnOutcome::Completed);
        let Some(delta) = delta else {
            return Ok(TurnReport {
                narrative: result.final_narrative,
                outcome,
                committed_turn: None,
                curation_error: None,
            });
        };

        // The applier decides when cancellation stops counting.
        let committed = stages
            .applier
            .apply(session_id, &delta, cancellation)
            .await
            .map_err(|e| TurnError::at(TurnStage::Apply, e))?;

        let curation_error = match committed {
            CommitOutcome::Applied { turn_number, .. } => {
                match stages
                    .curator
                    .curate(session_id, turn_number, cancellation)
                    .await
                {
                    Ok(()) => None,
                    Err(e) => {
                        error!(error = %e, "memory curation failed");
                        Some(e.to_string())
                    }
                }
            }
            CommitOutcome::AlreadyApplied { turn_number } => {
                info!(turn_number, "turn already committed, curation skipped");
                None
            }
        };

        Ok(TurnReport {
            narrative: result.final_narrative,
            outcome,
            committed_turn: Some(committed.turn_number()),
            curation_error,
        })
    }
}
