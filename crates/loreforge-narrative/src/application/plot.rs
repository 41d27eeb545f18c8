//! The plot director: narrative pacing and spotlight.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use loreforge_core::cancel::{CancellationToken, until_cancelled};
use loreforge_core::context::ContextSnapshot;
use loreforge_core::directive::PlotDirective;
use loreforge_core::error::DomainError;
use loreforge_core::reasoning::{AgentRole, ReasoningRequest, ReasoningService};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

const DIRECTOR_INSTRUCTIONS: &str = "You direct the pacing of a narrative role-playing game. \
Do not write story text. Respond with JSON: {\"pacing\": \"slow\" | \"normal\" | \"tense\" | \"climactic\", \
\"spotlight_npcs\": [string], \"suggested_beat\": optional string}.";

/// Computes narrative steering for a turn.
#[async_trait]
pub trait PlotDirector: Send + Sync {
    /// Directs the turn for `player_input`.
    async fn direct(
        &self,
        context: &ContextSnapshot,
        player_input: &str,
        cancellation: &CancellationToken,
    ) -> Result<PlotDirective, DomainError>;
}

/// Plot director backed by the reasoning service.
pub struct ReasoningPlotDirector {
    reasoning: Arc<dyn ReasoningService>,
}

impl std::fmt::Debug for ReasoningPlotDirector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReasoningPlotDirector").finish_non_exhaustive()
    }
}

impl ReasoningPlotDirector {
    /// Creates a plot director.
    #[must_use]
    pub fn new(reasoning: Arc<dyn ReasoningService>) -> Self {
        Self { reasoning }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DirectiveOutput {
    pacing: Option<String>,
    #[serde(alias = "spotlightNpcs")]
    spotlight_npcs: BTreeSet<String>,
    #[serde(alias = "suggestedBeat")]
    suggested_beat: Option<String>,
}

impl From<DirectiveOutput> for PlotDirective {
    fn from(output: DirectiveOutput) -> Self {
        let defaults = PlotDirective::default();
        let non_blank = |s: String| {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        };
        Self {
            pacing: output.pacing.and_then(non_blank).unwrap_or(defaults.pacing),
            spotlight_npcs: output
                .spotlight_npcs
                .into_iter()
                .filter_map(non_blank)
                .collect(),
            suggested_beat: output.suggested_beat.and_then(non_blank),
        }
    }
}

#[async_trait]
impl PlotDirector for ReasoningPlotDirector {
    #[instrument(skip_all, fields(session_id = %context.session_id))]
    async fn direct(
        &self,
        context: &ContextSnapshot,
        player_input: &str,
        cancellation: &CancellationToken,
    ) -> Result<PlotDirective, DomainError> {
        let request = ReasoningRequest {
            role: AgentRole::PlotDirector,
            instructions: DIRECTOR_INSTRUCTIONS.to_owned(),
            prompt: format!("{}Player action: {player_input}", context.to_prompt_section()),
        };

        let output = match until_cancelled(cancellation, self.reasoning.reason(&request)).await {
            Ok(output) => output,
            Err(DomainError::Cancelled) => return Err(DomainError::Cancelled),
            Err(e) => {
                warn!(error = %e, "plot director unavailable, using default directive");
                return Ok(PlotDirective::default());
            }
        };

        let directive = match serde_json::from_value::<DirectiveOutput>(output) {
            Ok(output) => PlotDirective::from(output),
            Err(e) => {
                warn!(error = %e, "malformed directive, using default");
                PlotDirective::default()
            }
        };
        debug!(pacing = %directive.pacing, spotlight = directive.spotlight_npcs.len(), "directive computed");
        Ok(directive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loreforge_test_support::ScriptedReasoning;
    use serde_json::json;
    use uuid::Uuid;

    fn context() -> ContextSnapshot {
        ContextSnapshot {
            session_id: Uuid::new_v4(),
            scene_id: "lab".to_owned(),
            scene_summary: "Professor Oak's lab.".to_owned(),
            dialogue_recap: vec![],
            recent_events: vec![],
            time_of_day: "morning".to_owned(),
            weather: "clear".to_owned(),
        }
    }

    async fn direct(reasoning: ScriptedReasoning) -> PlotDirective {
        ReasoningPlotDirector::new(Arc::new(reasoning))
            .direct(&context(), "talk to Oak", &CancellationToken::new())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_reads_directive_in_either_naming() {
        let directive = direct(ScriptedReasoning::new().respond(
            AgentRole::PlotDirector,
            json!({"pacing": "tense", "spotlightNpcs": ["Oak", "Gary"], "suggestedBeat": "Gary arrives"}),
        ))
        .await;

        assert_eq!(directive.pacing, "tense");
        assert!(directive.spotlight_npcs.contains("Oak"));
        assert!(directive.spotlight_npcs.contains("Gary"));
        assert_eq!(directive.suggested_beat.as_deref(), Some("Gary arrives"));
    }

    #[tokio::test]
    async fn test_missing_fields_take_defaults() {
        let directive = direct(ScriptedReasoning::new().respond(
            AgentRole::PlotDirector,
            json!({"pacing": " ", "spotlight_npcs": ["", "Oak"]}),
        ))
        .await;

        assert_eq!(directive.pacing, "normal");
        assert_eq!(directive.spotlight_npcs.len(), 1);
        assert!(directive.suggested_beat.is_none());
    }

    #[tokio::test]
    async fn test_malformed_output_gives_default() {
        let directive = direct(
            ScriptedReasoning::new().respond(AgentRole::PlotDirector, json!({"spotlight_npcs": 4})),
        )
        .await;
        assert_eq!(directive, PlotDirective::default());
    }

    #[tokio::test]
    async fn test_service_failure_gives_default() {
        let directive = direct(ScriptedReasoning::new().fail(AgentRole::PlotDirector, "boom")).await;
        assert_eq!(directive, PlotDirective::default());
    }
}
