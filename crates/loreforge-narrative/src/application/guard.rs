//! The guard: a permissive policy gate in front of resolution.

use std::sync::Arc;

use async_trait::async_trait;
use loreforge_core::cancel::{CancellationToken, until_cancelled};
use loreforge_core::context::ContextSnapshot;
use loreforge_core::directive::{GuardDecision, GuardStatus};
use loreforge_core::error::DomainError;
use loreforge_core::reasoning::{AgentRole, ReasoningRequest, ReasoningService};
use tracing::{info, instrument, warn};

const GUARD_INSTRUCTIONS: &str = "You are the policy gate of a narrative role-playing game. \
Decide whether the player's action is possible at all in the current scene, ignoring whether \
it would succeed. Reject only with a concrete in-world reason. \
Respond with JSON: {\"status\": \"Valid\" | \"Reject\", \"narrative\": string explaining a rejection}.";

/// Decides whether an action may be attempted at all.
#[async_trait]
pub trait Guard: Send + Sync {
    /// Assesses `player_input` against `context`.
    async fn assess(
        &self,
        context: &ContextSnapshot,
        player_input: &str,
        cancellation: &CancellationToken,
    ) -> Result<GuardDecision, DomainError>;
}

/// Guard backed by the reasoning service.
///
/// Anything short of an explicit rejection lets the action through,
/// including malformed output and an unreachable service.
pub struct ReasoningGuard {
    reasoning: Arc<dyn ReasoningService>,
}

impl std::fmt::Debug for ReasoningGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReasoningGuard").finish_non_exhaustive()
    }
}

impl ReasoningGuard {
    /// Creates a guard.
    #[must_use]
    pub fn new(reasoning: Arc<dyn ReasoningService>) -> Self {
        Self { reasoning }
    }
}

/// Reads a decision from loosely shaped output.
fn parse_decision(output: &serde_json::Value) -> Option<GuardDecision> {
    let status = output.get("status")?.as_str()?.trim().to_ascii_lowercase();
    let status = match status.as_str() {
        "reject" | "rejected" => GuardStatus::Reject,
        "valid" | "allow" | "allowed" => GuardStatus::Valid,
        _ => return None,
    };
    let narrative = output
        .get("narrative")
        .and_then(serde_json::Value::as_str)
        .map(str::to_owned);
    Some(GuardDecision { status, narrative })
}

#[async_trait]
impl Guard for ReasoningGuard {
    #[instrument(skip_all, fields(session_id = %context.session_id))]
    async fn assess(
        &self,
        context: &ContextSnapshot,
        player_input: &str,
        cancellation: &CancellationToken,
    ) -> Result<GuardDecision, DomainError> {
        let request = ReasoningRequest {
            role: AgentRole::Guard,
            instructions: GUARD_INSTRUCTIONS.to_owned(),
            prompt: format!("{}Player action: {player_input}", context.to_prompt_section()),
        };

        let output = match until_cancelled(cancellation, self.reasoning.reason(&request)).await {
            Ok(output) => output,
            Err(DomainError::Cancelled) => return Err(DomainError::Cancelled),
            Err(e) => {
                warn!(error = %e, "guard unavailable, allowing action");
                return Ok(GuardDecision::valid());
            }
        };

        let Some(decision) = parse_decision(&output) else {
            warn!("malformed guard output, allowing action");
            return Ok(GuardDecision::valid());
        };
        if decision.is_reject() {
            if decision.narrative.as_deref().is_none_or(|n| n.trim().is_empty()) {
                warn!("guard rejected without a narrative");
            }
            info!("action rejected");
        }
        Ok(decision)
    }
}
