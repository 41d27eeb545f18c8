//! The domain executor: turns an approved action into its consequences.

use std::fmt::Write as _;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use loreforge_core::cancel::{CancellationToken, until_cancelled};
use loreforge_core::context::ContextSnapshot;
use loreforge_core::directive::PlotDirective;
use loreforge_core::error::DomainError;
use loreforge_core::reasoning::{AgentRole, ReasoningRequest, ReasoningService};
use loreforge_core::rng::DeterministicRng;
use loreforge_sandbox::{RuleSandbox, SandboxError, ScriptValue, ScriptVariables};
use tracing::{info, instrument, warn};

use super::roster::CharacterRoster;
use crate::domain::character::CharacterSheet;
use crate::domain::plan::{ResolutionPlan, RuleCheck};
use crate::domain::result::DomainResult;

/// Narrative used when the reasoning service's plan cannot be understood.
pub const UNCLEAR_PLAN_NARRATIVE: &str =
    "The moment passes in confusion, and nothing comes of your action.";

/// Narrative used when a rule check cannot be carried out.
pub const FAILED_CHECK_NARRATIVE: &str =
    "Fate refuses to be read. Your action falters before it begins.";

const PLAN_INSTRUCTIONS: &str = "You resolve a player's action in a narrative role-playing game. \
Respond with JSON: {\"narrative\": string, \"events\": [{\"type\": string, \"payload\": object}], \
\"check\": optional {\"script\": string, \"target\": optional number, \"parameters\": object, \
\"success\": {\"narrative\": string, \"events\": [...]}, \"failure\": {\"narrative\": string, \"events\": [...]}}}. \
Use a check whenever chance or skill decides the outcome. Scripts may use roll(sides), \
roll(count, sides), d4..d100(), abilityModifier(score), proficiencyBonus(level), \
inRange(value, min, max), the acting character as `actor` (e.g. actor.strength) and \
`target` when given. Write {total} in a branch narrative to show the check result.";

/// Resolves an approved action.
#[async_trait]
pub trait DomainExecutor: Send + Sync {
    /// Resolves `player_input` under `directive`.
    ///
    /// Resolution failures come back as an `Error` result with an in-world
    /// narrative. Only collaborator faults and cancellation are `Err`.
    async fn execute(
        &self,
        context: &ContextSnapshot,
        directive: &PlotDirective,
        player_input: &str,
        cancellation: &CancellationToken,
    ) -> Result<DomainResult, DomainError>;
}

/// Domain executor backed by the reasoning service and the rule sandbox.
pub struct RulesDomainExecutor {
    reasoning: Arc<dyn ReasoningService>,
    roster: Arc<dyn CharacterRoster>,
    sandbox: RuleSandbox,
    rng: Arc<Mutex<dyn DeterministicRng + Send>>,
}

impl std::fmt::Debug for RulesDomainExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RulesDomainExecutor")
            .field("sandbox", &self.sandbox)
            .finish_non_exhaustive()
    }
}

impl RulesDomainExecutor {
    /// Creates an executor.
    #[must_use]
    pub fn new(
        reasoning: Arc<dyn ReasoningService>,
        roster: Arc<dyn CharacterRoster>,
        sandbox: RuleSandbox,
        rng: Arc<Mutex<dyn DeterministicRng + Send>>,
    ) -> Self {
        Self {
            reasoning,
            roster,
            sandbox,
            rng,
        }
    }

    /// Runs the plan's check and picks its branch.
    fn resolve_check(
        &self,
        plan: &ResolutionPlan,
        check: &RuleCheck,
        actor: &CharacterSheet,
        cancellation: &CancellationToken,
    ) -> Result<DomainResult, DomainError> {
        let variables = check_variables(check, actor);

        // Lock RNG only for the synchronous sandbox call, never across an await.
        // A poisoned lock still holds a usable generator.
        let outcome = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            match check.target {
                Some(target) => self
                    .sandbox
                    .execute::<f64>(&check.script, &variables, &mut *rng, cancellation)
                    .map(|total| (total >= target, ScriptValue::Number(total).to_string())),
                None => self
                    .sandbox
                    .execute::<bool>(&check.script, &variables, &mut *rng, cancellation)
                    .map(|passed| (passed, passed.to_string())),
            }
        };

        let (passed, total) = match outcome {
            Ok(outcome) => outcome,
            Err(SandboxError::Cancelled) => return Err(DomainError::Cancelled),
            Err(err) => {
                warn!(error = %err, "rule check failed");
                return Ok(DomainResult::error(FAILED_CHECK_NARRATIVE));
            }
        };

        let branch = if passed { &check.success } else { &check.failure };
        info!(passed, total = %total, "rule check resolved");

        let narrative = branch.render_narrative(&plan.narrative, &total);
        let events = plan
            .events
            .iter()
            .chain(&branch.events)
            .cloned()
            .collect();
        Ok(DomainResult::completed(narrative, events))
    }
}

/// Builds the script's variables: scalar parameters, then `target` and
/// `actor`, which parameters cannot shadow.
fn check_variables(check: &RuleCheck, actor: &CharacterSheet) -> ScriptVariables {
    let mut variables = ScriptVariables::new();
    for (name, value) in &check.parameters {
        match json_to_script_value(value) {
            Some(value) => variables.insert(name.clone(), value),
            None => warn!(parameter = %name, "skipping non-scalar check parameter"),
        }
    }
    if let Some(target) = check.target {
        variables.insert("target", target);
    }
    variables.with_record("actor", actor)
}

fn json_to_script_value(value: &serde_json::Value) -> Option<ScriptValue> {
    match value {
        serde_json::Value::Null => Some(ScriptValue::Null),
        serde_json::Value::Bool(b) => Some((*b).into()),
        serde_json::Value::Number(n) => n.as_f64().map(ScriptValue::from),
        serde_json::Value::String(s) => Some(s.as_str().into()),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
    }
}

fn plan_prompt(
    context: &ContextSnapshot,
    directive: &PlotDirective,
    actor: &CharacterSheet,
    player_input: &str,
) -> String {
    let mut prompt = context.to_prompt_section();
    let _ = writeln!(prompt, "Pacing: {}", directive.pacing);
    if !directive.spotlight_npcs.is_empty() {
        let npcs: Vec<&str> = directive.spotlight_npcs.iter().map(String::as_str).collect();
        let _ = writeln!(prompt, "Spotlight: {}", npcs.join(", "));
    }
    if let Some(beat) = &directive.suggested_beat {
        let _ = writeln!(prompt, "Suggested beat: {beat}");
    }
    let _ = writeln!(
        prompt,
        "Acting character: {} (level {})",
        actor.name, actor.level
    );
    let _ = write!(prompt, "Player action: {player_input}");
    prompt
}

#[async_trait]
impl DomainExecutor for RulesDomainExecutor {
    #[instrument(skip_all, fields(session_id = %context.session_id))]
    async fn execute(
        &self,
        context: &ContextSnapshot,
        directive: &PlotDirective,
        player_input: &str,
        cancellation: &CancellationToken,
    ) -> Result<DomainResult, DomainError> {
        let actor = until_cancelled(
            cancellation,
            self.roster.acting_character(context.session_id),
        )
        .await?;

        let request = ReasoningRequest {
            role: AgentRole::DomainExecutor,
            instructions: PLAN_INSTRUCTIONS.to_owned(),
            prompt: plan_prompt(context, directive, &actor, player_input),
        };
        let response = until_cancelled(cancellation, self.reasoning.reason(&request)).await?;

        let plan = match ResolutionPlan::from_value(response) {
            Ok(plan) => plan,
            Err(e) => {
                warn!(error = %e, "unusable resolution plan");
                return Ok(DomainResult::error(UNCLEAR_PLAN_NARRATIVE));
            }
        };

        match &plan.check {
            Some(check) => self.resolve_check(&plan, check, &actor, cancellation),
            None => Ok(DomainResult::completed(
                plan.narrative.clone(),
                plan.events.clone(),
            )),
        }
    }
}
