//! Resolution plans requested from the reasoning service.
//!
//! A plan describes what happens when the player's action is carried out.
//! Plans may carry a single mechanical check whose script runs in the rule
//! sandbox; the check's outcome selects one of two branches.
//!
//! ```json
//! {
//!   "narrative": "You lunge at the wild Rattata.",
//!   "events": [],
//!   "check": {
//!     "script": "roll(20) + abilityModifier(actor.strength)",
//!     "target": 12,
//!     "parameters": { "foe": "Rattata" },
//!     "success": { "narrative": "You hit for {total}!", "events": [{ "type": "CombatHit", "payload": {} }] },
//!     "failure": { "narrative": "You miss." }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use loreforge_core::delta::ProposedEvent;
use serde::{Deserialize, Serialize};

/// Placeholder in branch narratives replaced with the check result.
pub const TOTAL_PLACEHOLDER: &str = "{total}";

/// How an approved action plays out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionPlan {
    /// Narrative used when no check runs or the chosen branch has none.
    pub narrative: String,
    /// Events recorded whatever the check's outcome.
    #[serde(default)]
    pub events: Vec<ProposedEvent>,
    /// Optional mechanical check.
    #[serde(default)]
    pub check: Option<RuleCheck>,
}

/// A scripted check, e.g. an attack roll against armor class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleCheck {
    /// Rule script run in the sandbox.
    pub script: String,
    /// With a target the script yields a number compared `>= target`;
    /// without one it yields a boolean.
    #[serde(default)]
    pub target: Option<f64>,
    /// Extra scalar variables for the script.
    #[serde(default)]
    pub parameters: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub success: Branch,
    #[serde(default)]
    pub failure: Branch,
}

/// Consequences of one check outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    #[serde(default)]
    pub narrative: Option<String>,
    #[serde(default)]
    pub events: Vec<ProposedEvent>,
}

impl ResolutionPlan {
    /// Parses a plan from the reasoning service's JSON.
    ///
    /// # Errors
    ///
    /// Returns the deserialization error if the JSON does not describe a plan
    /// or the plan has no narrative.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        let plan: Self = serde_json::from_value(value)?;
        if plan.narrative.trim().is_empty() {
            return Err(serde::de::Error::custom("plan narrative is empty"));
        }
        Ok(plan)
    }
}

impl Branch {
    /// The branch narrative with `{total}` substituted, or `fallback`.
    #[must_use]
    pub fn render_narrative(&self, fallback: &str, total: &str) -> String {
        match self.narrative.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text.replace(TOTAL_PLACEHOLDER, total),
            _ => fallback.to_owned(),
        }
    }
}
