//! Decisions produced by the guard and plot director stages.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Fallback narrative for a rejection that came without one.
pub const DEFAULT_REJECTION: &str = "That action is not possible right now.";

/// Outcome of the policy gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GuardStatus {
    /// The action may proceed.
    #[default]
    Valid,
    /// The action is refused.
    Reject,
}

/// The guard's verdict on a player's input.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GuardDecision {
    /// Whether the action may proceed.
    pub status: GuardStatus,
    /// Refusal text, shown verbatim when rejecting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
}

impl GuardDecision {
    /// Lets the action through.
    #[must_use]
    pub fn valid() -> Self {
        Self::default()
    }

    /// Refuses the action with `narrative`.
    #[must_use]
    pub fn reject(narrative: impl Into<String>) -> Self {
        Self {
            status: GuardStatus::Reject,
            narrative: Some(narrative.into()),
        }
    }

    /// Returns `true` if the action was refused.
    #[must_use]
    pub fn is_reject(&self) -> bool {
        self.status == GuardStatus::Reject
    }

    /// The text to show for a rejection, exactly as the guard wrote it. A
    /// blank or missing narrative falls back to [`DEFAULT_REJECTION`].
    #[must_use]
    pub fn rejection_narrative(&self) -> &str {
        self.narrative
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .unwrap_or(DEFAULT_REJECTION)
    }
}

/// Narrative steering metadata for the resolution stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotDirective {
    /// Pacing tag, e.g. `normal`, `tense`, `slow`.
    pub pacing: String,
    /// Non-player characters to foreground this turn.
    #[serde(default)]
    pub spotlight_npcs: BTreeSet<String>,
    /// Optional story beat to steer towards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_beat: Option<String>,
}

impl Default for PlotDirective {
    fn default() -> Self {
        Self {
            pacing: "normal".to_owned(),
            spotlight_npcs: BTreeSet::new(),
            suggested_beat: None,
        }
    }
}
