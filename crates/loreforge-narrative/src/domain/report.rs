//! Turn stages and the report of a finished turn.

use std::fmt;

use serde::Serialize;

/// A stage of the turn pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStage {
    BuildContext,
    Guard,
    Direct,
    Resolve,
    Apply,
    Curate,
}

impl fmt::Display for TurnStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BuildContext => "context building",
            Self::Guard => "guard",
            Self::Direct => "plot direction",
            Self::Resolve => "resolution",
            Self::Apply => "state commit",
            Self::Curate => "memory curation",
        })
    }
}

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnOutcome {
    /// The guard refused the action.
    Rejected,
    /// The action was resolved.
    Completed,
    /// Resolution failed in-world; nothing was committed.
    Failed,
}

/// Everything the caller learns about a finished turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnReport {
    /// Player-visible narrative.
    pub narrative: String,
    pub outcome: TurnOutcome,
    /// World turn number after the commit, if a delta was committed.
    pub committed_turn: Option<i64>,
    /// Why memory curation failed, if it did. The commit stands regardless.
    pub curation_error: Option<String>,
}
