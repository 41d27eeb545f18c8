//! Port to the external reasoning service that produces structured output.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// The decision stage asking the reasoning service for output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// Policy gate.
    Guard,
    /// Narrative pacing.
    PlotDirector,
    /// Action resolution.
    DomainExecutor,
    /// Long-term memory distillation.
    MemoryCurator,
}

impl AgentRole {
    /// Returns the role name used in logs and request bodies.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Guard => "guard",
            Self::PlotDirector => "plot_director",
            Self::DomainExecutor => "domain_executor",
            Self::MemoryCurator => "memory_curator",
        }
    }
}

/// A request for structured (JSON) output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReasoningRequest {
    /// Which stage is asking.
    pub role: AgentRole,
    /// Role instructions, including the expected JSON shape.
    pub instructions: String,
    /// Turn-specific prompt.
    pub prompt: String,
}

/// Asks a reasoning service for structured output.
///
/// Implementations return whatever JSON the service produced; callers are
/// responsible for tolerating malformed shapes.
#[async_trait]
pub trait ReasoningService: Send + Sync {
    /// Sends `request` and returns the structured response.
    async fn reason(&self, request: &ReasoningRequest) -> Result<serde_json::Value, DomainError>;
}
