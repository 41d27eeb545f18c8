//! The outcome of resolving one action.

use loreforge_core::delta::{ProposedEvent, StateDelta};
use serde::{Deserialize, Serialize};

/// Whether resolution succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionStatus {
    Completed,
    Error,
}

/// What the domain executor hands back to the pipeline.
///
/// `final_narrative` is always populated and shown to the player whatever the
/// status. An `Error` result never carries a delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainResult {
    pub status: ResolutionStatus,
    pub state_delta: Option<StateDelta>,
    pub final_narrative: String,
}

impl DomainResult {
    /// A successful resolution. An empty event list produces no delta.
    #[must_use]
    pub fn completed(narrative: impl Into<String>, events: Vec<ProposedEvent>) -> Self {
        Self {
            status: ResolutionStatus::Completed,
            state_delta: (!events.is_empty()).then(|| StateDelta::new(events)),
            final_narrative: narrative.into(),
        }
    }

    /// A failed resolution described in-world.
    #[must_use]
    pub fn error(narrative: impl Into<String>) -> Self {
        Self {
            status: ResolutionStatus::Error,
            state_delta: None,
            final_narrative: narrative.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_completed_without_events_has_no_delta() {
        let result = DomainResult::completed("You look around.", vec![]);
        assert_eq!(result.status, ResolutionStatus::Completed);
        assert!(result.state_delta.is_none());
    }

    #[test]
    fn test_completed_with_events_keeps_order() {
        let result = DomainResult::completed(
            "Hit!",
            vec![
                ProposedEvent::new("CombatHit", json!({})),
                ProposedEvent::new("Dialogue", json!("Ouch")),
            ],
        );
        let delta = result.state_delta.unwrap();
        assert_eq!(delta.new_events[0].event_type, "CombatHit");
        assert_eq!(delta.new_events[1].event_type, "Dialogue");
    }

    #[test]
    fn test_error_never_carries_delta() {
        let result = DomainResult::error("Your blade slips.");
        assert_eq!(result.status, ResolutionStatus::Error);
        assert!(result.state_delta.is_none());
        assert_eq!(result.final_narrative, "Your blade slips.");
    }
}
