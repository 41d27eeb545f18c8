//! Proposed durable changes produced by resolving a turn.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single event the domain executor wants recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedEvent {
    /// Event type tag, e.g. `CombatHit`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Opaque structured payload.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl ProposedEvent {
    /// Creates a proposed event.
    #[must_use]
    pub fn new(event_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
        }
    }
}

/// The set of changes one turn wants to commit, applied at most once per
/// `turn_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDelta {
    /// Unique identifier for the turn attempt, used for de-duplication.
    pub turn_id: Uuid,
    /// Events to append, in order.
    pub new_events: Vec<ProposedEvent>,
}

impl StateDelta {
    /// Creates a delta with a freshly generated, time-ordered turn id.
    #[must_use]
    pub fn new(new_events: Vec<ProposedEvent>) -> Self {
        Self {
            turn_id: Uuid::now_v7(),
            new_events,
        }
    }
}
