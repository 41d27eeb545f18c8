//! Deferred actions awaiting out-of-band confirmation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An action deferred for confirmation outside the current turn, such as a
/// trade offer between players.
///
/// Reserved for confirmation flows; the turn pipeline neither creates nor
/// consumes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAction {
    /// Action identifier.
    pub id: Uuid,
    /// Who requested the action.
    pub requested_by: String,
    /// Action type tag.
    #[serde(rename = "type")]
    pub action_type: String,
    /// Opaque structured payload.
    pub payload: serde_json::Value,
}
