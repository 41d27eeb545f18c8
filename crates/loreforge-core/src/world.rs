//! Persistent world state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One committed entry in the append-only event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLogEntry {
    /// Turn the entry was committed in.
    pub turn_number: i64,
    /// Human-readable description.
    pub description: String,
}

/// Where the story currently takes place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneState {
    /// Scene identifier.
    pub scene_id: String,
    /// Short prose summary.
    pub summary: String,
    /// Time of day tag.
    pub time_of_day: String,
    /// Weather tag.
    pub weather: String,
}

impl Default for SceneState {
    fn default() -> Self {
        Self {
            scene_id: "opening".to_owned(),
            summary: "The story has not begun yet.".to_owned(),
            time_of_day: "morning".to_owned(),
            weather: "clear".to_owned(),
        }
    }
}

/// Canonical world state of a session.
///
/// Owned by the persistence collaborator; mutated only by the world state
/// applier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldState {
    /// Session this world belongs to.
    pub session_id: Uuid,
    /// Number of committed turns.
    pub turn_number: i64,
    /// Append-only, turn-stamped log of committed events.
    pub event_log: Vec<EventLogEntry>,
    /// When the state was last saved.
    pub last_save_time: Option<DateTime<Utc>>,
    /// Current scene.
    #[serde(default)]
    pub scene: SceneState,
    /// Turn ids of every delta already applied, in commit order.
    #[serde(default)]
    pub applied_turn_ids: Vec<Uuid>,
}

impl WorldState {
    /// Creates a fresh world at turn 0.
    #[must_use]
    pub fn new(session_id: Uuid) -> Self {
        Self {
            session_id,
            turn_number: 0,
            event_log: Vec::new(),
            last_save_time: None,
            scene: SceneState::default(),
            applied_turn_ids: Vec::new(),
        }
    }

    /// Returns whether a delta with `turn_id` was already committed.
    #[must_use]
    pub fn has_applied(&self, turn_id: Uuid) -> bool {
        self.applied_turn_ids.contains(&turn_id)
    }

    /// Returns up to `limit` most recent log entries, oldest first.
    #[must_use]
    pub fn recent_events(&self, limit: usize) -> &[EventLogEntry] {
        let start = self.event_log.len().saturating_sub(limit);
        &self.event_log[start..]
    }

    /// Returns the log entries committed in `turn_number`, in log order.
    pub fn entries_for_turn(&self, turn_number: i64) -> impl Iterator<Item = &EventLogEntry> {
        self.event_log
            .iter()
            .filter(move |entry| entry.turn_number == turn_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(turn_number: i64, description: &str) -> EventLogEntry {
        EventLogEntry {
            turn_number,
            description: description.to_owned(),
        }
    }

    #[test]
    fn test_new_world_starts_at_turn_zero() {
        let world = WorldState::new(Uuid::new_v4());
        assert_eq!(world.turn_number, 0);
        assert!(world.event_log.is_empty());
        assert!(world.last_save_time.is_none());
    }

    #[test]
    fn test_recent_events_keeps_tail_in_order() {
        let mut world = WorldState::new(Uuid::new_v4());
        world.event_log = vec![entry(1, "a"), entry(2, "b"), entry(3, "c")];

        let recent = world.recent_events(2);

        assert_eq!(recent, &[entry(2, "b"), entry(3, "c")]);
        assert_eq!(world.recent_events(10).len(), 3);
    }

    #[test]
    fn test_entries_for_turn_filters_by_turn() {
        let mut world = WorldState::new(Uuid::new_v4());
        world.event_log = vec![entry(1, "a"), entry(2, "b"), entry(2, "c")];

        let descriptions: Vec<&str> = world
            .entries_for_turn(2)
            .map(|e| e.description.as_str())
            .collect();

        assert_eq!(descriptions, vec!["b", "c"]);
    }

    #[test]
    fn test_missing_optional_fields_deserialize_with_defaults() {
        let session_id = Uuid::new_v4();
        let json = serde_json::json!({
            "session_id": session_id,
            "turn_number": 2,
            "event_log": [],
            "last_save_time": null
        });

        let world: WorldState = serde_json::from_value(json).unwrap();

        assert_eq!(world.scene, SceneState::default());
        assert!(world.applied_turn_ids.is_empty());
    }
}
