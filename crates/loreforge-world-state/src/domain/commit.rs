//! Applying a state delta to a loaded world.

use chrono::{DateTime, Utc};
use loreforge_core::delta::StateDelta;
use loreforge_core::world::{EventLogEntry, WorldState};
use serde::Serialize;

use super::description::describe_event;

/// Result of committing a delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommitOutcome {
    /// The delta was applied and the world advanced to `turn_number`.
    Applied {
        /// Turn number after the commit.
        turn_number: i64,
        /// Log entries appended.
        appended: usize,
    },
    /// A delta with the same turn id was applied earlier; nothing changed.
    AlreadyApplied {
        /// Current turn number, unchanged.
        turn_number: i64,
    },
}

impl CommitOutcome {
    /// Turn number after the call.
    #[must_use]
    pub fn turn_number(self) -> i64 {
        match self {
            Self::Applied { turn_number, .. } | Self::AlreadyApplied { turn_number } => {
                turn_number
            }
        }
    }
}

/// Appends one log entry per proposed event, all stamped with the next turn
/// number, then advances the counter once.
pub fn commit_delta(
    world: &mut WorldState,
    delta: &StateDelta,
    now: DateTime<Utc>,
) -> CommitOutcome {
    if world.has_applied(delta.turn_id) {
        return CommitOutcome::AlreadyApplied {
            turn_number: world.turn_number,
        };
    }

    let next_turn = world.turn_number + 1;
    world
        .event_log
        .extend(delta.new_events.iter().map(|event| EventLogEntry {
            turn_number: next_turn,
            description: describe_event(event),
        }));
    world.turn_number = next_turn;
    world.last_save_time = Some(now);
    world.applied_turn_ids.push(delta.turn_id);

    CommitOutcome::Applied {
        turn_number: next_turn,
        appended: delta.new_events.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loreforge_core::delta::ProposedEvent;
    use loreforge_core::clock::Clock;
    use loreforge_test_support::fixed_clock;
    use serde_json::json;
    use uuid::Uuid;

    fn world_at(turn_number: i64) -> WorldState {
        let mut world = WorldState::new(Uuid::new_v4());
        world.turn_number = turn_number;
        world
    }

    #[test]
    fn test_n_events_advance_turn_by_exactly_one() {
        let mut world = world_at(5);
        let delta = StateDelta::new(vec![
            ProposedEvent::new("A", json!({"n": 1})),
            ProposedEvent::new("B", json!({"n": 2})),
            ProposedEvent::new("C", json!({"n": 3})),
        ]);

        let outcome = commit_delta(&mut world, &delta, fixed_clock().now());

        assert_eq!(
            outcome,
            CommitOutcome::Applied {
                turn_number: 6,
                appended: 3
            }
        );
        assert_eq!(world.turn_number, 6);
        assert_eq!(world.event_log.len(), 3);
        assert!(world.event_log.iter().all(|e| e.turn_number == 6));
        let order: Vec<&str> = world
            .event_log
            .iter()
            .map(|e| &e.description[..1])
            .collect();
        assert_eq!(order, vec!["A", "B", "C"]);
        assert_eq!(world.last_save_time, Some(fixed_clock().now()));
    }

    #[test]
    fn test_reapplying_same_turn_id_is_a_no_op() {
        let mut world = world_at(0);
        let delta = StateDelta::new(vec![ProposedEvent::new("A", json!(null))]);

        commit_delta(&mut world, &delta, fixed_clock().now());
        let after_first = world.clone();
        let outcome = commit_delta(&mut world, &delta, fixed_clock().now());

        assert_eq!(outcome, CommitOutcome::AlreadyApplied { turn_number: 1 });
        assert_eq!(world, after_first);
    }

    #[test]
    fn test_empty_delta_still_advances_turn() {
        let mut world = world_at(2);
        let outcome = commit_delta(&mut world, &StateDelta::new(vec![]), fixed_clock().now());
        assert_eq!(outcome.turn_number(), 3);
        assert!(world.event_log.is_empty());
    }
}
