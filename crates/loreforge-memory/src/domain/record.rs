//! Long-term memory records.

use chrono::{DateTime, Utc};
use loreforge_core::world::EventLogEntry;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A distilled memory of one committed turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Session the memory belongs to.
    pub session_id: Uuid,
    /// Turn the memory summarizes.
    pub turn_number: i64,
    /// One-paragraph summary.
    pub summary: String,
    /// The log entries the summary was drawn from.
    pub source_events: Vec<String>,
    /// When the memory was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// Summary used when no better one is available: the entry descriptions
/// joined in log order.
#[must_use]
pub fn fallback_summary(entries: &[EventLogEntry]) -> String {
    entries
        .iter()
        .map(|e| e.description.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_summary_joins_in_order() {
        let entries = vec![
            EventLogEntry {
                turn_number: 2,
                description: "CombatHit: Rattata".to_owned(),
            },
            EventLogEntry {
                turn_number: 2,
                description: "ItemFound: potion".to_owned(),
            },
        ];
        assert_eq!(
            fallback_summary(&entries),
            "CombatHit: Rattata; ItemFound: potion"
        );
    }
}
