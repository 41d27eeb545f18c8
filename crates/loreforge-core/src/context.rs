//! Per-turn narrative context.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::world::EventLogEntry;

/// Immutable snapshot of the scene handed to every decision stage of a turn.
///
/// Produced fresh per turn by a context builder; the pipeline never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    /// Session the turn belongs to.
    pub session_id: Uuid,
    /// Identifier of the current scene.
    pub scene_id: String,
    /// Short prose summary of the scene.
    pub scene_summary: String,
    /// Recent dialogue lines, most recent last.
    pub dialogue_recap: Vec<String>,
    /// Recent committed events, oldest first.
    pub recent_events: Vec<EventLogEntry>,
    /// Time of day tag.
    pub time_of_day: String,
    /// Weather tag.
    pub weather: String,
}

impl ContextSnapshot {
    /// Renders the snapshot as a plain-text section for reasoning prompts.
    #[must_use]
    pub fn to_prompt_section(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Scene: {} ({})", self.scene_id, self.scene_summary);
        let _ = writeln!(out, "Time: {}, weather: {}", self.time_of_day, self.weather);
        if !self.recent_events.is_empty() {
            out.push_str("Recent events:\n");
            for event in &self.recent_events {
                let _ = writeln!(out, "- [turn {}] {}", event.turn_number, event.description);
            }
        }
        if !self.dialogue_recap.is_empty() {
            out.push_str("Recent dialogue:\n");
            for line in &self.dialogue_recap {
                let _ = writeln!(out, "- {line}");
            }
        }
        out
    }
}
