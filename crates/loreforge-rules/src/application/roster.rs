//! Character rosters: who is acting in a session.

use std::collections::HashMap;

use async_trait::async_trait;
use loreforge_core::error::DomainError;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::character::CharacterSheet;

/// Looks up the character acting in a session.
#[async_trait]
pub trait CharacterRoster: Send + Sync {
    /// Returns the acting character of `session_id`.
    async fn acting_character(&self, session_id: Uuid) -> Result<CharacterSheet, DomainError>;
}

/// A roster that answers with the same character for every session.
#[derive(Debug, Clone)]
pub struct StaticRoster(pub CharacterSheet);

#[async_trait]
impl CharacterRoster for StaticRoster {
    async fn acting_character(&self, _session_id: Uuid) -> Result<CharacterSheet, DomainError> {
        Ok(self.0.clone())
    }
}

/// A roster loaded from YAML.
///
/// ```yaml
/// default:
///   id: 0b7e0b9a-...
///   name: Ash
///   level: 3
///   abilities: { strength: 16, dexterity: 12, constitution: 14, intelligence: 10, wisdom: 10, charisma: 13 }
///   hit_points: 24
///   armor_class: 14
/// sessions:
///   5f1c...: { ... }
/// ```
///
/// Sessions without an entry get the `default` character, if any.
#[derive(Debug, Clone, Deserialize)]
pub struct YamlRoster {
    #[serde(default)]
    default: Option<CharacterSheet>,
    #[serde(default)]
    sessions: HashMap<Uuid, CharacterSheet>,
}

impl YamlRoster {
    /// Parses a roster document.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the document is not a valid roster.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, DomainError> {
        serde_yaml::from_str(yaml)
            .map_err(|e| DomainError::Validation(format!("invalid roster: {e}")))
    }

    /// Number of characters with a dedicated session.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[async_trait]
impl CharacterRoster for YamlRoster {
    async fn acting_character(&self, session_id: Uuid) -> Result<CharacterSheet, DomainError> {
        self.sessions
            .get(&session_id)
            .or(self.default.as_ref())
            .cloned()
            .ok_or(DomainError::NotFound(session_id))
    }
}
