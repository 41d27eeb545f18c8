//! Character sheets and the stat view exposed to rule scripts.

use loreforge_sandbox::{ScriptRecord, ScriptValue};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The six ability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    pub strength: i64,
    pub dexterity: i64,
    pub constitution: i64,
    pub intelligence: i64,
    pub wisdom: i64,
    pub charisma: i64,
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self {
            strength: 10,
            dexterity: 10,
            constitution: 10,
            intelligence: 10,
            wisdom: 10,
            charisma: 10,
        }
    }
}

/// A playable character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSheet {
    /// Character identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Character level.
    pub level: i64,
    /// Ability scores.
    #[serde(default)]
    pub abilities: AbilityScores,
    /// Current hit points.
    pub hit_points: i64,
    /// Armor class.
    pub armor_class: i64,
}

impl ScriptRecord for CharacterSheet {
    // Only public stats; the id never reaches a script.
    fn script_fields(&self) -> Vec<(&'static str, ScriptValue)> {
        let a = &self.abilities;
        vec![
            ("Name", self.name.as_str().into()),
            ("Level", self.level.into()),
            ("Strength", a.strength.into()),
            ("Dexterity", a.dexterity.into()),
            ("Constitution", a.constitution.into()),
            ("Intelligence", a.intelligence.into()),
            ("Wisdom", a.wisdom.into()),
            ("Charisma", a.charisma.into()),
            ("HitPoints", self.hit_points.into()),
            ("ArmorClass", self.armor_class.into()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet() -> CharacterSheet {
        CharacterSheet {
            id: Uuid::new_v4(),
            name: "Ash".to_owned(),
            level: 3,
            abilities: AbilityScores {
                strength: 16,
                ..AbilityScores::default()
            },
            hit_points: 24,
            armor_class: 14,
        }
    }

    #[test]
    fn test_stat_view_exposes_canonical_and_camel_keys() {
        let view = sheet().to_record_view();
        assert_eq!(view.get("Strength"), Some(&ScriptValue::Number(16.0)));
        assert_eq!(view.get("strength"), Some(&ScriptValue::Number(16.0)));
        assert_eq!(view.get("armorClass"), Some(&ScriptValue::Number(14.0)));
        assert_eq!(view.get("name"), Some(&ScriptValue::Text("Ash".to_owned())));
    }

    #[test]
    fn test_stat_view_hides_identifier() {
        let view = sheet().to_record_view();
        assert!(view.get("Id").is_none());
        assert!(view.get("id").is_none());
    }

    #[test]
    fn test_missing_abilities_default_to_ten() {
        let yaml = "id: 6f9619ff-8b86-d011-b42d-00cf4fc964ff\nname: Misty\nlevel: 1\nhit_points: 8\narmor_class: 12\n";
        let sheet: CharacterSheet = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(sheet.abilities, AbilityScores::default());
    }
}
