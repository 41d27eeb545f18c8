//! Read-only record views and the variable set handed to a script.
//!
//! Records are declared explicitly by the type that owns the data: a
//! `ScriptRecord` lists its public fields under their canonical names and the
//! view adds a lowerCamel alias for each, so scripts may write either
//! `actor.Strength` or `actor.strength`. Views carry data only, never
//! methods, and scripts cannot write to them.

use std::collections::BTreeMap;

use crate::value::ScriptValue;

/// An immutable field map exposed to scripts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordView {
    fields: BTreeMap<String, ScriptValue>,
}

impl RecordView {
    /// Builds a view from canonical field names, adding lowerCamel aliases.
    ///
    /// A canonical name always wins over an alias that collides with it.
    #[must_use]
    pub fn from_fields<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, ScriptValue)>,
        K: Into<String>,
    {
        let mut canonical = BTreeMap::new();
        for (name, value) in fields {
            canonical.insert(name.into(), value);
        }

        let mut all = canonical.clone();
        for (name, value) in &canonical {
            let alias = lower_camel(name);
            if !canonical.contains_key(&alias) {
                all.insert(alias, value.clone());
            }
        }
        Self { fields: all }
    }

    /// Looks up a field by canonical name or alias.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ScriptValue> {
        self.fields.get(name)
    }

    /// Returns every exposed key, aliases included.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

/// Implemented by types that may be handed to a script as a record.
pub trait ScriptRecord {
    /// Returns the public fields under their canonical names.
    fn script_fields(&self) -> Vec<(&'static str, ScriptValue)>;

    /// Builds the read-only view scripts see.
    fn to_record_view(&self) -> RecordView {
        RecordView::from_fields(self.script_fields())
    }
}

/// Converts `PascalCase`, `snake_case` or `ACRONYMCase` names to lowerCamel.
#[must_use]
pub fn lower_camel(name: &str) -> String {
    if name.contains('_') {
        let mut out = String::with_capacity(name.len());
        for (i, part) in name.split('_').filter(|p| !p.is_empty()).enumerate() {
            if i == 0 {
                out.push_str(&lower_camel(part));
            } else {
                let mut chars = part.chars();
                if let Some(first) = chars.next() {
                    out.extend(first.to_uppercase());
                    out.push_str(&chars.as_str().to_lowercase());
                }
            }
        }
        return out;
    }

    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len());
    let mut i = 0;
    while i < chars.len() && chars[i].is_uppercase() {
        let next_is_lower = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
        if i > 0 && next_is_lower {
            break;
        }
        out.extend(chars[i].to_lowercase());
        i += 1;
    }
    out.extend(&chars[i..]);
    out
}

/// The read-only variables visible to one script execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptVariables {
    values: BTreeMap<String, ScriptValue>,
}

impl ScriptVariables {
    /// Creates an empty variable set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a scalar variable.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ScriptValue>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Adds a record variable built from its declared public fields.
    #[must_use]
    pub fn with_record(mut self, name: impl Into<String>, record: &dyn ScriptRecord) -> Self {
        self.values
            .insert(name.into(), ScriptValue::from(record.to_record_view()));
        self
    }

    /// Inserts or replaces a variable.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ScriptValue>) {
        self.values.insert(name.into(), value.into());
    }

    /// Looks up a variable.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ScriptValue> {
        self.values.get(name)
    }

    /// Returns whether a variable with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stats;

    impl ScriptRecord for Stats {
        fn script_fields(&self) -> Vec<(&'static str, ScriptValue)> {
            vec![
                ("Strength", 16.into()),
                ("ArmorClass", 14.into()),
                ("HP", 22.into()),
            ]
        }
    }

    #[test]
    fn test_lower_camel_handles_common_shapes() {
        assert_eq!(lower_camel("Strength"), "strength");
        assert_eq!(lower_camel("ArmorClass"), "armorClass");
        assert_eq!(lower_camel("HP"), "hp");
        assert_eq!(lower_camel("HTTPServer"), "httpServer");
        assert_eq!(lower_camel("armor_class"), "armorClass");
        assert_eq!(lower_camel("level"), "level");
    }

    #[test]
    fn test_view_exposes_canonical_and_alias() {
        let view = Stats.to_record_view();

        assert_eq!(view.get("Strength"), Some(&ScriptValue::Number(16.0)));
        assert_eq!(view.get("strength"), Some(&ScriptValue::Number(16.0)));
        assert_eq!(view.get("armorClass"), Some(&ScriptValue::Number(14.0)));
        assert_eq!(view.get("hp"), Some(&ScriptValue::Number(22.0)));
        assert_eq!(view.keys().count(), 6);
    }

    #[test]
    fn test_canonical_name_wins_over_colliding_alias() {
        let view = RecordView::from_fields([("Level", 3.into()), ("level", 9.into())]);
        assert_eq!(view.get("Level"), Some(&ScriptValue::Number(3.0)));
        assert_eq!(view.get("level"), Some(&ScriptValue::Number(9.0)));
    }

    #[test]
    fn test_variables_builder() {
        let vars = ScriptVariables::new()
            .with("target", 12)
            .with_record("actor", &Stats);

        assert!(vars.contains("target"));
        assert!(matches!(vars.get("actor"), Some(ScriptValue::Record(_))));
    }
}
