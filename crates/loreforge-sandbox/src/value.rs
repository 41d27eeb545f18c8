//! Values that flow in and out of rule scripts.

use std::fmt;
use std::sync::Arc;

use crate::record::RecordView;

/// A data value visible to scripts.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    /// Absence of a value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A number. Scripts compute in double precision.
    Number(f64),
    /// A string.
    Text(String),
    /// A read-only record such as a character's stat view.
    Record(Arc<RecordView>),
}

impl ScriptValue {
    /// Script truthiness: `null`, `false`, `0`, `NaN` and `""` are false.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Text(s) => !s.is_empty(),
            Self::Record(_) => true,
        }
    }

    /// Returns a short type name for error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::Text(_) => "string",
            Self::Record(_) => "record",
        }
    }
}

impl fmt::Display for ScriptValue {
    #[allow(clippy::cast_possible_truncation)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Record(_) => f.write_str("[record]"),
        }
    }
}

impl From<bool> for ScriptValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for ScriptValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<u32> for ScriptValue {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<i64> for ScriptValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<f64> for ScriptValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for ScriptValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for ScriptValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<RecordView> for ScriptValue {
    fn from(value: RecordView) -> Self {
        Self::Record(Arc::new(value))
    }
}

/// Conversion from a script result into a caller-requested type.
///
/// Returning `None` means the value cannot be represented; the sandbox then
/// degrades to `Default::default()` instead of failing.
pub trait FromScriptValue: Sized + Default {
    /// Converts `value`, or returns `None` if it cannot be represented.
    fn from_script_value(value: &ScriptValue) -> Option<Self>;
}

impl FromScriptValue for ScriptValue {
    fn from_script_value(value: &ScriptValue) -> Option<Self> {
        Some(value.clone())
    }
}

impl Default for ScriptValue {
    fn default() -> Self {
        Self::Null
    }
}

impl FromScriptValue for f64 {
    fn from_script_value(value: &ScriptValue) -> Option<Self> {
        match value {
            ScriptValue::Number(n) if n.is_finite() => Some(*n),
            ScriptValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            ScriptValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }
}

impl FromScriptValue for i64 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn from_script_value(value: &ScriptValue) -> Option<Self> {
        match value {
            ScriptValue::Text(s) => s.trim().parse::<i64>().ok(),
            other => f64::from_script_value(other)
                .filter(|n| n.abs() < i64::MAX as f64)
                .map(|n| n.trunc() as i64),
        }
    }
}

impl FromScriptValue for i32 {
    fn from_script_value(value: &ScriptValue) -> Option<Self> {
        i64::from_script_value(value).and_then(|n| i32::try_from(n).ok())
    }
}

impl FromScriptValue for bool {
    fn from_script_value(value: &ScriptValue) -> Option<Self> {
        match value {
            ScriptValue::Bool(b) => Some(*b),
            ScriptValue::Number(n) if !n.is_nan() => Some(*n != 0.0),
            ScriptValue::Text(s) => match s.trim() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl FromScriptValue for String {
    fn from_script_value(value: &ScriptValue) -> Option<Self> {
        match value {
            ScriptValue::Null | ScriptValue::Record(_) => None,
            other => Some(other.to_string()),
        }
    }
}
