//! Event log descriptions.

use loreforge_core::delta::ProposedEvent;
use serde_json::Value;

/// Payload keys whose string value is used as prose when present.
const PROSE_KEYS: &[&str] = &["description", "summary", "text"];

/// Renders the log description of a proposed event.
///
/// The type tag always leads. A payload that is a string, or an object with
/// a prose field, contributes that prose; any other payload is appended as
/// compact JSON.
#[must_use]
pub fn describe_event(event: &ProposedEvent) -> String {
    let tag = &event.event_type;
    match &event.payload {
        Value::Null => tag.clone(),
        Value::String(text) => format!("{tag}: {text}"),
        Value::Object(map) => {
            let prose = PROSE_KEYS
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str));
            match prose {
                Some(text) => format!("{tag}: {text}"),
                None => format!("{tag} {}", event.payload),
            }
        }
        other => format!("{tag} {other}"),
    }
}
