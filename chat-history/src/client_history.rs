//! Fail-open decoding of the client-supplied `history` payload.
//!
//! Accepted entry shapes:
//! - `["human", "text"]` (role/content pair)
//! - `{"role": "ai", "content": "text"}`
//!
//! Anything that is not a JSON array decodes to an empty history. Entries with
//! an unknown role or a malformed shape are dropped one by one; the rest keep
//! their order. `system` entries are decoded here and discarded later by
//! [`crate::ConversationHistory`], which owns that trust decision.

use serde_json::Value;
use tracing::debug;

use crate::message::{Message, Role};

/// Decodes `value` into replayable messages, never failing.
pub fn from_json(value: Option<&Value>) -> Vec<Message> {
    let entries = match value {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            debug!(kind = json_kind(other), "history is not an array; treating as empty");
            return Vec::new();
        }
    };

    entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let decoded = decode_entry(entry);
            if decoded.is_none() {
                debug!(index, "dropping malformed history entry");
            }
            decoded
        })
        .collect()
}

fn decode_entry(entry: &Value) -> Option<Message> {
    let (role, content) = match entry {
        Value::Array(pair) if pair.len() == 2 => (pair[0].as_str()?, pair[1].as_str()?),
        Value::Object(map) => (
            map.get("role")?.as_str()?,
            map.get("content")?.as_str()?,
        ),
        _ => return None,
    };
    Some(Message::new(Role::parse(role)?, content))
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
