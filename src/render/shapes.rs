//! Response shape detection.
//!
//! Providers answer in several historically-observed shapes. Detection is
//! explicit and ordered; anything unrecognized lands in a fallback variant
//! instead of failing.

use serde_json::Value;

/// Wrapper keys that carry the entry list in `{key: [...]}` responses.
const LIST_KEYS: &[&str] = &["items", "files", "messages", "events", "results", "data"];

/// The recognized response shapes.
#[derive(Debug, PartialEq)]
pub enum ResponseShape<'a> {
    /// A bare array, or an array found under a known wrapper key.
    Entries(&'a Vec<Value>),
    /// A textual `output` field: newline-delimited rows.
    OutputRows(Vec<&'a str>),
    /// An object that matched no list shape — rendered as key/value lines.
    Object(&'a serde_json::Map<String, Value>),
    /// Anything else — rendered as a structured dump.
    Other(&'a Value),
}

/// Detect the shape of a raw response payload.
pub fn detect(raw: &Value) -> ResponseShape<'_> {
    if let Value::Array(entries) = raw {
        return ResponseShape::Entries(entries);
    }

    if let Value::Object(map) = raw {
        for key in LIST_KEYS {
            if let Some(Value::Array(entries)) = map.get(*key) {
                return ResponseShape::Entries(entries);
            }
        }

        if let Some(Value::String(output)) = map.get("output") {
            let rows: Vec<&str> = output
                .lines()
                .map(str::trim)
                .filter(|row| !row.is_empty())
                .collect();
            if !rows.is_empty() {
                return ResponseShape::OutputRows(rows);
            }
        }

        return ResponseShape::Object(map);
    }

    ResponseShape::Other(raw)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
