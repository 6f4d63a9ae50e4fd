//! Record-level helpers: loose id equality, id generation, shallow merge,
//! and `images` normalization.
//!
//! Records are loosely typed JSON objects. Ids arrive as numbers in the
//! database but as strings in URL paths, so equality must tolerate both.

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

/// A record identifier, numeric or string.
///
/// Matching is loose: `RecordId::Int(7)` matches a stored `7`, `"7"`, or
/// `7.0`; a non-numeric string only matches the same string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordId {
    Int(i64),
    Str(String),
}

impl RecordId {
    /// Parse an id from its URL-path form. Numeric strings become `Int`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<i64>() {
            Ok(n) => RecordId::Int(n),
            Err(_) => RecordId::Str(raw.to_string()),
        }
    }

    /// Whether this id matches a record's `id` field.
    pub fn matches(&self, record: &Value) -> bool {
        let Some(stored) = record.get("id") else {
            return false;
        };
        match self {
            RecordId::Int(n) => id_as_i64(stored) == Some(*n),
            RecordId::Str(s) => stored.as_str() == Some(s.as_str()),
        }
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordId::Int(n) => write!(f, "{}", n),
            RecordId::Str(s) => write!(f, "{}", s),
        }
    }
}

/// Numeric view of an id value: integers directly, numeric strings parsed.
fn id_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Highest numeric id in a collection, 0 if empty or non-numeric throughout.
/// New records get `max_id + 1`, so ids stay unique even after deletions.
pub fn max_id(records: &[Value]) -> i64 {
    records
        .iter()
        .filter_map(|r| r.get("id").and_then(id_as_i64))
        .max()
        .unwrap_or(0)
}

/// Shallow-merge `patch` into `existing`. Fields absent from the patch keep
/// their previous values; `id` never changes.
pub fn merge_record(existing: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (key, value) in patch {
        if key == "id" {
            continue;
        }
        existing.insert(key.clone(), value.clone());
    }
}

/// Force the `images` field into an array of path strings.
///
/// Upload middleware sometimes hands over a bare string for a single image;
/// downstream consumers always expect an array.
pub fn normalize_images(record: &mut Map<String, Value>) {
    let Some(images) = record.get_mut("images") else {
        return;
    };
    if images.is_array() {
        return;
    }
    *images = match images.take() {
        Value::Null => Value::Array(Vec::new()),
        single => Value::Array(vec![single]),
    };
}

/// Current time as an ISO-8601 string with millisecond precision
/// (`2024-06-01T12:00:00.000Z`), the format the database has always used.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
