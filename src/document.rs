//! The `Document` - the whole database file as an in-memory value.
//!
//! Every top-level key maps a collection name to an ordered array of
//! records, except the sync bookkeeping fields (`syncInfo`, `_lastSync`).
//! Keys this code does not know about are preserved verbatim across
//! load/save so older data never gets dropped by a round-trip.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::record::RecordId;

/// Collections a fresh, empty document starts with.
pub const DEFAULT_COLLECTIONS: &[&str] = &["products", "services", "experiences", "news"];

/// Collection names the API serves. Anything else is a 404 at the router.
pub const KNOWN_COLLECTIONS: &[&str] = &[
    "products",
    "services",
    "experiences",
    "news",
    "navigation",
    "team",
    "contacts",
    "images",
    "videos",
    "users",
];

/// The entire JSON-file database held in memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    root: Map<String, Value>,
}

impl Document {
    /// The fallback document used when no storage location is readable.
    pub fn empty() -> Self {
        let mut root = Map::new();
        for name in DEFAULT_COLLECTIONS {
            root.insert((*name).to_string(), Value::Array(Vec::new()));
        }
        Document { root }
    }

    /// The named collection, or an empty slice if absent or not an array.
    pub fn collection(&self, name: &str) -> &[Value] {
        self.root
            .get(name)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Mutable access to the named collection, creating it (or replacing a
    /// non-array value) on first touch.
    pub fn collection_mut(&mut self, name: &str) -> &mut Vec<Value> {
        let entry = self
            .root
            .entry(name.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if !entry.is_array() {
            *entry = Value::Array(Vec::new());
        }
        entry.as_array_mut().expect("just ensured array")
    }

    /// Replace the named collection wholesale.
    pub fn set_collection(&mut self, name: &str, records: Vec<Value>) {
        self.root.insert(name.to_string(), Value::Array(records));
    }

    /// First record matching `id`, stored order. Duplicate ids can exist
    /// after out-of-band edits; only the first is reachable.
    pub fn find_by_id(&self, collection: &str, id: &RecordId) -> Option<&Value> {
        self.collection(collection).iter().find(|r| id.matches(r))
    }

    /// Index of the first record matching `id` within the collection.
    pub fn position_of(&self, collection: &str, id: &RecordId) -> Option<usize> {
        self.collection(collection).iter().position(|r| id.matches(r))
    }

    /// Stamp `syncInfo.lastSync` and the `_lastSync` mirror with the same
    /// ISO-8601 instant.
    pub fn stamp_sync(&mut self, when: DateTime<Utc>) {
        let stamp = when.to_rfc3339_opts(SecondsFormat::Millis, true);
        self.root
            .insert("_lastSync".to_string(), Value::String(stamp.clone()));
        let sync_info = self
            .root
            .entry("syncInfo".to_string())
            .or_insert_with(|| json!({}));
        if !sync_info.is_object() {
            *sync_info = json!({});
        }
        sync_info
            .as_object_mut()
            .expect("just ensured object")
            .insert("lastSync".to_string(), Value::String(stamp));
    }

    /// The document's sync timestamp, preferring `_lastSync` over
    /// `syncInfo.lastSync`, as the original sync tooling did.
    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        let raw = self
            .root
            .get("_lastSync")
            .and_then(Value::as_str)
            .or_else(|| {
                self.root
                    .get("syncInfo")
                    .and_then(|v| v.get("lastSync"))
                    .and_then(Value::as_str)
            })?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Pretty-printed JSON, the stable on-disk format (2-space indent).
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.root)
    }
}
