//! Canonical State Store
//!
//! The merge target for GSI pushes. Each accepted payload replaces the
//! top-level keys it carries (shallow, never a deep merge) and bumps the
//! heartbeat. Locking is the owner's job: the store lives inside the
//! service mutex so that merge and view rebuild are one critical section.

use serde_json::{Map, Value};

/// Top-level payload keys that are control metadata, never merged.
pub const RESERVED_KEYS: [&str; 3] = ["auth", "added", "previously"];

/// Key whose absence from a payload is recorded as an explicit null.
pub const PLAYER_KEY: &str = "player";

/// Persisted GSI document plus the update counter.
#[derive(Debug, Clone, Default)]
pub struct CanonicalStateStore {
    /// Merged document. Empty until the first merge.
    doc: Map<String, Value>,
    /// Number of successfully merged payloads.
    heartbeat: u64,
}

impl CanonicalStateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one update payload.
    ///
    /// Every top-level key except [`RESERVED_KEYS`] overwrites the stored
    /// key wholesale. A payload without `player` nulls the stored
    /// `player`, so a dead or absent local player never shows stale data.
    /// Returns the new heartbeat.
    pub fn merge(&mut self, payload: Map<String, Value>) -> u64 {
        let mut has_player = false;

        for (key, value) in payload {
            if RESERVED_KEYS.contains(&key.as_str()) {
                continue;
            }
            if key == PLAYER_KEY {
                has_player = true;
            }
            self.doc.insert(key, value);
        }

        if !has_player {
            self.doc.insert(PLAYER_KEY.to_string(), Value::Null);
        }

        self.heartbeat += 1;
        self.heartbeat
    }

    /// Borrow the merged document.
    #[inline]
    pub fn document(&self) -> &Map<String, Value> {
        &self.doc
    }

    /// Deep copy of the merged document.
    pub fn snapshot(&self) -> Value {
        Value::Object(self.doc.clone())
    }

    /// Current heartbeat (0 before the first merge).
    #[inline]
    pub fn heartbeat(&self) -> u64 {
        self.heartbeat
    }

    /// Whether at least one payload has been merged.
    #[inline]
    pub fn has_data(&self) -> bool {
        self.heartbeat > 0
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(map) => map,
            _ => panic!("test payload must be an object"),
        }
    }

    #[test]
    fn test_initial_state() {
        let store = CanonicalStateStore::new();
        assert_eq!(store.heartbeat(), 0);
        assert!(!store.has_data());
        assert_eq!(store.snapshot(), json!({}));
    }

    #[test]
    fn test_merge_overwrites_not_deep_merges() {
        let mut store = CanonicalStateStore::new();
        store.merge(obj(json!({ "map": { "a": 1 } })));
        store.merge(obj(json!({ "map": { "b": 2 } })));

        assert_eq!(store.document()["map"], json!({ "b": 2 }));
    }

    #[test]
    fn test_control_keys_never_persist() {
        let mut store = CanonicalStateStore::new();
        store.merge(obj(json!({
            "auth": { "token": "T" },
            "added": { "x": 1 },
            "previously": { "y": 2 },
            "map": {}
        })));

        let doc = store.document();
        assert!(doc.contains_key("map"));
        assert!(!doc.contains_key("auth"));
        assert!(!doc.contains_key("added"));
        assert!(!doc.contains_key("previously"));
    }

    #[test]
    fn test_missing_player_becomes_null() {
        let mut store = CanonicalStateStore::new();
        store.merge(obj(json!({ "player": { "steamid": "1" } })));
        assert!(store.document()["player"].is_object());

        store.merge(obj(json!({ "map": {} })));
        assert_eq!(store.document().get("player"), Some(&Value::Null));
    }

    #[test]
    fn test_untouched_keys_persist() {
        let mut store = CanonicalStateStore::new();
        store.merge(obj(json!({ "map": { "name": "de_dust2" }, "bomb": { "state": "carried" } })));
        store.merge(obj(json!({ "bomb": { "state": "planted" } })));

        assert_eq!(store.document()["map"]["name"], "de_dust2");
        assert_eq!(store.document()["bomb"]["state"], "planted");
    }

    #[test]
    fn test_heartbeat_increments_once_per_merge() {
        let mut store = CanonicalStateStore::new();
        assert_eq!(store.merge(Map::new()), 1);
        assert_eq!(store.merge(obj(json!({ "map": {} }))), 2);
        assert_eq!(store.heartbeat(), 2);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut store = CanonicalStateStore::new();
        store.merge(obj(json!({ "map": { "round": 3 } })));
        let snap = store.snapshot();

        store.merge(obj(json!({ "map": { "round": 4 } })));
        assert_eq!(snap["map"]["round"], 3);
    }
}
