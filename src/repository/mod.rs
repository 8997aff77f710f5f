//! Append-only record stores
//!
//! Benchmark results and the model library are ordered lists of arbitrary
//! caller-supplied JSON records: no schema validation, no deduplication,
//! no persistence across restarts. The trait exists so a real persistence
//! layer can be substituted without touching callers.

use serde_json::Value;

/// An ordered, append-only store of JSON records.
pub trait RecordStore: Send + Sync {
    fn append(&mut self, record: Value);
    fn list(&self) -> Vec<Value>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-process store backed by a Vec.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: Vec<Value>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for InMemoryStore {
    fn append(&mut self, record: Value) {
        self.records.push(record);
    }

    fn list(&self) -> Vec<Value> {
        self.records.clone()
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_append_preserves_order() {
        let mut store = InMemoryStore::new();
        store.append(json!({"name": "first"}));
        store.append(json!({"name": "second"}));
        store.append(json!({"name": "first"})); // duplicates allowed

        let records = store.list();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0]["name"], "first");
        assert_eq!(records[1]["name"], "second");
    }

    #[test]
    fn test_empty_store() {
        let store = InMemoryStore::new();
        assert!(store.is_empty());
        assert!(store.list().is_empty());
    }
}
