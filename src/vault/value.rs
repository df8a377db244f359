use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};


/// Removes exactly one pair of wrapping double quotes from `value`.
///
/// Strings that are only quoted on one side (or not at all) are returned unchanged.
/// A lone `"` is not a pair and is left alone as well.
pub fn strip_quotes(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// Applies [`strip_quotes`] to string values; everything else passes through.
pub fn normalize_value(value: &Value) -> Value {
    match value {
        Value::String(string) => Value::String(strip_quotes(string).to_string()),
        other => other.clone(),
    }
}


/// Shared handle to the structure a file was parsed into.
///
/// Clones share the same table, which is how a section keeps reaching back into
/// its owning file after construction.
#[derive(Clone, Debug, Default)]
pub struct RawTable {
    inner: Arc<RwLock<Map<String, Value>>>,
}

impl RawTable {
    pub fn new(map: Map<String, Value>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }

    /// Returns a copy of the whole table as it is right now.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.inner.read().clone()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.read().get(key).cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.read().contains_key(key)
    }

    pub fn insert(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.inner.write().insert(key.into(), value)
    }

    pub fn extend(&self, entries: Map<String, Value>) {
        self.inner.write().extend(entries);
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.inner.write().remove(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
