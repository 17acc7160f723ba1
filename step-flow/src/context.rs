use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;

/// Context for sharing data between the steps of one wizard session.
///
/// Every field stored here has a single writer step; readers pull typed
/// copies out via serde. Cloning is cheap (the map is shared).
#[derive(Clone, Debug)]
pub struct Context {
    data: Arc<DashMap<String, Value>>,
}

impl Context {
    pub fn new() -> Self {
        Self {
            data: Arc::new(DashMap::new()),
        }
    }

    pub async fn set(&self, key: impl Into<String>, value: impl serde::Serialize) {
        let value = serde_json::to_value(value).expect("Failed to serialize value");
        self.data.insert(key.into(), value);
    }

    pub async fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Synchronous read for validator predicates, which are plain functions
    /// of the context and must not await.
    pub fn get_sync<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub async fn remove(&self, key: &str) -> Option<Value> {
        self.data.remove(key).map(|(_, v)| v)
    }

    pub async fn clear(&self) {
        self.data.clear();
    }

    /// Snapshot of the whole map, used by persistent session storage.
    pub fn to_json(&self) -> Value {
        let map: serde_json::Map<String, Value> = self
            .data
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        Value::Object(map)
    }

    /// Rebuild a context from a [`Context::to_json`] snapshot. Non-object
    /// values yield an empty context.
    pub fn from_json(value: Value) -> Self {
        let ctx = Self::new();
        if let Value::Object(map) = value {
            for (k, v) in map {
                ctx.data.insert(k, v);
            }
        }
        ctx
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
