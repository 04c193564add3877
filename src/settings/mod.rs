//! Per-community settings persistence.
//!
//! Stores hold untyped JSON values; type checking happens in
//! [`crate::flags`] before anything reaches a store.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Mutex;

mod json_file;

pub use json_file::JsonFileStore;

pub type CommunitySettings = Map<String, Value>;

/// Storage for settings scoped by community id.
///
/// Implementations fail open: read problems look like an empty community and
/// write problems are logged, never returned.
pub trait SettingsStore: Send + Sync {
    fn get(&self, community_id: &str, key: &str) -> Option<Value>;

    /// Stores `value`, replacing whatever was there regardless of its type.
    fn set(&self, community_id: &str, key: &str, value: Value);

    /// Returns `true` when a value was actually deleted.
    fn remove(&self, community_id: &str, key: &str) -> bool;

    fn list(&self, community_id: &str) -> CommunitySettings;

    fn get_bool(&self, community_id: &str, key: &str, default: bool) -> bool {
        self.get(community_id, key)
            .and_then(|v| v.as_bool())
            .unwrap_or(default)
    }

    fn get_number(&self, community_id: &str, key: &str) -> Option<f64> {
        self.get(community_id, key).and_then(|v| v.as_f64())
    }

    fn get_string(&self, community_id: &str, key: &str) -> Option<String> {
        match self.get(community_id, key)? {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Non-durable store. The bot always persists through [`JsonFileStore`]; this
/// backs the pipeline tests.
#[derive(Default)]
pub struct MemoryStore {
    servers: Mutex<HashMap<String, CommunitySettings>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, community_id: &str, key: &str) -> Option<Value> {
        let servers = self.servers.lock().ok()?;
        servers.get(community_id)?.get(key).cloned()
    }

    fn set(&self, community_id: &str, key: &str, value: Value) {
        if let Ok(mut servers) = self.servers.lock() {
            servers
                .entry(community_id.to_string())
                .or_default()
                .insert(key.to_string(), value);
        }
    }

    fn remove(&self, community_id: &str, key: &str) -> bool {
        let Ok(mut servers) = self.servers.lock() else {
            return false;
        };
        servers
            .get_mut(community_id)
            .and_then(|settings| settings.remove(key))
            .is_some()
    }

    fn list(&self, community_id: &str) -> CommunitySettings {
        self.servers
            .lock()
            .ok()
            .and_then(|servers| servers.get(community_id).cloned())
            .unwrap_or_default()
    }
}
