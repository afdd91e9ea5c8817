//! User preferences over an injected key-value store.
//!
//! The host decides where values live (browser storage, a config file, ...);
//! the editor only sees string keys and string values.

use std::collections::HashMap;

const RECENT_KEY: &str = "pb.recentComponents";
const AUTOSAVE_KEY: &str = "pb.autosave";

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }
}

/// Typed view over a [`KeyValueStore`].
#[derive(Debug)]
pub struct Preferences<S> {
    store: S,
    recent_limit: usize,
}

impl<S: KeyValueStore> Preferences<S> {
    pub fn new(store: S, recent_limit: usize) -> Self {
        Self {
            store,
            recent_limit,
        }
    }

    /// Recently used component types, most recent first. Unreadable values
    /// read as empty.
    pub fn recent_components(&self) -> Vec<String> {
        self.store
            .get(RECENT_KEY)
            .and_then(|raw| match serde_json::from_str(&raw) {
                Ok(list) => Some(list),
                Err(err) => {
                    log::warn!("prefs: ignoring unreadable recent list: {err}");
                    None
                }
            })
            .unwrap_or_default()
    }

    /// Move `kind` to the front of the recent list.
    pub fn record_use(&mut self, kind: &str) {
        let mut recent = self.recent_components();
        recent.retain(|k| k != kind);
        recent.insert(0, kind.to_string());
        recent.truncate(self.recent_limit);
        match serde_json::to_string(&recent) {
            Ok(raw) => self.store.set(RECENT_KEY, raw),
            Err(err) => log::warn!("prefs: could not store recent list: {err}"),
        }
    }

    /// Stored auto-save flag, or `default` when never set.
    pub fn autosave_enabled(&self, default: bool) -> bool {
        self.store
            .get(AUTOSAVE_KEY)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(default)
    }

    pub fn set_autosave_enabled(&mut self, enabled: bool) {
        self.store.set(AUTOSAVE_KEY, enabled.to_string());
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
