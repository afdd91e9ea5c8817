//! Editor configuration.
//!
//! Loaded from JSON by the host; every field is optional and falls back to
//! its default.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Snapshots kept by the undo history.
    pub history_depth: usize,
    /// Quiet period before an auto-save fires.
    pub autosave_delay_ms: u64,
    pub autosave_enabled: bool,
    /// Length of the "recently used components" list.
    pub recent_limit: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_depth: 200,
            autosave_delay_ms: 3000,
            autosave_enabled: true,
            recent_limit: 8,
        }
    }
}

impl EditorConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }
}
