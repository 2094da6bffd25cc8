//! Per-module persisted state

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Read one boolean key, keeping `default` when it is absent or not a bool
fn read_bool(root: &Map<String, Value>, key: &str, default: bool) -> bool {
    match root.get(key) {
        None => default,
        Some(Value::Bool(value)) => *value,
        Some(other) => {
            log::warn!("State key '{key}' is not a boolean ({other}); keeping {default}");
            default
        }
    }
}

/// The object to read keys from; anything else means "all defaults"
fn as_object(root: &Value) -> Option<&Map<String, Value>> {
    match root {
        Value::Object(map) => Some(map),
        Value::Null => None,
        other => {
            log::warn!("Module state is not an object ({other}); using defaults");
            None
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// BAND SPLITTER
// ═══════════════════════════════════════════════════════════════════════════

/// Band Splitter state: soft clip on the mix output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BandSplitterState {
    pub apply_saturation: bool,
}

impl Default for BandSplitterState {
    fn default() -> Self {
        Self {
            apply_saturation: true,
        }
    }
}

impl BandSplitterState {
    pub fn to_json(&self) -> Value {
        json!({ "applySaturation": self.apply_saturation })
    }

    pub fn from_json(root: &Value) -> Self {
        let defaults = Self::default();
        let Some(map) = as_object(root) else {
            return defaults;
        };
        Self {
            apply_saturation: read_bool(map, "applySaturation", defaults.apply_saturation),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// BYPASS SWITCHER
// ═══════════════════════════════════════════════════════════════════════════

/// Bypass Switcher state: soft clip on the outputs, and the latched loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BypassState {
    pub apply_saturation: bool,
    pub active: bool,
}

impl Default for BypassState {
    fn default() -> Self {
        Self {
            apply_saturation: true,
            active: false,
        }
    }
}

impl BypassState {
    pub fn to_json(&self) -> Value {
        json!({
            "applySaturation": self.apply_saturation,
            "active": self.active,
        })
    }

    pub fn from_json(root: &Value) -> Self {
        let defaults = Self::default();
        let Some(map) = as_object(root) else {
            return defaults;
        };
        Self {
            apply_saturation: read_bool(map, "applySaturation", defaults.apply_saturation),
            active: read_bool(map, "active", defaults.active),
        }
    }
}
