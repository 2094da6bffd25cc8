//! Render configuration
//!
//! Every key is optional; a config file only needs the settings it changes.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Settings for one offline render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Volts per unit of WAV full scale, both directions
    pub volts_per_unit: f32,
    /// Output sample format: 16 or 24 (integer) or 32 (float)
    pub bit_depth: u16,
    /// Silence appended after the input, in seconds
    pub tail_seconds: f32,
    /// Param overrides keyed by param id name (e.g. `"LowGain"`, `"FxGain"`)
    pub params: BTreeMap<String, f32>,
    /// Overrides the module's persisted soft-clip setting
    pub apply_saturation: Option<bool>,
    /// Bypass only: press the launch button at this time, in seconds
    pub engage_at_seconds: Option<f32>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            volts_per_unit: 5.0,
            bit_depth: 32,
            tail_seconds: 0.0,
            params: BTreeMap::new(),
            apply_saturation: None,
            engage_at_seconds: None,
        }
    }
}

impl RenderConfig {
    /// Load from a JSON file; the file must exist and parse
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading render config {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("parsing render config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.volts_per_unit.is_finite() && self.volts_per_unit > 0.0) {
            bail!("volts_per_unit must be positive, got {}", self.volts_per_unit);
        }
        if !matches!(self.bit_depth, 16 | 24 | 32) {
            bail!("bit_depth must be 16, 24 or 32, got {}", self.bit_depth);
        }
        if !(self.tail_seconds.is_finite() && self.tail_seconds >= 0.0) {
            bail!("tail_seconds must be non-negative, got {}", self.tail_seconds);
        }
        if let Some(t) = self.engage_at_seconds {
            if !(t.is_finite() && t >= 0.0) {
                bail!("engage_at_seconds must be non-negative, got {t}");
            }
        }
        Ok(())
    }
}
