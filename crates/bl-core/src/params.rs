//! Parameter types for Bandloop modules

use serde::{Deserialize, Serialize};

/// How the host should treat a parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamKind {
    /// Continuous knob or slider
    Continuous,
    /// Discrete switch; values snap to whole steps, one label per step
    Switch { labels: Vec<String> },
    /// Momentary button, 1.0 while held and 0.0 otherwise
    Button,
}

/// Declared range and metadata for one parameter
#[derive(Debug, Clone)]
pub struct ParamConfig {
    pub name: String,
    pub description: String,
    pub unit: String,
    pub min: f32,
    pub max: f32,
    pub default: f32,
    pub kind: ParamKind,
    formatter: Option<fn(f32) -> String>,
}

impl ParamConfig {
    pub fn continuous(name: &str, min: f32, max: f32, default: f32) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            unit: String::new(),
            min,
            max,
            default,
            kind: ParamKind::Continuous,
            formatter: None,
        }
    }

    pub fn switch(name: &str, min: f32, max: f32, default: f32, labels: &[&str]) -> Self {
        Self {
            kind: ParamKind::Switch {
                labels: labels.iter().map(|l| l.to_string()).collect(),
            },
            ..Self::continuous(name, min, max, default)
        }
    }

    pub fn button(name: &str) -> Self {
        Self {
            kind: ParamKind::Button,
            ..Self::continuous(name, 0.0, 1.0, 0.0)
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_unit(mut self, unit: &str) -> Self {
        self.unit = unit.to_string();
        self
    }

    /// Replace the default `"<value><unit>"` display with a custom formatter
    pub fn with_formatter(mut self, formatter: fn(f32) -> String) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// Clamp a host-supplied value into range; switches and buttons snap to steps
    pub fn sanitize(&self, value: f32) -> f32 {
        let value = if value.is_nan() { self.default } else { value };
        let clamped = value.clamp(self.min, self.max);
        match self.kind {
            ParamKind::Continuous => clamped,
            ParamKind::Switch { .. } | ParamKind::Button => clamped.round(),
        }
    }

    /// Map an actual value to 0-1
    pub fn normalize(&self, value: f32) -> f32 {
        if self.max <= self.min {
            return 0.0;
        }
        (value.clamp(self.min, self.max) - self.min) / (self.max - self.min)
    }

    /// Map a 0-1 value to the declared range
    pub fn denormalize(&self, normalized: f32) -> f32 {
        self.sanitize(self.min + normalized.clamp(0.0, 1.0) * (self.max - self.min))
    }

    pub fn display(&self, value: f32) -> String {
        if let Some(formatter) = self.formatter {
            return formatter(value);
        }
        match &self.kind {
            ParamKind::Switch { labels } => {
                let step = (value - self.min).round().max(0.0) as usize;
                labels
                    .get(step)
                    .cloned()
                    .unwrap_or_else(|| format!("{value}"))
            }
            _ => format!("{value}{}", self.unit),
        }
    }
}

impl Default for ParamConfig {
    fn default() -> Self {
        Self::continuous("", 0.0, 1.0, 0.0)
    }
}

/// A parameter slot: declared config plus the current value
#[derive(Debug, Clone, Default)]
pub struct Param {
    config: ParamConfig,
    value: f32,
}

impl Param {
    pub fn new(config: ParamConfig) -> Self {
        let value = config.default;
        Self { config, value }
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    #[inline]
    pub fn set_value(&mut self, value: f32) {
        self.value = self.config.sanitize(value);
    }

    pub fn reset(&mut self) {
        self.value = self.config.default;
    }

    pub fn config(&self) -> &ParamConfig {
        &self.config
    }

    pub fn display_value(&self) -> String {
        self.config.display(self.value)
    }
}
