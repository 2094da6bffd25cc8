//! Patch documents: params and module state for a set of modules
//!
//! A patch is a flat list of module entries in rack order. Restoring matches
//! entries to modules by position and checks the model id of each pair.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use bl_core::{BlError, BlResult, Module};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Current patch format version
pub const PATCH_VERSION: u32 = 1;

/// One module's saved params and state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleEntry {
    pub model: String,
    #[serde(default)]
    pub params: Vec<f32>,
    #[serde(default)]
    pub data: Value,
}

impl ModuleEntry {
    pub fn capture(module: &dyn Module) -> Self {
        Self {
            model: module.model().to_string(),
            params: module.io().params().iter().map(|p| p.value()).collect(),
            data: module.data_to_json(),
        }
    }

    /// Fails unless `module` is the model this entry was captured from
    pub fn check_model(&self, module: &dyn Module) -> BlResult<()> {
        if self.model != module.model() {
            return Err(BlError::State(format!(
                "patch entry is '{}' but module is '{}'",
                self.model,
                module.model()
            )));
        }
        Ok(())
    }

    /// Write params and state back. Extra or missing param values are
    /// tolerated; a model mismatch is an error.
    pub fn restore(&self, module: &mut dyn Module) -> BlResult<()> {
        self.check_model(module)?;

        let params = module.io_mut().params_mut();
        if params.len() != self.params.len() {
            log::warn!(
                "{}: patch has {} param values, module has {}",
                self.model,
                self.params.len(),
                params.len()
            );
        }
        for (param, value) in params.iter_mut().zip(&self.params) {
            param.set_value(*value);
        }

        module.data_from_json(&self.data);
        Ok(())
    }
}

/// Saved state of a rack of modules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchDocument {
    pub version: u32,
    pub modules: Vec<ModuleEntry>,
}

impl Default for PatchDocument {
    fn default() -> Self {
        Self {
            version: PATCH_VERSION,
            modules: Vec::new(),
        }
    }
}

impl PatchDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot every module in order
    pub fn capture(modules: &[&dyn Module]) -> Self {
        Self {
            version: PATCH_VERSION,
            modules: modules.iter().map(|m| ModuleEntry::capture(*m)).collect(),
        }
    }

    pub fn push(&mut self, module: &dyn Module) {
        self.modules.push(ModuleEntry::capture(module));
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Restore into modules matched by position. An empty patch leaves every
    /// module untouched, and so does any error: all pairs are checked
    /// before the first write.
    pub fn restore(&self, modules: &mut [&mut dyn Module]) -> BlResult<()> {
        if self.is_empty() {
            return Ok(());
        }
        if self.modules.len() != modules.len() {
            return Err(BlError::State(format!(
                "patch has {} modules, rack has {}",
                self.modules.len(),
                modules.len()
            )));
        }
        for (entry, module) in self.modules.iter().zip(modules.iter()) {
            entry.check_model(&**module)?;
        }
        for (entry, module) in self.modules.iter().zip(modules.iter_mut()) {
            entry.restore(&mut **module)?;
        }
        Ok(())
    }

    pub fn to_json_string(&self) -> BlResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json_str(json: &str) -> BlResult<Self> {
        let doc: Self = serde_json::from_str(json)?;
        if doc.version > PATCH_VERSION {
            return Err(BlError::State(format!(
                "patch version {} is newer than supported version {PATCH_VERSION}",
                doc.version
            )));
        }
        Ok(doc)
    }

    /// Save as pretty JSON, creating parent directories
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> BlResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json_string()?)?;
        log::debug!("Saved patch with {} modules to {}", self.len(), path.display());
        Ok(())
    }

    /// Load from disk. A missing file is an empty patch; unreadable or
    /// malformed files are errors.
    pub fn load_from<P: AsRef<Path>>(path: P) -> BlResult<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => Self::from_json_str(&content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("No patch at {}; starting empty", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_document_parses() {
        let doc = PatchDocument::from_json_str("{}").unwrap();
        assert!(doc.is_empty());
        assert_eq!(doc.version, PATCH_VERSION);
    }

    #[test]
    fn test_entry_defaults() {
        let doc = PatchDocument::from_json_str(r#"{"modules": [{"model": "Bypass"}]}"#).unwrap();
        assert_eq!(doc.modules[0].params, Vec::<f32>::new());
        assert_eq!(doc.modules[0].data, Value::Null);
    }

    #[test]
    fn test_newer_version_rejected() {
        let json = json!({ "version": PATCH_VERSION + 1, "modules": [] }).to_string();
        assert!(matches!(
            PatchDocument::from_json_str(&json),
            Err(BlError::State(_))
        ));
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(matches!(
            PatchDocument::from_json_str("{ not json"),
            Err(BlError::Serialization(_))
        ));
    }
}
