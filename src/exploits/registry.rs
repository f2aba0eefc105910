use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use super::lfi::LfiModule;
use super::module::ExploitModule;
use crate::errors::ModuleError;

/// Handlers addressable from templates, keyed by name.
#[derive(Default)]
pub struct ExploitRegistry {
    modules: BTreeMap<String, Arc<dyn ExploitModule>>,
}

impl ExploitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in handler registered.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(LfiModule::new()));
        registry
    }

    /// Register a handler under its own name, replacing any previous one.
    pub fn register(&mut self, module: Arc<dyn ExploitModule>) {
        self.modules.insert(module.name().to_string(), module);
    }

    /// Look a handler up by template reference. File-path-like references
    /// resolve by file stem, so `modules/lfi.py` and `lfi` name the same
    /// handler.
    pub fn resolve(&self, reference: &str) -> Result<Arc<dyn ExploitModule>, ModuleError> {
        let name = normalize_reference(reference)?;
        self.modules
            .get(name)
            .cloned()
            .ok_or_else(|| ModuleError::NotFound(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

fn normalize_reference(reference: &str) -> Result<&str, ModuleError> {
    let invalid = || ModuleError::InvalidReference(reference.to_string());
    let trimmed = reference.trim();
    if trimmed.is_empty() || trimmed.ends_with('/') {
        return Err(invalid());
    }
    let stem = Path::new(trimmed)
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(invalid)?;
    if stem.is_empty() || !stem.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err(invalid());
    }
    Ok(stem)
}
