//! Model registry mapping CLI-friendly names to backend identifiers.
//!
//! The registry is built once at startup (defaults plus any entries from the
//! config file) and looked up by name. An unknown name is a configuration
//! error and must be reported before any model is called.

use crate::{Error, ModelEntry, Result};

/// Catalog of benchmarkable models, in registration order.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    entries: Vec<(String, ModelEntry)>,
}

impl ModelRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the stock local and cloud models.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("qwen3-14b", ModelEntry::ollama("qwen3:14b"));
        registry.register("qwen3-30b-a3b", ModelEntry::ollama("qwen3:30b"));
        registry.register("qwen3-32b", ModelEntry::ollama("qwen3:32b-q4_K_M"));
        registry.register("mistral-small-24b", ModelEntry::ollama("mistral-small:24b"));
        registry.register(
            "claude-sonnet-4-5",
            ModelEntry::anthropic("claude-sonnet-4-5-20251022"),
        );
        registry.register("claude-sonnet-4-6", ModelEntry::anthropic("claude-sonnet-4-6"));
        registry
    }

    /// Add or replace a model. Replacing keeps the original position.
    pub fn register(&mut self, name: impl Into<String>, entry: ModelEntry) {
        let name = name.into();
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = entry;
        } else {
            self.entries.push((name, entry));
        }
    }

    /// Look up a model by name.
    pub fn get(&self, name: &str) -> Result<&ModelEntry> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, e)| e)
            .ok_or_else(|| Error::ModelNotFound(name.to_string()))
    }

    /// Whether a model with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Registered names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Registered entries in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModelEntry)> {
        self.entries.iter().map(|(n, e)| (n.as_str(), e))
    }

    /// Names of local models, used as the default selection so a run never
    /// needs an API key unless asked to.
    #[must_use]
    pub fn local_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, e)| e.provider.is_local())
            .map(|(n, _)| n.clone())
            .collect()
    }

    /// Check that every requested name exists.
    pub fn validate<S: AsRef<str>>(&self, names: &[S]) -> Result<()> {
        for name in names {
            self.get(name.as_ref())?;
        }
        Ok(())
    }
}
