//! Core types for model selection.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend that serves a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Local inference through an Ollama server.
    Ollama,
    /// Anthropic Messages API.
    Anthropic,
}

impl ProviderKind {
    /// Convert to the configuration string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::Anthropic => "anthropic",
        }
    }

    /// Parse from a configuration string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ollama" => Some(Self::Ollama),
            "anthropic" => Some(Self::Anthropic),
            _ => None,
        }
    }

    /// Environment variable holding the API key; `None` for keyless backends.
    #[must_use]
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            Self::Ollama => None,
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
        }
    }

    /// Whether models from this provider occupy local GPU memory.
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Ollama)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered model: which backend serves it and under which identifier.
///
/// # Examples
///
/// ```
/// use lexbench_models::{ModelEntry, ProviderKind};
///
/// let entry = ModelEntry::ollama("qwen3:14b");
/// assert_eq!(entry.provider, ProviderKind::Ollama);
/// assert_eq!(entry.tag, "qwen3:14b");
/// assert!(!entry.thinking);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelEntry {
    /// Backend serving this model.
    pub provider: ProviderKind,
    /// Ollama tag or Anthropic model id sent on the wire.
    pub tag: String,
    /// Ask the model for a hidden chain of thought.
    #[serde(default)]
    pub thinking: bool,
}

impl ModelEntry {
    /// A model served by Ollama.
    pub fn ollama(tag: impl Into<String>) -> Self {
        Self {
            provider: ProviderKind::Ollama,
            tag: tag.into(),
            thinking: false,
        }
    }

    /// A model served by the Anthropic API.
    pub fn anthropic(model_id: impl Into<String>) -> Self {
        Self {
            provider: ProviderKind::Anthropic,
            tag: model_id.into(),
            thinking: false,
        }
    }

    /// Enable thinking mode.
    pub fn with_thinking(mut self) -> Self {
        self.thinking = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_kind_round_trips_through_strings() {
        for kind in [ProviderKind::Ollama, ProviderKind::Anthropic] {
            assert_eq!(ProviderKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ProviderKind::parse("openai"), None);
    }

    #[test]
    fn only_ollama_is_local() {
        assert!(ProviderKind::Ollama.is_local());
        assert!(!ProviderKind::Anthropic.is_local());
    }

    #[test]
    fn only_cloud_providers_have_key_variables() {
        assert_eq!(ProviderKind::Anthropic.api_key_env(), Some("ANTHROPIC_API_KEY"));
        assert_eq!(ProviderKind::Ollama.api_key_env(), None);
    }

    #[test]
    fn model_entry_deserializes_from_toml_style_json() {
        let json = r#"{"provider": "anthropic", "tag": "claude-sonnet-4-6"}"#;
        let entry: ModelEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry, ModelEntry::anthropic("claude-sonnet-4-6"));
    }

    #[test]
    fn with_thinking_sets_flag() {
        let entry = ModelEntry::ollama("qwen3:32b").with_thinking();
        assert!(entry.thinking);
    }
}
