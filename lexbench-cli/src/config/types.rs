use std::collections::BTreeMap;
use std::path::PathBuf;

use lexbench_evals::SuiteConfig;
use lexbench_evals::benchmark::BENCHMARK_NAMES;
use lexbench_evals::config::{DEFAULT_SEED, SampleSize};
use lexbench_models::providers::OllamaSettings;
use lexbench_models::{ModelEntry, ModelRegistry};
use serde::{Deserialize, Serialize};

/// Default Anthropic request timeout in seconds.
pub const DEFAULT_ANTHROPIC_TIMEOUT_SECS: u64 = 300;

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawLexbenchConfig {
    #[serde(default)]
    pub paths: RawPathsConfig,

    #[serde(default)]
    pub run: RawRunConfig,

    #[serde(default)]
    pub ollama: RawOllamaConfig,

    #[serde(default)]
    pub anthropic: RawAnthropicConfig,

    /// Per-benchmark sample sizes; entries extend the built-in table
    #[serde(default)]
    pub sample_sizes: BTreeMap<String, SampleSizeEntry>,

    /// Extra or overridden models by CLI name
    #[serde(default)]
    pub models: BTreeMap<String, ModelEntry>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawPathsConfig {
    pub checkpoint_dir: Option<PathBuf>,
    pub datasets_dir: Option<PathBuf>,
    pub results_dir: Option<PathBuf>,
    pub logs_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawRunConfig {
    pub seed: Option<u64>,
    pub models: Option<Vec<String>>,
    pub benchmarks: Option<Vec<String>>,
    pub output: Option<OutputFormat>,
    pub skip_prepare: Option<bool>,
    pub max_tokens: Option<u32>,
    pub log_to_file: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawOllamaConfig {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub keep_alive: Option<String>,
    pub num_ctx: Option<u32>,
    pub num_predict: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawAnthropicConfig {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Result file format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Jsonl,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Jsonl => "jsonl",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleSizeEntry {
    pub normal: usize,
    pub quick: usize,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LexbenchConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub run: RunConfig,

    #[serde(default)]
    pub ollama: OllamaSettings,

    #[serde(default)]
    pub anthropic: AnthropicConfig,

    #[serde(default)]
    pub sample_sizes: BTreeMap<String, SampleSizeEntry>,

    #[serde(default)]
    pub models: BTreeMap<String, ModelEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub checkpoint_dir: PathBuf,
    pub datasets_dir: PathBuf,
    pub results_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            checkpoint_dir: lexbench_paths::checkpoint_dir(),
            datasets_dir: lexbench_paths::datasets_dir(),
            results_dir: lexbench_paths::results_dir(),
            logs_dir: lexbench_paths::logs_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub seed: u64,

    /// Models run when none are given on the command line; empty means
    /// every local model
    pub models: Vec<String>,

    /// Benchmarks run when none are given on the command line
    pub benchmarks: Vec<String>,

    pub output: OutputFormat,

    pub skip_prepare: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Also write logs to a daily file under `paths.logs_dir`
    pub log_to_file: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            models: Vec::new(),
            benchmarks: BENCHMARK_NAMES.iter().map(|s| s.to_string()).collect(),
            output: OutputFormat::default(),
            skip_prepare: false,
            max_tokens: None,
            log_to_file: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: DEFAULT_ANTHROPIC_TIMEOUT_SECS,
        }
    }
}

impl LexbenchConfig {
    /// Suite configuration with paths, seed and sample sizes applied.
    pub fn suite_config(&self) -> SuiteConfig {
        let mut suite = SuiteConfig {
            checkpoint_dir: self.paths.checkpoint_dir.clone(),
            datasets_dir: self.paths.datasets_dir.clone(),
            results_dir: self.paths.results_dir.clone(),
            logs_dir: self.paths.logs_dir.clone(),
            seed: self.run.seed,
            ..SuiteConfig::default()
        };
        for (name, size) in &self.sample_sizes {
            suite
                .sample_sizes
                .insert(name.clone(), SampleSize::new(size.normal, size.quick));
        }
        suite
    }

    /// Built-in models plus the ones from config.
    pub fn model_registry(&self) -> ModelRegistry {
        let mut registry = ModelRegistry::with_defaults();
        for (name, entry) in &self.models {
            registry.register(name.clone(), entry.clone());
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexbench_models::ProviderKind;

    #[test]
    fn test_default_values() {
        let config = LexbenchConfig::default();
        assert_eq!(config.run.seed, 42);
        assert_eq!(config.run.output, OutputFormat::Csv);
        assert_eq!(config.run.benchmarks, vec!["legalbench", "cuad", "ifeval", "mmlupro"]);
        assert!(config.run.models.is_empty());
        assert_eq!(config.ollama.num_ctx, 4096);
        assert_eq!(config.anthropic.timeout_secs, 300);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = LexbenchConfig::default();
        config.run.seed = 7;
        config.run.output = OutputFormat::Jsonl;
        config
            .models
            .insert("llama".into(), ModelEntry::ollama("llama3:8b"));

        let toml_str = toml::to_string(&config).unwrap();
        let parsed: LexbenchConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.run.seed, 7);
        assert_eq!(parsed.run.output, OutputFormat::Jsonl);
        assert_eq!(parsed.models["llama"].tag, "llama3:8b");
    }

    #[test]
    fn test_raw_config_partial_parsing() {
        let toml_str = r#"
[run]
seed = 1

[sample_sizes.legalbench]
normal = 48
quick = 6

[models.deepseek-r1]
provider = "ollama"
tag = "deepseek-r1:14b"
thinking = true
"#;
        let raw: RawLexbenchConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(raw.run.seed, Some(1));
        assert!(raw.run.output.is_none());
        assert!(raw.ollama.base_url.is_none());
        assert_eq!(raw.sample_sizes["legalbench"].normal, 48);
        let model = &raw.models["deepseek-r1"];
        assert_eq!(model.provider, ProviderKind::Ollama);
        assert!(model.thinking);
    }

    #[test]
    fn test_raw_config_empty_uses_none() {
        let raw: RawLexbenchConfig = toml::from_str("").unwrap();
        assert!(raw.paths.checkpoint_dir.is_none());
        assert!(raw.run.seed.is_none());
        assert!(raw.models.is_empty());
    }

    #[test]
    fn test_suite_config_applies_overrides() {
        let mut config = LexbenchConfig::default();
        config.paths.checkpoint_dir = PathBuf::from("/tmp/cp");
        config.run.seed = 9;
        config.sample_sizes.insert(
            "cuad".into(),
            SampleSizeEntry {
                normal: 2,
                quick: 1,
            },
        );

        let suite = config.suite_config();
        assert_eq!(suite.checkpoint_dir, PathBuf::from("/tmp/cp"));
        assert_eq!(suite.seed, 9);
        assert_eq!(suite.sample_size("cuad", false), 2);
        assert_eq!(suite.sample_size("legalbench", false), 24);
    }

    #[test]
    fn test_model_registry_includes_config_models() {
        let mut config = LexbenchConfig::default();
        config
            .models
            .insert("llama".into(), ModelEntry::ollama("llama3:8b"));
        config
            .models
            .insert("qwen3-14b".into(), ModelEntry::ollama("qwen3:14b").with_thinking());

        let registry = config.model_registry();
        assert_eq!(registry.get("llama").unwrap().tag, "llama3:8b");
        assert!(registry.get("qwen3-14b").unwrap().thinking);
        assert!(registry.contains("claude-sonnet-4-6"));
    }
}
