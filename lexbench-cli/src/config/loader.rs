use super::types::{
    AnthropicConfig, LexbenchConfig, PathsConfig, RawAnthropicConfig, RawLexbenchConfig,
    RawOllamaConfig, RawPathsConfig, RawRunConfig, RunConfig,
};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use lexbench_models::providers::OllamaSettings;
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<LexbenchConfig> {
        let mut raw = RawLexbenchConfig::default();

        // Layer 1: User config
        if let Some(user_path) = Self::user_config_path()
            && user_path.exists()
        {
            raw = Self::merge_raw(raw, Self::read_raw(&user_path)?);
        }

        // Layer 2: Project config
        let project_path = Self::project_config_path();
        if project_path.exists() {
            raw = Self::merge_raw(raw, Self::read_raw(&project_path)?);
        }

        Ok(Self::finalize(raw))
    }

    fn read_raw(path: &Path) -> Result<RawLexbenchConfig> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
    }

    /// Get user config path (platform-specific)
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "lexbench").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get project config path
    /// Can be overridden with LEXBENCH_PROJECT_CONFIG_DIR env var (useful for isolated e2e tests)
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("LEXBENCH_PROJECT_CONFIG_DIR") {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".lexbench/config.toml")
        }
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawLexbenchConfig, overlay: RawLexbenchConfig) -> RawLexbenchConfig {
        let mut sample_sizes = base.sample_sizes;
        sample_sizes.extend(overlay.sample_sizes);
        let mut models = base.models;
        models.extend(overlay.models);

        RawLexbenchConfig {
            paths: RawPathsConfig {
                checkpoint_dir: overlay.paths.checkpoint_dir.or(base.paths.checkpoint_dir),
                datasets_dir: overlay.paths.datasets_dir.or(base.paths.datasets_dir),
                results_dir: overlay.paths.results_dir.or(base.paths.results_dir),
                logs_dir: overlay.paths.logs_dir.or(base.paths.logs_dir),
            },
            run: RawRunConfig {
                seed: overlay.run.seed.or(base.run.seed),
                models: overlay.run.models.or(base.run.models),
                benchmarks: overlay.run.benchmarks.or(base.run.benchmarks),
                output: overlay.run.output.or(base.run.output),
                skip_prepare: overlay.run.skip_prepare.or(base.run.skip_prepare),
                max_tokens: overlay.run.max_tokens.or(base.run.max_tokens),
                log_to_file: overlay.run.log_to_file.or(base.run.log_to_file),
            },
            ollama: RawOllamaConfig {
                base_url: overlay.ollama.base_url.or(base.ollama.base_url),
                timeout_secs: overlay.ollama.timeout_secs.or(base.ollama.timeout_secs),
                keep_alive: overlay.ollama.keep_alive.or(base.ollama.keep_alive),
                num_ctx: overlay.ollama.num_ctx.or(base.ollama.num_ctx),
                num_predict: overlay.ollama.num_predict.or(base.ollama.num_predict),
            },
            anthropic: RawAnthropicConfig {
                base_url: overlay.anthropic.base_url.or(base.anthropic.base_url),
                timeout_secs: overlay.anthropic.timeout_secs.or(base.anthropic.timeout_secs),
            },
            sample_sizes,
            models,
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawLexbenchConfig) -> LexbenchConfig {
        let paths = PathsConfig::default();
        let run = RunConfig::default();
        let ollama = OllamaSettings::default();
        let anthropic = AnthropicConfig::default();

        LexbenchConfig {
            paths: PathsConfig {
                checkpoint_dir: raw.paths.checkpoint_dir.unwrap_or(paths.checkpoint_dir),
                datasets_dir: raw.paths.datasets_dir.unwrap_or(paths.datasets_dir),
                results_dir: raw.paths.results_dir.unwrap_or(paths.results_dir),
                logs_dir: raw.paths.logs_dir.unwrap_or(paths.logs_dir),
            },
            run: RunConfig {
                seed: raw.run.seed.unwrap_or(run.seed),
                models: raw.run.models.unwrap_or(run.models),
                benchmarks: raw.run.benchmarks.unwrap_or(run.benchmarks),
                output: raw.run.output.unwrap_or(run.output),
                skip_prepare: raw.run.skip_prepare.unwrap_or(run.skip_prepare),
                max_tokens: raw.run.max_tokens.or(run.max_tokens),
                log_to_file: raw.run.log_to_file.unwrap_or(run.log_to_file),
            },
            ollama: OllamaSettings {
                base_url: raw.ollama.base_url.unwrap_or(ollama.base_url),
                timeout_secs: raw.ollama.timeout_secs.unwrap_or(ollama.timeout_secs),
                keep_alive: raw.ollama.keep_alive.unwrap_or(ollama.keep_alive),
                num_ctx: raw.ollama.num_ctx.unwrap_or(ollama.num_ctx),
                num_predict: raw.ollama.num_predict.unwrap_or(ollama.num_predict),
            },
            anthropic: AnthropicConfig {
                base_url: raw.anthropic.base_url.or(anthropic.base_url),
                timeout_secs: raw.anthropic.timeout_secs.unwrap_or(anthropic.timeout_secs),
            },
            sample_sizes: raw.sample_sizes,
            models: raw.models,
        }
    }

    /// Write a starter config, creating parent directories.
    pub fn save_to_path(config: &LexbenchConfig, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml = toml::to_string_pretty(config)?;
        std::fs::write(path, toml)?;

        Ok(())
    }

    /// Load config from a specific path (for testing)
    #[cfg(test)]
    pub fn load_from_path(path: &Path) -> Result<LexbenchConfig> {
        if path.exists() {
            Ok(Self::finalize(Self::read_raw(path)?))
        } else {
            Ok(LexbenchConfig::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{OutputFormat, SampleSizeEntry};
    use lexbench_models::ModelEntry;
    use tempfile::TempDir;

    // ==================== Save Tests ====================

    #[test]
    fn test_save_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        ConfigLoader::save_to_path(&LexbenchConfig::default(), &path).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = LexbenchConfig::default();
        config.run.seed = 1234;
        config.run.output = OutputFormat::Jsonl;
        config.ollama.base_url = "http://gpu-box:11434".to_string();

        ConfigLoader::save_to_path(&config, &path).unwrap();
        let loaded = ConfigLoader::load_from_path(&path).unwrap();

        assert_eq!(loaded.run.seed, 1234);
        assert_eq!(loaded.run.output, OutputFormat::Jsonl);
        assert_eq!(loaded.ollama.base_url, "http://gpu-box:11434");
    }

    // ==================== Load Tests ====================

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = ConfigLoader::load_from_path(&temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.run.seed, 42);
        assert_eq!(config.ollama.keep_alive, "0");
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[paths]\nresults_dir = \"/srv/results\"\n\n[ollama]\nnum_ctx = 8192\n",
        )
        .unwrap();

        let config = ConfigLoader::load_from_path(&path).unwrap();

        assert_eq!(config.paths.results_dir, PathBuf::from("/srv/results"));
        assert_eq!(config.paths.checkpoint_dir, lexbench_paths::checkpoint_dir());
        assert_eq!(config.ollama.num_ctx, 8192);
        assert_eq!(config.ollama.num_predict, 1024);
        assert_eq!(config.anthropic.timeout_secs, 300);
    }

    #[test]
    fn test_load_invalid_toml_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[run\nseed = ").unwrap();

        assert!(ConfigLoader::load_from_path(&path).is_err());
    }

    #[test]
    fn test_project_config_path_is_toml() {
        let path = ConfigLoader::project_config_path();
        assert!(path.ends_with("config.toml"));
    }

    // ==================== Merge Tests ====================

    #[test]
    fn test_merge_overlay_wins_when_set() {
        let base: RawLexbenchConfig =
            toml::from_str("[run]\nseed = 1\noutput = \"jsonl\"\n").unwrap();
        let overlay: RawLexbenchConfig = toml::from_str("[run]\nseed = 2\n").unwrap();

        let merged = ConfigLoader::merge_raw(base, overlay);

        assert_eq!(merged.run.seed, Some(2));
        assert_eq!(merged.run.output, Some(OutputFormat::Jsonl));
    }

    #[test]
    fn test_merge_keeps_base_when_overlay_unset() {
        let base: RawLexbenchConfig =
            toml::from_str("[ollama]\nbase_url = \"http://a:11434\"\n").unwrap();
        let overlay = RawLexbenchConfig::default();

        let merged = ConfigLoader::merge_raw(base, overlay);

        assert_eq!(merged.ollama.base_url.as_deref(), Some("http://a:11434"));
    }

    #[test]
    fn test_merge_combines_tables() {
        let mut base = RawLexbenchConfig::default();
        base.models.insert("llama".into(), ModelEntry::ollama("llama3:8b"));
        base.sample_sizes.insert(
            "cuad".into(),
            SampleSizeEntry {
                normal: 5,
                quick: 1,
            },
        );
        let mut overlay = RawLexbenchConfig::default();
        overlay
            .models
            .insert("llama".into(), ModelEntry::ollama("llama3:70b"));
        overlay
            .models
            .insert("gemma".into(), ModelEntry::ollama("gemma3:12b"));

        let merged = ConfigLoader::merge_raw(base, overlay);

        assert_eq!(merged.models.len(), 2);
        assert_eq!(merged.models["llama"].tag, "llama3:70b");
        assert_eq!(merged.sample_sizes["cuad"].normal, 5);
    }

    #[test]
    fn test_finalize_empty_matches_default() {
        let config = ConfigLoader::finalize(RawLexbenchConfig::default());
        let default = LexbenchConfig::default();

        assert_eq!(config.run.seed, default.run.seed);
        assert_eq!(config.run.benchmarks, default.run.benchmarks);
        assert_eq!(config.ollama, default.ollama);
        assert_eq!(config.paths.logs_dir, default.paths.logs_dir);
        assert!(config.run.log_to_file);
    }
}
