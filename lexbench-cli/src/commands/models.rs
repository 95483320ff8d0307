//! Model listing and credential commands.

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use dialoguer::{Password, theme::ColorfulTheme};
use lexbench_models::auth::CredentialStore;
use lexbench_models::providers::OllamaClient;
use lexbench_models::{ModelEntry, ProviderKind};
use tracing::debug;

use crate::commands::run::CREDENTIAL_SERVICE;
use crate::config::LexbenchConfig;

/// Models management arguments.
#[derive(Args, Debug)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommands,
}

/// Models subcommands.
#[derive(Subcommand, Debug)]
pub enum ModelsCommands {
    /// List registered models and whether they are installed
    List {
        /// Filter by provider (ollama, anthropic)
        #[arg(long)]
        provider: Option<String>,
    },
    /// Manage API credentials
    Auth {
        /// Provider to configure
        #[arg(default_value = "anthropic")]
        provider: String,

        /// Show where the key comes from instead of prompting
        #[arg(long, conflicts_with = "clear")]
        status: bool,

        /// Remove the key stored in the keyring
        #[arg(long)]
        clear: bool,
    },
}

pub async fn run(args: ModelsArgs, config: LexbenchConfig) -> Result<()> {
    match args.command {
        ModelsCommands::List { provider } => list_models(&config, provider).await,
        ModelsCommands::Auth {
            provider,
            status,
            clear,
        } => manage_auth(parse_provider(&provider)?, status, clear),
    }
}

async fn list_models(config: &LexbenchConfig, provider_filter: Option<String>) -> Result<()> {
    let filter = provider_filter.as_deref().map(parse_provider).transpose()?;

    let registry = config.model_registry();
    let installed = match OllamaClient::new(config.ollama.clone()) {
        Ok(client) => client.installed_models().await.unwrap_or_else(|e| {
            debug!("Ollama not available: {}", e);
            Vec::new()
        }),
        Err(_) => Vec::new(),
    };
    let store = CredentialStore::new(CREDENTIAL_SERVICE).with_env_fallback();
    let anthropic_ready = store.credential_source(ProviderKind::Anthropic).is_some();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Name").fg(Color::Cyan),
        Cell::new("Provider").fg(Color::Cyan),
        Cell::new("Tag").fg(Color::Cyan),
        Cell::new("Thinking").fg(Color::Cyan),
        Cell::new("Status").fg(Color::Cyan),
    ]);

    for (name, entry) in registry.iter() {
        if filter.is_some_and(|kind| kind != entry.provider) {
            continue;
        }
        table.add_row(vec![
            Cell::new(name),
            Cell::new(entry.provider),
            Cell::new(&entry.tag),
            Cell::new(if entry.thinking { "yes" } else { "no" }),
            Cell::new(model_status(entry, &installed, anthropic_ready)),
        ]);
    }

    println!("{table}");
    Ok(())
}

fn model_status(entry: &ModelEntry, installed: &[String], anthropic_ready: bool) -> &'static str {
    match entry.provider {
        ProviderKind::Ollama if installed.iter().any(|tag| tag.contains(&entry.tag)) => {
            "installed"
        }
        ProviderKind::Ollama => "not pulled",
        ProviderKind::Anthropic if anthropic_ready => "key configured",
        ProviderKind::Anthropic => "no key",
    }
}

fn parse_provider(name: &str) -> Result<ProviderKind> {
    match ProviderKind::parse(name) {
        Some(kind) => Ok(kind),
        None => bail!("Unknown provider '{}'. Valid: ollama, anthropic", name),
    }
}

fn manage_auth(provider: ProviderKind, status: bool, clear: bool) -> Result<()> {
    let Some(env_var) = provider.api_key_env() else {
        bail!("{provider} does not use an API key");
    };
    let store = CredentialStore::new(CREDENTIAL_SERVICE).with_env_fallback();

    if status {
        match store.credential_source(provider) {
            Some(source) => println!("{provider}: {source}"),
            None => println!("{provider}: not configured"),
        }
        return Ok(());
    }

    if clear {
        if store.clear(provider)? {
            println!("Removed the {provider} key from the keyring.");
        } else {
            println!("No {provider} key in the keyring.");
        }
        return Ok(());
    }

    println!("Enter API key for {provider} (or set {env_var})");
    let key = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("API key")
        .interact()?;
    if key.trim().is_empty() {
        bail!("API key cannot be empty");
    }

    store.set(provider, &key)?;
    println!("Credentials for '{provider}' saved to keyring.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_for_installed_ollama_model() {
        let entry = ModelEntry::ollama("qwen3:14b");
        let installed = vec!["qwen3:14b".to_string(), "llama3:8b".to_string()];
        assert_eq!(model_status(&entry, &installed, false), "installed");
        assert_eq!(model_status(&entry, &[], false), "not pulled");
    }

    #[test]
    fn status_for_anthropic_model() {
        let entry = ModelEntry::anthropic("claude-sonnet-4-6");
        assert_eq!(model_status(&entry, &[], true), "key configured");
        assert_eq!(model_status(&entry, &[], false), "no key");
    }

    #[test]
    fn provider_names_are_checked() {
        assert_eq!(parse_provider("anthropic").unwrap(), ProviderKind::Anthropic);
        let err = parse_provider("openai").unwrap_err();
        assert!(err.to_string().contains("openai"));
    }

    #[test]
    fn local_provider_has_no_key_to_manage() {
        let err = manage_auth(ProviderKind::Ollama, true, false).unwrap_err();
        assert!(err.to_string().contains("does not use an API key"));
    }
}
