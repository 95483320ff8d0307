//! Ollama local model client.
//!
//! Talks to the Ollama REST API. Only one model is kept resident at a time:
//! requests carry `keep_alive` so weights leave VRAM as soon as the runner
//! calls [`release`](super::ModelClient::release).
//!
//! # Example
//!
//! ```ignore
//! use lexbench_models::providers::{OllamaClient, OllamaSettings};
//!
//! let client = OllamaClient::new(OllamaSettings::default())?;  // localhost:11434
//! ```

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::reasoning::{inject_think_directive, split_reasoning};
use super::{ChatOutcome, ChatRequest, ModelClient, round2};
use crate::{Error, Result};

/// Default Ollama API base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Timeout for health probes.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for the unload request.
const RELEASE_TIMEOUT: Duration = Duration::from_secs(10);

/// Pulling large weights can take a long time on a slow link.
const PULL_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);

// ────────────────────────────────────────────────────────────────────────────
// Settings
// ────────────────────────────────────────────────────────────────────────────

/// Connection and generation settings for Ollama.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaSettings {
    /// Server base URL.
    pub base_url: String,
    /// Per-request timeout in seconds; long documents on cold starts need minutes.
    pub timeout_secs: u64,
    /// How long a model stays loaded after a request ("0" unloads at once).
    pub keep_alive: String,
    /// Context window requested from the server.
    pub num_ctx: u32,
    /// Generation cap, keeps runaway thinking chains bounded.
    pub num_predict: u32,
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 300,
            keep_alive: "0".to_string(),
            num_ctx: 4096,
            num_predict: 1024,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Ollama API Types
// ────────────────────────────────────────────────────────────────────────────

/// Message in an Ollama chat request/response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaChatMessage {
    pub role: String,
    pub content: String,
}

/// Generation options for `/api/chat`.
#[derive(Debug, Serialize)]
pub struct OllamaChatOptions {
    pub num_ctx: u32,
    pub num_predict: u32,
}

/// Request body for `/api/chat`.
#[derive(Debug, Serialize)]
pub struct OllamaChatRequest {
    pub model: String,
    pub messages: Vec<OllamaChatMessage>,
    pub stream: bool,
    pub keep_alive: String,
    pub options: OllamaChatOptions,
}

/// Response from `/api/chat` with `stream=false`.
#[derive(Debug, Deserialize)]
pub struct OllamaChatResponse {
    pub message: OllamaChatMessage,
    #[serde(default)]
    pub eval_count: Option<u64>,
    /// Generation time in nanoseconds.
    #[serde(default)]
    pub eval_duration: Option<u64>,
}

impl OllamaChatResponse {
    /// Generation throughput in tokens per second, 0 when no timing was reported.
    pub fn tokens_per_second(&self) -> f64 {
        let tokens = self.eval_count.unwrap_or(0) as f64;
        match self.eval_duration {
            Some(ns) if ns > 0 => round2(tokens / (ns as f64 / 1e9)),
            _ => 0.0,
        }
    }

    /// Convert into a [`ChatOutcome`] given the measured latency.
    pub fn into_outcome(self, elapsed_ms: u64) -> ChatOutcome {
        let tokens_per_second = self.tokens_per_second();
        let split = split_reasoning(&self.message.content);
        ChatOutcome {
            text: split.visible,
            elapsed_ms,
            tokens_generated: self.eval_count.unwrap_or(0),
            tokens_per_second,
            thinking_tokens: split.thinking_tokens,
        }
    }
}

/// Response from `/api/tags`.
#[derive(Debug, Deserialize)]
pub struct OllamaTagsResponse {
    pub models: Vec<OllamaModel>,
}

/// A locally installed model.
#[derive(Debug, Deserialize)]
pub struct OllamaModel {
    pub name: String,
}

// ────────────────────────────────────────────────────────────────────────────
// OllamaClient
// ────────────────────────────────────────────────────────────────────────────

/// Client for a local Ollama server.
pub struct OllamaClient {
    settings: OllamaSettings,
    client: reqwest::Client,
}

impl OllamaClient {
    /// Create a client with the given settings.
    pub fn new(settings: OllamaSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self { settings, client })
    }

    /// Get the base URL for this client.
    pub fn base_url(&self) -> &str {
        self.settings.base_url.trim_end_matches('/')
    }

    /// Settings this client was built with.
    pub fn settings(&self) -> &OllamaSettings {
        &self.settings
    }

    /// Build the wire request for a chat call.
    pub fn build_request(&self, request: &ChatRequest) -> OllamaChatRequest {
        let messages = if request.thinking {
            inject_think_directive(&request.messages)
        } else {
            request.messages.clone()
        };

        OllamaChatRequest {
            model: request.model.clone(),
            messages: messages
                .into_iter()
                .map(|m| OllamaChatMessage {
                    role: m.role.as_str().to_string(),
                    content: m.content,
                })
                .collect(),
            stream: false,
            keep_alive: self.settings.keep_alive.clone(),
            options: OllamaChatOptions {
                num_ctx: self.settings.num_ctx,
                num_predict: request.max_tokens.unwrap_or(self.settings.num_predict),
            },
        }
    }

    /// List installed model tags.
    pub async fn installed_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url());
        let response = self
            .client
            .get(&url)
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::ProviderApi(format!(
                "Ollama API returned status {}",
                response.status()
            )));
        }

        let tags: OllamaTagsResponse = response.json().await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Whether a model tag is installed locally.
    pub async fn is_model_installed(&self, tag: &str) -> bool {
        match self.installed_models().await {
            Ok(tags) => tags.iter().any(|t| t.contains(tag)),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl ModelClient for OllamaClient {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url());
        match self.client.get(&url).timeout(HEALTH_TIMEOUT).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "Ollama health check failed");
                false
            }
        }
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatOutcome> {
        let url = format!("{}/api/chat", self.base_url());
        let body = self.build_request(&request);

        let started = Instant::now();
        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::ProviderApi(format!(
                "Ollama chat failed for model={}: {}: {}",
                request.model, status, text
            )));
        }

        let parsed: OllamaChatResponse = response.json().await?;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        Ok(parsed.into_outcome(elapsed_ms))
    }

    async fn prepare(&self, model: &str) -> Result<()> {
        info!(model, "Pulling model");
        let url = format!("{}/api/pull", self.base_url());
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "model": model, "stream": false }))
            .timeout(PULL_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::ProviderApi(format!(
                "Ollama pull failed for {model}: {status}: {text}"
            )));
        }
        info!(model, "Model ready");
        Ok(())
    }

    async fn release(&self, model: &str) {
        let url = format!("{}/api/generate", self.base_url());
        let result = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "model": model, "keep_alive": "0" }))
            .timeout(RELEASE_TIMEOUT)
            .send()
            .await;

        match result {
            Ok(_) => info!(model, "Model unloaded from VRAM"),
            Err(e) => warn!(model, error = %e, "Could not unload model"),
        }
    }
}
