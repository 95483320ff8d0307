//! Anthropic Messages API client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ChatOutcome, ChatRequest, ModelClient, Role, round2};
use crate::auth::ApiKey;
use crate::{Error, Result};

/// Default Anthropic API base URL.
pub const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 2048;

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<WireMessage>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    output_tokens: u64,
}

/// Client for Anthropic-hosted models.
pub struct AnthropicClient {
    api_key: Option<ApiKey>,
    base_url: String,
    client: reqwest::Client,
}

impl AnthropicClient {
    /// Create a client. Without a key the client reports itself unavailable.
    pub fn new(api_key: Option<ApiKey>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key,
            base_url: ANTHROPIC_API_BASE.to_string(),
            client,
        })
    }

    /// Point the client at a different endpoint (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_request(request: &ChatRequest) -> MessagesRequest {
        let system: Vec<&str> = request
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();
        let mut messages: Vec<WireMessage> = request
            .messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| WireMessage {
                role: m.role.as_str(),
                content: m.content.clone(),
            })
            .collect();

        let mut system = if system.is_empty() {
            None
        } else {
            Some(system.join("\n\n"))
        };

        // The API rejects a conversation without a user turn.
        if messages.is_empty()
            && let Some(text) = system.take()
        {
            messages.push(WireMessage {
                role: Role::User.as_str(),
                content: text,
            });
        }

        MessagesRequest {
            model: request.model.clone(),
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system,
            messages,
        }
    }

    fn parse_response(response: MessagesResponse, elapsed: Duration) -> ChatOutcome {
        let text = response
            .content
            .iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text.as_deref())
            .collect::<Vec<_>>()
            .join("");
        let output_tokens = response.usage.map(|u| u.output_tokens).unwrap_or(0);
        let secs = elapsed.as_secs_f64();
        let tokens_per_second = if secs > 0.0 {
            round2(output_tokens as f64 / secs)
        } else {
            0.0
        };

        ChatOutcome {
            text: text.trim().to_string(),
            elapsed_ms: elapsed.as_millis() as u64,
            tokens_generated: output_tokens,
            tokens_per_second,
            thinking_tokens: 0,
        }
    }
}

#[async_trait]
impl ModelClient for AnthropicClient {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatOutcome> {
        let key = self
            .api_key
            .as_ref()
            .ok_or_else(|| Error::CredentialsNotFound("anthropic".to_string()))?;

        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let body = Self::build_request(&request);
        debug!(model = %request.model, "sending Anthropic request");

        let started = Instant::now();
        let response = self
            .client
            .post(&url)
            .header("x-api-key", key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::ProviderApi(format!(
                "Anthropic API error {status}: {text}"
            )));
        }

        let parsed: MessagesResponse = response.json().await?;
        Ok(Self::parse_response(parsed, started.elapsed()))
    }
}
