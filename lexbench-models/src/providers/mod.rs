//! Model client trait and backend implementations.
//!
//! The [`ModelClient`] trait is the only surface the benchmark core sees:
//! send one conversation, get back text plus timing and token accounting.
//! Local (Ollama) and cloud (Anthropic) backends both implement it.
//!
//! # Example
//!
//! ```ignore
//! use lexbench_models::providers::{ChatRequest, ModelClient, OllamaClient};
//!
//! async fn ask(client: &dyn ModelClient) -> lexbench_models::Result<()> {
//!     let request = ChatRequest::single_turn("qwen3:14b", "Is a cat a dog?");
//!     let outcome = client.chat(request).await?;
//!     println!("{} ({} ms)", outcome.text, outcome.elapsed_ms);
//!     Ok(())
//! }
//! ```

mod anthropic;
mod ollama;
mod reasoning;
mod types;

use async_trait::async_trait;

pub use anthropic::{ANTHROPIC_API_BASE, AnthropicClient};
pub use ollama::{OllamaClient, OllamaSettings};
pub use reasoning::{SplitResponse, approx_tokens, inject_think_directive, split_reasoning};
pub use types::*;

use crate::Result;

/// A backend able to answer chat requests.
///
/// Calls are issued strictly one at a time by the benchmark runner; an
/// implementation does not need to support concurrent requests.
///
/// # Required Methods
///
/// - [`name`](ModelClient::name) - Backend identifier ("ollama", "anthropic")
/// - [`is_available`](ModelClient::is_available) - Health probe
/// - [`chat`](ModelClient::chat) - One blocking chat completion
///
/// # Optional Methods
///
/// - [`prepare`](ModelClient::prepare) - Make a model ready (pull weights)
/// - [`release`](ModelClient::release) - Free resources held by a model
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Backend identifier.
    fn name(&self) -> &str;

    /// Whether the backend can currently serve requests.
    async fn is_available(&self) -> bool;

    /// Perform a chat completion.
    ///
    /// # Errors
    ///
    /// Network and timeout failures surface as errors for which
    /// [`Error::is_transport`](crate::Error::is_transport) is true.
    async fn chat(&self, request: ChatRequest) -> Result<ChatOutcome>;

    /// Make `model` ready to serve. Default is a no-op.
    async fn prepare(&self, _model: &str) -> Result<()> {
        Ok(())
    }

    /// Release resources held by `model`. Best effort; never fails.
    async fn release(&self, _model: &str) {}
}
