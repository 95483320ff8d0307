//! Model access for lexbench.
//!
//! This crate provides:
//! - A model registry mapping CLI names to backend tags
//! - Credential management for API keys
//! - The [`ModelClient`](providers::ModelClient) trait with Ollama and
//!   Anthropic implementations
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   ModelRegistry                     │
//! │        name ──▶ ModelEntry { provider, tag }        │
//! └─────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//! ┌─────────────────────────────────────────────────────┐
//! │                    ModelClient                      │
//! │     ┌──────────────┐          ┌──────────────┐      │
//! │     │ OllamaClient │          │ Anthropic    │      │
//! │     │ (local VRAM) │          │ Client       │      │
//! │     └──────────────┘          └──────────────┘      │
//! └─────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//! ┌─────────────────────────────────────────────────────┐
//! │                  CredentialStore                    │
//! │         (System Keyring + Env Fallback)             │
//! └─────────────────────────────────────────────────────┘
//! ```

mod error;
mod types;

pub mod auth;
pub mod providers;
pub mod registry;

pub use error::{Error, Result};
pub use registry::ModelRegistry;
pub use types::{ModelEntry, ProviderKind};
