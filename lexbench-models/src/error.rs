//! Error types for model clients.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to a model backend.
#[derive(Debug, Error)]
pub enum Error {
    /// Model name not present in the registry.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// Provider name not recognised.
    #[error("provider not found: {0}")]
    ProviderNotFound(String),

    /// Credentials not found for provider.
    #[error("credentials not found for provider: {0}")]
    CredentialsNotFound(String),

    /// Failed to access system keyring.
    #[error("keyring error: {0}")]
    Keyring(String),

    /// The backend answered with a non-success status.
    #[error("provider API error: {0}")]
    ProviderApi(String),

    /// The request could not be sent or the body could not be read.
    #[error("request failed: {0}")]
    Request(String),

    /// The request exceeded the client timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error came from the network path of a single call.
    ///
    /// Transport failures skip one benchmark item; everything else is a
    /// configuration problem.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Request(_) | Self::Timeout(_) | Self::ProviderApi(_)
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}
