//! API keys for cloud backends.
//!
//! Keys are stored per [`ProviderKind`] in a [`SecretBackend`], the system
//! keyring in practice. With environment fallback enabled, a provider's
//! environment variable (see [`ProviderKind::api_key_env`]) answers when the
//! keyring has nothing, so CI runs work without a keyring.
//!
//! ```ignore
//! use lexbench_models::ProviderKind;
//! use lexbench_models::auth::CredentialStore;
//!
//! let store = CredentialStore::new("lexbench").with_env_fallback();
//! let key = store.get(ProviderKind::Anthropic)?;
//! ```

use std::env;
use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::{Error, ProviderKind, Result};

/// An API key that never shows up in logs.
#[derive(Clone)]
pub struct ApiKey(SecretString);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(SecretString::from(key.into()))
    }

    /// The raw key, for building request headers.
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

impl From<&str> for ApiKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Where a key was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Keyring,
    Environment,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Keyring => "keyring",
            Self::Environment => "environment",
        })
    }
}

/// Storage for secrets keyed by account name.
pub trait SecretBackend: Send + Sync {
    /// `None` when no secret is stored under `account`.
    fn read(&self, account: &str) -> Result<Option<String>>;

    fn write(&self, account: &str, secret: &str) -> Result<()>;

    /// Whether a secret was removed.
    fn remove(&self, account: &str) -> Result<bool>;
}

/// The OS keyring, one entry per account under a fixed service name.
pub struct Keyring {
    service: String,
}

impl Keyring {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, account: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, account).map_err(|e| Error::Keyring(e.to_string()))
    }
}

impl SecretBackend for Keyring {
    fn read(&self, account: &str) -> Result<Option<String>> {
        match self.entry(account)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(Error::Keyring(e.to_string())),
        }
    }

    fn write(&self, account: &str, secret: &str) -> Result<()> {
        self.entry(account)?
            .set_password(secret)
            .map_err(|e| Error::Keyring(e.to_string()))
    }

    fn remove(&self, account: &str) -> Result<bool> {
        match self.entry(account)?.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) => Err(Error::Keyring(e.to_string())),
        }
    }
}

/// Provider keys from a secret backend, optionally backed by the environment.
pub struct CredentialStore {
    backend: Box<dyn SecretBackend>,
    env_fallback: bool,
}

impl CredentialStore {
    /// Keyring-backed store with entries under `service`.
    pub fn new(service: impl Into<String>) -> Self {
        Self::with_backend(Keyring::new(service))
    }

    pub fn with_backend(backend: impl SecretBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            env_fallback: false,
        }
    }

    /// Also consult the provider's environment variable.
    pub fn with_env_fallback(mut self) -> Self {
        self.env_fallback = true;
        self
    }

    /// The key for `provider` and where it came from. A keyring failure is
    /// logged and treated as "no key there".
    pub fn lookup(&self, provider: ProviderKind) -> Option<(ApiKey, CredentialSource)> {
        env_var(provider)?;

        match self.backend.read(provider.as_str()) {
            Ok(Some(secret)) if !secret.trim().is_empty() => {
                debug!(%provider, "API key from keyring");
                return Some((ApiKey::new(secret.trim()), CredentialSource::Keyring));
            }
            Ok(_) => {}
            Err(e) => warn!(%provider, error = %e, "Keyring unavailable"),
        }

        if !self.env_fallback {
            return None;
        }
        let value = env::var(env_var(provider)?).ok()?;
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        debug!(%provider, "API key from environment");
        Some((ApiKey::new(value), CredentialSource::Environment))
    }

    /// # Errors
    ///
    /// `Error::CredentialsNotFound` when no source has a key.
    pub fn get(&self, provider: ProviderKind) -> Result<ApiKey> {
        self.lookup(provider)
            .map(|(key, _)| key)
            .ok_or_else(|| Error::CredentialsNotFound(provider.to_string()))
    }

    pub fn credential_source(&self, provider: ProviderKind) -> Option<CredentialSource> {
        self.lookup(provider).map(|(_, source)| source)
    }

    /// Save `key` in the backend, trimmed.
    pub fn set(&self, provider: ProviderKind, key: &str) -> Result<()> {
        env_var(provider)
            .ok_or_else(|| Error::Keyring(format!("{provider} does not use an API key")))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::Keyring("API key is empty".into()));
        }
        self.backend.write(provider.as_str(), key)?;
        debug!(%provider, "API key stored");
        Ok(())
    }

    /// Remove the stored key. Environment variables are left alone.
    pub fn clear(&self, provider: ProviderKind) -> Result<bool> {
        self.backend.remove(provider.as_str())
    }
}

fn env_var(provider: ProviderKind) -> Option<&'static str> {
    provider.api_key_env()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryBackend {
        entries: Mutex<HashMap<String, String>>,
        broken: bool,
    }

    impl SecretBackend for MemoryBackend {
        fn read(&self, account: &str) -> Result<Option<String>> {
            if self.broken {
                return Err(Error::Keyring("no secret service".into()));
            }
            Ok(self.entries.lock().unwrap().get(account).cloned())
        }

        fn write(&self, account: &str, secret: &str) -> Result<()> {
            self.entries
                .lock()
                .unwrap()
                .insert(account.to_string(), secret.to_string());
            Ok(())
        }

        fn remove(&self, account: &str) -> Result<bool> {
            Ok(self.entries.lock().unwrap().remove(account).is_some())
        }
    }

    // Serializes the tests that touch ANTHROPIC_API_KEY.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn with_env<T>(value: Option<&str>, f: impl FnOnce() -> T) -> T {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        // SAFETY: guarded by ENV_LOCK
        unsafe {
            match value {
                Some(v) => env::set_var("ANTHROPIC_API_KEY", v),
                None => env::remove_var("ANTHROPIC_API_KEY"),
            }
        }
        let out = f();
        // SAFETY: guarded by ENV_LOCK
        unsafe { env::remove_var("ANTHROPIC_API_KEY") };
        out
    }

    #[test]
    fn api_key_debug_is_redacted() {
        let key = ApiKey::new("sk-ant-secret-12345");
        let debug = format!("{key:?}");
        assert_eq!(debug, "ApiKey([REDACTED])");
        assert_eq!(key.expose_secret(), "sk-ant-secret-12345");
    }

    #[test]
    fn stored_key_round_trips_and_clears() {
        let store = CredentialStore::with_backend(MemoryBackend::default());
        store.set(ProviderKind::Anthropic, "  sk-ant-1\n").unwrap();

        let (key, source) = store.lookup(ProviderKind::Anthropic).unwrap();
        assert_eq!(key.expose_secret(), "sk-ant-1");
        assert_eq!(source, CredentialSource::Keyring);

        assert!(store.clear(ProviderKind::Anthropic).unwrap());
        assert!(!store.clear(ProviderKind::Anthropic).unwrap());
        assert!(matches!(
            store.get(ProviderKind::Anthropic),
            Err(Error::CredentialsNotFound(p)) if p == "anthropic"
        ));
    }

    #[test]
    fn keyring_wins_over_environment() {
        let store = CredentialStore::with_backend(MemoryBackend::default()).with_env_fallback();
        store.set(ProviderKind::Anthropic, "from-keyring").unwrap();

        let key = with_env(Some("from-env"), || store.get(ProviderKind::Anthropic).unwrap());
        assert_eq!(key.expose_secret(), "from-keyring");
    }

    #[test]
    fn environment_answers_when_keyring_is_empty_or_broken() {
        let empty = CredentialStore::with_backend(MemoryBackend::default()).with_env_fallback();
        let broken = CredentialStore::with_backend(MemoryBackend {
            broken: true,
            ..Default::default()
        })
        .with_env_fallback();

        with_env(Some("  key-from-env \n"), || {
            for store in [&empty, &broken] {
                let (key, source) = store.lookup(ProviderKind::Anthropic).unwrap();
                assert_eq!(key.expose_secret(), "key-from-env");
                assert_eq!(source, CredentialSource::Environment);
            }
        });
    }

    #[test]
    fn environment_is_ignored_without_fallback() {
        let store = CredentialStore::with_backend(MemoryBackend::default());
        let source = with_env(Some("from-env"), || store.credential_source(ProviderKind::Anthropic));
        assert_eq!(source, None);
    }

    #[test]
    fn keyless_provider_is_rejected() {
        let store = CredentialStore::with_backend(MemoryBackend::default()).with_env_fallback();
        assert!(store.set(ProviderKind::Ollama, "anything").is_err());
        assert!(store.lookup(ProviderKind::Ollama).is_none());
        assert!(store.set(ProviderKind::Anthropic, "   ").is_err());
    }
}
