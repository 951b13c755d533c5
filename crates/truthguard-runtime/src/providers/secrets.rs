//! Credential handling for the model provider and the search API.
//!
//! Both external services are keyed by an API credential. Wrapping the raw
//! value in [`ApiCredential`] ensures:
//!
//! - **No accidental logging**: credentials never appear in Debug/Display output
//! - **Memory safety**: credentials are zeroed on drop
//! - **Explicit exposure**: the raw value is only read at the request site
//!
//! ## Usage
//!
//! ```ignore
//! use truthguard_runtime::providers::ApiCredential;
//!
//! // Required credential (model provider)
//! let cred = ApiCredential::from_env("GROQ_API_KEY", "Groq API key")?;
//!
//! // Optional credential (search degrades to a sentinel without it)
//! let search = ApiCredential::from_env_optional("NEWS_API_KEY", "NewsAPI key");
//!
//! request.bearer_auth(cred.expose());
//! ```

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value as JsonValue;
use std::fmt;

use super::ProviderError;

/// Where a credential was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Loaded from configuration JSON
    Config,
    /// Loaded from environment variable
    Environment,
    /// Provided programmatically
    Programmatic,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Config => write!(f, "config"),
            CredentialSource::Environment => write!(f, "environment"),
            CredentialSource::Programmatic => write!(f, "programmatic"),
        }
    }
}

/// A securely-stored API credential.
///
/// Debug and Display show `[REDACTED]`; the value is only reachable through
/// [`ApiCredential::expose`].
pub struct ApiCredential {
    value: SecretString,
    source: CredentialSource,
    name: &'static str,
}

impl ApiCredential {
    /// Create a new credential from a string value.
    pub fn new(value: impl Into<String>, source: CredentialSource, name: &'static str) -> Self {
        Self {
            value: SecretString::from(value.into()),
            source,
            name,
        }
    }

    /// Load credential from an environment variable.
    pub fn from_env(env_var: &str, name: &'static str) -> Result<Self, ProviderError> {
        Self::from_env_optional(env_var, name).ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "{} not set: configure '{}' environment variable",
                name, env_var
            ))
        })
    }

    /// Load credential from an environment variable if it is set and non-empty.
    pub fn from_env_optional(env_var: &str, name: &'static str) -> Option<Self> {
        std::env::var(env_var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(|v| Self::new(v, CredentialSource::Environment, name))
    }

    /// Load credential from JSON config, falling back to an environment variable.
    pub fn from_config_or_env(
        config: &JsonValue,
        config_key: &str,
        env_var: &str,
        name: &'static str,
    ) -> Result<Self, ProviderError> {
        if let Some(value) = config[config_key].as_str() {
            return Ok(Self::new(value, CredentialSource::Config, name));
        }

        if let Some(credential) = Self::from_env_optional(env_var, name) {
            return Ok(credential);
        }

        Err(ProviderError::NotConfigured(format!(
            "{} required: set '{}' in config or {} environment variable",
            name, config_key, env_var
        )))
    }

    /// Check if a credential is available (without loading it).
    pub fn is_available(config: &JsonValue, config_key: &str, env_var: &str) -> bool {
        config[config_key].as_str().is_some()
            || std::env::var(env_var).map(|v| !v.trim().is_empty()).unwrap_or(false)
    }

    /// Expose the credential value at the point of use.
    ///
    /// Never store the returned slice.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    /// Check if the credential is empty.
    pub fn is_empty(&self) -> bool {
        self.value.expose_secret().is_empty()
    }

    /// Get the source of this credential.
    pub fn source(&self) -> CredentialSource {
        self.source
    }

    /// Get the human-readable name of this credential.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("value", &"[REDACTED]")
            .field("source", &self.source)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {} [REDACTED]", self.name, self.source)
    }
}
