//! Provider configuration

use std::{env, path::Path, time::Duration};

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// User agent sent on every request unless overridden
pub const DEFAULT_USER_AGENT: &str = concat!("terraform-provider-corax/", env!("CARGO_PKG_VERSION"));

/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Immutable provider configuration, shared by every resource handler
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL of the Corax API (scheme and host required)
    pub api_endpoint: String,

    /// API key sent in the `X-API-Key` header.
    /// Supports a literal value or `env:VAR_NAME`.
    pub api_key: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// User agent header value
    pub user_agent: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_endpoint: String::new(),
            api_key: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

// The key never shows up in logs or panics.
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_endpoint", &self.api_endpoint)
            .field("api_key", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl ProviderConfig {
    /// Build a configuration from an endpoint and key, with defaults elsewhere
    pub fn new(api_endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_endpoint: api_endpoint.into(),
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Load configuration from an optional YAML file and `CORAX_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if the config file does not exist, cannot be parsed,
    /// or the resulting configuration is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        // CORAX_API_ENDPOINT, CORAX_API_KEY, CORAX_TIMEOUT_SECS, ...
        figment = figment.merge(Env::prefixed("CORAX_"));

        Self::from_figment(&figment)
    }

    /// Extract, resolve and validate a configuration from any figment
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when extraction, key resolution or validation fails.
    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let mut config: Self = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;

        config.api_key = config.resolve_api_key()?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the API key (expand `env:VAR_NAME`)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the referenced variable is not set.
    pub fn resolve_api_key(&self) -> Result<String> {
        match self.api_key.strip_prefix("env:") {
            Some(var_name) => env::var(var_name).map_err(|_| {
                Error::Config(format!(
                    "api_key references environment variable {var_name}, which is not set"
                ))
            }),
            None => Ok(self.api_key.clone()),
        }
    }

    /// Check required fields and the endpoint URL
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        self.endpoint_url()?;

        if self.api_key.trim().is_empty() {
            return Err(Error::Config(
                "api_key cannot be empty (set CORAX_API_KEY or api_key in the config file)"
                    .to_string(),
            ));
        }

        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be at least 1".to_string()));
        }

        Ok(())
    }

    /// Parsed base URL
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the endpoint is blank, unparsable,
    /// or lacks a scheme or host.
    pub fn endpoint_url(&self) -> Result<Url> {
        if self.api_endpoint.trim().is_empty() {
            return Err(Error::Config(
                "api_endpoint cannot be empty (set CORAX_API_ENDPOINT or api_endpoint in the config file)"
                    .to_string(),
            ));
        }

        let url = Url::parse(self.api_endpoint.trim())
            .map_err(|e| Error::Config(format!("invalid api_endpoint: {e}")))?;
        if url.cannot_be_a_base() || url.host_str().is_none() {
            return Err(Error::Config(
                "api_endpoint must include scheme and host".to_string(),
            ));
        }
        Ok(url)
    }

    /// Request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
