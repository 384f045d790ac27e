//! Driver configuration.
//!
//! Values come either from a deserialized document or from the
//! `UNIRESOLVER_DRIVER_*` environment variables. [`DriverConfig::validate`]
//! checks the combination before a resolver is built.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ResolutionError;
use crate::network::Credentials;

pub const ENV_NODE_URL: &str = "UNIRESOLVER_DRIVER_DID_HEALTH_NODE_URL";
pub const ENV_REGISTRY_URL: &str = "UNIRESOLVER_DRIVER_DID_REGISTRY_URL";
pub const ENV_REGISTRY_ENABLED: &str = "UNIRESOLVER_DRIVER_DID_REGISTRY_ENABLED";
pub const ENV_AUTH_ENABLED: &str = "UNIRESOLVER_DRIVER_AUTH_ENABLED";
pub const ENV_USER: &str = "UNIRESOLVER_DRIVER_USER";
pub const ENV_PASSWORD: &str = "UNIRESOLVER_DRIVER_PASSWORD";
pub const ENV_AUTH_LOGIN_URL: &str = "UNIRESOLVER_DRIVER_AUTH_LOGIN_URL";

pub const DEFAULT_LOGIN_URL: &str =
    "https://dev1.wh-hpass.dev.watson-health.ibm.com/api/v1/hpass/users/login";

fn default_login_url() -> String {
    DEFAULT_LOGIN_URL.to_string()
}

fn default_true() -> bool {
    true
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_max_retries() -> usize {
    10
}

fn default_token_refresh_buffer_secs() -> u64 {
    300
}

/// Configuration consumed by [`crate::Resolver`]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DriverConfig {
    /// Comma-separated node URL templates used when the registry is disabled
    #[serde(default)]
    pub node_urls: Option<String>,

    /// Comma-separated registry URL templates used when the registry is enabled
    #[serde(default)]
    pub registry_url: Option<String>,

    #[serde(default)]
    pub registry_enabled: bool,

    #[serde(default = "default_true")]
    pub auth_enabled: bool,

    #[serde(default = "default_login_url")]
    pub login_url: String,

    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Upper bound for any single outbound call
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Additional attempts after the first for load-balanced requests
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Remaining token lifetime below which a new login is performed
    #[serde(default = "default_token_refresh_buffer_secs")]
    pub token_refresh_buffer_secs: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            node_urls: None,
            registry_url: None,
            registry_enabled: false,
            auth_enabled: true,
            login_url: default_login_url(),
            user: None,
            password: None,
            request_timeout_ms: default_request_timeout_ms(),
            max_retries: default_max_retries(),
            token_refresh_buffer_secs: default_token_refresh_buffer_secs(),
        }
    }
}

impl DriverConfig {
    /// Static-mode configuration over the given node URLs, with authentication disabled
    pub fn with_nodes(node_urls: impl Into<String>) -> Self {
        Self { node_urls: Some(node_urls.into()), auth_enabled: false, ..Self::default() }
    }

    /// Registry-mode configuration, with authentication disabled
    pub fn with_registry(registry_url: impl Into<String>) -> Self {
        Self {
            registry_url: Some(registry_url.into()),
            registry_enabled: true,
            auth_enabled: false,
            ..Self::default()
        }
    }

    /// Reads the `UNIRESOLVER_DRIVER_*` variables of the process environment,
    /// after loading a `.env` file from the working directory when one exists
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let config = Self {
            node_urls: get(ENV_NODE_URL),
            registry_url: get(ENV_REGISTRY_URL),
            registry_enabled: get(ENV_REGISTRY_ENABLED).is_some_and(|flag| flag.trim() == "true"),
            auth_enabled: get(ENV_AUTH_ENABLED).map_or(true, |flag| flag.trim() != "false"),
            login_url: get(ENV_AUTH_LOGIN_URL).unwrap_or_else(default_login_url),
            user: get(ENV_USER),
            password: get(ENV_PASSWORD),
            ..Self::default()
        };

        tracing::debug!(
            registry_enabled = config.registry_enabled,
            auth_enabled = config.auth_enabled,
            "Loaded driver configuration from environment"
        );
        config
    }

    /// Checks that the settings needed by the selected modes are present
    pub fn validate(&self) -> Result<(), ResolutionError> {
        if self.registry_enabled {
            if self.registry_url.is_none() {
                return Err(ResolutionError::Configuration(format!(
                    "{} is required when the registry is enabled",
                    ENV_REGISTRY_URL
                )));
            }
        } else if self.node_urls.is_none() {
            return Err(ResolutionError::Configuration(format!(
                "{} is required when the registry is disabled",
                ENV_NODE_URL
            )));
        }

        if self.request_timeout_ms == 0 {
            return Err(ResolutionError::Configuration(
                "request_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.auth_enabled && self.credentials().is_none() {
            tracing::warn!("Authentication is enabled but credentials are not configured");
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn token_refresh_buffer(&self) -> Duration {
        Duration::from_secs(self.token_refresh_buffer_secs)
    }

    /// Login credentials, when both user and password are set
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.user, &self.password) {
            (Some(user), Some(password)) => {
                Some(Credentials { user: user.clone(), password: password.clone() })
            }
            _ => None,
        }
    }
}
