//! Application configuration structures.
//!
//! Tunables live in an optional TOML file (`Config`); secrets and endpoints
//! come from the process environment (`Settings`). Both are built once at
//! startup and handed to the components that need them.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Content API client settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Retry and quota policy for content API calls
    #[serde(default)]
    pub resilience: ResilienceConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.api.user_agent.trim().is_empty() {
            return Err(AppError::validation("api.user_agent is empty"));
        }
        if self.api.timeout_secs == 0 {
            return Err(AppError::validation("api.timeout_secs must be > 0"));
        }
        url::Url::parse(&self.api.base_url)
            .map_err(|e| AppError::validation(format!("api.base_url is invalid: {e}")))?;
        if self.resilience.max_attempts == 0 {
            return Err(AppError::validation("resilience.max_attempts must be > 0"));
        }
        if self.resilience.max_calls_per_day == 0 {
            return Err(AppError::validation("resilience.max_calls_per_day must be > 0"));
        }
        Ok(())
    }
}

/// Content API client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the content API (the search endpoint is `{base_url}/search`)
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Retry and quota policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResilienceConfig {
    /// Delay before the first retry; doubles on every further attempt
    #[serde(default = "defaults::initial_delay")]
    pub initial_delay_ms: u64,

    /// Total attempts, the first one included
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Calls allowed per calendar day
    #[serde(default = "defaults::max_calls_per_day")]
    pub max_calls_per_day: u32,
}

impl ResilienceConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: defaults::initial_delay(),
            max_attempts: defaults::max_attempts(),
            max_calls_per_day: defaults::max_calls_per_day(),
        }
    }
}

/// Secrets and endpoints read from the environment.
#[derive(Clone)]
pub struct Settings {
    /// Content API key (`GUARDIAN_KEY`)
    pub api_key: String,

    /// Target queue URL (`SQS_QUEUE_URL`)
    pub queue_url: String,

    /// AWS region override (`AWS_REGION`)
    pub region: Option<String>,
}

impl Settings {
    pub const API_KEY_VAR: &'static str = "GUARDIAN_KEY";
    pub const QUEUE_URL_VAR: &'static str = "SQS_QUEUE_URL";
    pub const REGION_VAR: &'static str = "AWS_REGION";

    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through an arbitrary variable lookup.
    ///
    /// Empty values count as missing. Every missing required variable is
    /// named in the error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = read(Self::API_KEY_VAR);
        let queue_url = read(Self::QUEUE_URL_VAR);

        match (api_key, queue_url) {
            (Some(api_key), Some(queue_url)) => Ok(Self {
                api_key,
                queue_url,
                region: read(Self::REGION_VAR),
            }),
            (api_key, queue_url) => {
                let mut missing = Vec::new();
                if api_key.is_none() {
                    missing.push(Self::API_KEY_VAR);
                }
                if queue_url.is_none() {
                    missing.push(Self::QUEUE_URL_VAR);
                }
                Err(AppError::config(format!(
                    "Missing required environment variables: {}",
                    missing.join(", ")
                )))
            }
        }
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &"<redacted>")
            .field("queue_url", &self.queue_url)
            .field("region", &self.region)
            .finish()
    }
}

mod defaults {
    pub fn base_url() -> String {
        "https://content.guardianapis.com".into()
    }
    pub fn user_agent() -> String {
        "guardian-relay/0.1".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    pub fn initial_delay() -> u64 {
        2_000
    }
    pub fn max_attempts() -> u32 {
        4
    }
    pub fn max_calls_per_day() -> u32 {
        50
    }
}
