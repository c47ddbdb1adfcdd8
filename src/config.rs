//! Environment-driven configuration.
//!
//! The model client needs `LLM_BASE_URL`, `LLM_API_KEY` and `LLM_MODEL`. `LLM_HEADERS` may
//! hold a JSON object of extra request headers and `LLM_TIMEOUT_SECS` a request timeout
//! in seconds. The HTTP server reads `HARNESS_PORT` and
//! `HARNESS_TRACES_DIR`, both optional.
//!
//! Every reader takes a lookup function so tests can supply variables without touching
//! the process environment.

use crate::error::{HarnessError, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_TRACES_DIR: &str = "traces";

/// Settings for the OpenAI-compatible model endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub headers: HashMap<String, String>,
    /// Per-request timeout for model calls; none when unset
    pub timeout: Option<Duration>,
}

impl LlmConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key).filter(|v| !v.trim().is_empty()).ok_or_else(|| {
                HarnessError::ConfigError(
                    "LLM_BASE_URL, LLM_API_KEY, and LLM_MODEL environment variables are required"
                        .to_string(),
                )
            })
        };

        let base_url = required("LLM_BASE_URL")?;
        let api_key = required("LLM_API_KEY")?;
        let model = required("LLM_MODEL")?;

        let headers = match lookup("LLM_HEADERS") {
            Some(raw) if !raw.trim().is_empty() => serde_json::from_str(&raw).map_err(|e| {
                HarnessError::ConfigError(format!(
                    "LLM_HEADERS must be a JSON object of strings: {}",
                    e
                ))
            })?,
            _ => HashMap::new(),
        };

        let timeout = match lookup("LLM_TIMEOUT_SECS") {
            Some(raw) if !raw.trim().is_empty() => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    HarnessError::ConfigError(format!(
                        "LLM_TIMEOUT_SECS must be a whole number of seconds: {}",
                        raw
                    ))
                })?;
                Some(Duration::from_secs(secs))
            }
            _ => None,
        };

        Ok(Self {
            base_url,
            api_key,
            model,
            headers,
            timeout,
        })
    }
}

/// Settings for the HTTP surface
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
    /// Directory `POST /save` writes trace files into
    pub traces_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            traces_dir: PathBuf::from(DEFAULT_TRACES_DIR),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(port) = lookup("HARNESS_PORT") {
            config.port = port.trim().parse().map_err(|_| {
                HarnessError::ConfigError(format!("HARNESS_PORT is not a valid port: {}", port))
            })?;
        }

        if let Some(dir) = lookup("HARNESS_TRACES_DIR").filter(|d| !d.trim().is_empty()) {
            config.traces_dir = PathBuf::from(dir);
        }

        Ok(config)
    }
}

/// Complete process configuration, loaded once at startup
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub llm: LlmConfig,
    pub server: ServerConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            llm: LlmConfig::from_env()?,
            server: ServerConfig::from_env()?,
        })
    }
}
