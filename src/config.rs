//! Configuration management for ceprace using the prefer crate.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::query::DEFAULT_JITTER_MAX;
use crate::race::{RacePolicy, DEFAULT_DEADLINE};
use crate::services::{BRASILAPI_URL, VIACEP_URL};

/// Default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse {format} config: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },
}

/// Configuration file structure.
///
/// Every field is optional; unset fields fall back to the defaults in
/// [`Settings`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Overall race deadline in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Upper bound of the pre-request jitter in milliseconds (0 disables).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jitter_max_ms: Option<u64>,
    /// Per-request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    /// User agent string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Whether a fast failure may win the race.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub race_policy: Option<RacePolicy>,
    /// Require ViaCEP's `uf` and `estado` to name the same state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_check_state: Option<bool>,
    /// BrasilAPI endpoint template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brasilapi_url: Option<String>,
    /// ViaCEP endpoint template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viacep_url: Option<String>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers ceprace config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("ceprace").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("Ignoring config file: {}", e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            // No config file found
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config = Self::parse(&contents, ext)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse config text in the format named by `ext`.
    pub fn parse(contents: &str, ext: &str) -> Result<Self, ConfigError> {
        match ext {
            "toml" => toml::from_str(contents).map_err(|e| ConfigError::Parse {
                format: "TOML",
                message: e.to_string(),
            }),
            "yaml" | "yml" => serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse {
                format: "YAML",
                message: e.to_string(),
            }),
            _ => serde_json::from_str(contents).map_err(|e| ConfigError::Parse {
                format: "JSON",
                message: e.to_string(),
            }),
        }
    }

    /// Resolve into runtime settings, filling in defaults.
    pub fn settings(&self) -> Settings {
        let defaults = Settings::default();
        Settings {
            timeout: self
                .timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.timeout),
            jitter_max: self
                .jitter_max_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.jitter_max),
            request_timeout: self
                .request_timeout
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            user_agent: self.user_agent.clone(),
            race_policy: self.race_policy.unwrap_or(defaults.race_policy),
            cross_check_state: self.cross_check_state.unwrap_or(defaults.cross_check_state),
            brasilapi_url: self
                .brasilapi_url
                .clone()
                .unwrap_or(defaults.brasilapi_url),
            viacep_url: self.viacep_url.clone().unwrap_or(defaults.viacep_url),
        }
    }
}

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Overall race deadline.
    pub timeout: Duration,
    pub jitter_max: Duration,
    pub request_timeout: Duration,
    pub user_agent: Option<String>,
    pub race_policy: RacePolicy,
    pub cross_check_state: bool,
    pub brasilapi_url: String,
    pub viacep_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_DEADLINE,
            jitter_max: DEFAULT_JITTER_MAX,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: None,
            race_policy: RacePolicy::default(),
            cross_check_state: false,
            brasilapi_url: BRASILAPI_URL.to_string(),
            viacep_url: VIACEP_URL.to_string(),
        }
    }
}
