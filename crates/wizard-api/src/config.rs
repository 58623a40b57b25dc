//! Service configuration
//!
//! Values come from, in increasing priority:
//!
//! 1. built-in defaults
//! 2. an optional YAML file
//! 3. `OBW_`-prefixed environment variables (`OBW_BACKEND_BASE_URL`,
//!    `OBW_WORKER_COUNT`, `OBW_SERVER_PORT`, ...)
//!
//! Command-line flags of the binary override the result.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use wizard_exec::{BackendConfig, WorkerConfig};
use wizard_trace::DEFAULT_ROOT_SCOPE;

/// Prefix of configuration environment variables
pub const ENV_PREFIX: &str = "OBW_";

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive; defaults to `info` in production, `debug` otherwise
    #[serde(default)]
    pub level: Option<String>,
    /// Emit one JSON object per record
    #[serde(default = "default_json")]
    pub json: bool,
}

fn default_json() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: None,
            json: default_json(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TraceConfig {
    /// Name of the application root logger scope
    #[serde(default = "default_root_scope")]
    pub root_scope: String,
}

fn default_root_scope() -> String {
    DEFAULT_ROOT_SCOPE.to_string()
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            root_scope: default_root_scope(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Deployment environment (`prod`, `dev`, ...)
    #[serde(default)]
    pub env: Option<String>,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub trace: TraceConfig,
}

impl Config {
    /// Load from an optional YAML file, then overlay the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(std::env::vars())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Overlay `OBW_*` variables. Unknown keys are ignored.
    pub fn apply_env<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match name {
                "ENV" => self.env = Some(value),
                "BACKEND_BASE_URL" => self.backend.base_url = value,
                "WORKER_COUNT" => self.worker.count = parse(&key, &value)?,
                "WORKER_POLL_INTERVAL_MS" => self.worker.poll_interval_ms = parse(&key, &value)?,
                "SERVER_HOST" => self.server.host = value,
                "SERVER_PORT" => self.server.port = parse(&key, &value)?,
                "LOGGING_LEVEL" => self.logging.level = Some(value),
                "LOGGING_JSON" => self.logging.json = parse_bool(&key, &value)?,
                "TRACE_ROOT_SCOPE" => self.trace.root_scope = value,
                _ => {}
            }
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        matches!(self.env.as_deref(), Some("prod" | "production"))
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
