//! Server configuration.

use rpc_register_events::{BackpressurePolicy, PublisherConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Server-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to listen on.
    pub port: u16,
    /// Host to bind to.
    pub host: String,
    /// Log level.
    pub log_level: String,
    /// Prefix the registration endpoints are mounted under.
    pub base_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 9095,
            host: "0.0.0.0".to_string(),
            log_level: "info".to_string(),
            base_path: "/register-client".to_string(),
        }
    }
}

impl ServerConfig {
    /// Returns the `host:port` bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Backpressure policy names accepted in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackpressureSetting {
    #[default]
    BoundedWait,
    FailFast,
}

/// Publisher configuration as written in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherSettings {
    /// Capacity of each partition channel.
    pub capacity: usize,
    /// Number of consumer workers.
    pub worker_count: usize,
    /// Admission policy for full channels.
    pub backpressure: BackpressureSetting,
    /// How long `bounded_wait` waits for room.
    pub admission_timeout_ms: u64,
    /// Deadline for applying one event.
    pub consume_timeout_ms: u64,
}

impl Default for PublisherSettings {
    fn default() -> Self {
        Self {
            capacity: 4096,
            worker_count: 1,
            backpressure: BackpressureSetting::BoundedWait,
            admission_timeout_ms: 3000,
            consume_timeout_ms: 30_000,
        }
    }
}

impl From<&PublisherSettings> for PublisherConfig {
    fn from(settings: &PublisherSettings) -> Self {
        let backpressure = match settings.backpressure {
            BackpressureSetting::BoundedWait => BackpressurePolicy::BoundedWait {
                timeout: Duration::from_millis(settings.admission_timeout_ms),
            },
            BackpressureSetting::FailFast => BackpressurePolicy::FailFast,
        };

        PublisherConfig::new()
            .capacity(settings.capacity)
            .worker_count(settings.worker_count)
            .backpressure(backpressure)
            .consume_timeout(Duration::from_millis(settings.consume_timeout_ms))
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub publisher: PublisherSettings,
}

impl Config {
    /// Parses configuration from TOML text. Missing sections use defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.publisher.capacity == 0 {
            return Err(ConfigError::Invalid("publisher.capacity must be positive".into()));
        }
        if self.publisher.worker_count == 0 {
            return Err(ConfigError::Invalid("publisher.worker_count must be positive".into()));
        }
        if !self.server.base_path.is_empty() && !self.server.base_path.starts_with('/') {
            return Err(ConfigError::Invalid("server.base_path must start with '/'".into()));
        }
        Ok(())
    }
}

/// Loads configuration from a TOML file.
pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
    Config::from_toml(&content)
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
