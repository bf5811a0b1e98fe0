//! Service Configuration
//!
//! Layered from an optional TOML file and `CREDIT_RISK__*` environment
//! variables, e.g. `CREDIT_RISK__SERVER__PORT=9090`.

use crate::rate_limit::RateLimitConfig;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use feature_engine::FeatureConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default configuration file, without extension
pub const DEFAULT_CONFIG_PATH: &str = "config/default";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    /// Feature options for services published without their own
    pub features: FeatureConfig,
    pub logging: LoggingConfig,
    pub rate_limit: RateLimitConfig,
    /// Service published at startup
    pub bootstrap: Option<BootstrapService>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// A service loaded from a JSON artifact on startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapService {
    pub name: String,
    pub version: String,
    pub model_path: PathBuf,
}

impl ServiceConfig {
    /// Load from [`DEFAULT_CONFIG_PATH`] and the environment
    pub fn load() -> Result<Self> {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Load from a file (which may be absent) and the environment
    pub fn load_from_path(path: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("CREDIT_RISK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
