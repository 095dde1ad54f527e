//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables, optionally
//! layered over a file named by `SAVERFOX_CONFIG`.
//!
//! See [`LlmConfig`] for provider selection and credentials.

use saverfox_adventure::GeneratorConfig;
use saverfox_ai::{LlmConfig, TraceConfig};
use serde::Deserialize;

/// Environment variable naming an optional configuration file.
pub const CONFIG_FILE_ENV: &str = "SAVERFOX_CONFIG";

/// Server configuration composed from library configs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Prefix for the adventure API routes.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Comma-separated allowed CORS origins; `*` allows any origin.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,

    /// LLM provider configuration.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Trace sink configuration.
    #[serde(default)]
    pub trace: TraceConfig,

    /// Scenario generation limits.
    #[serde(default)]
    pub generation: GeneratorConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8001
}

fn default_api_prefix() -> String {
    "/api".to_string()
}

fn default_cors_origins() -> String {
    "http://localhost:3000,http://localhost:8000".to_string()
}

impl ServerConfig {
    /// Loads configuration from environment variables, on top of the file
    /// named by `SAVERFOX_CONFIG` when it is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a value is invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let file = std::env::var(CONFIG_FILE_ENV).ok();
        Self::load(file.as_deref(), config::Environment::default())
    }

    fn load(file: Option<&str>, env: config::Environment) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::with_name(path));
        }

        builder
            .add_source(env.separator("__").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Socket address string for the listener.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Allowed CORS origins, trimmed, without empty entries.
    #[must_use]
    pub fn cors_origin_list(&self) -> Vec<&str> {
        self.cors_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .collect()
    }
}
