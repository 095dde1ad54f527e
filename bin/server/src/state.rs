//! Shared application state.

use crate::config::ServerConfig;
use rootcause::prelude::Report;
use saverfox_adventure::AdventureService;
use saverfox_ai::{ConfigError, build_backend, build_trace_sink};

/// State shared by every handler.
pub struct AppState {
    /// Scenario generation and choice evaluation.
    pub adventures: AdventureService,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(adventures: AdventureService) -> Self {
        Self { adventures }
    }

    /// Builds the provider backend and trace sink selected by configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is unknown or its API key is missing.
    pub fn from_config(config: &ServerConfig) -> Result<Self, Report<ConfigError>> {
        let backend = build_backend(&config.llm)?;
        let traces = build_trace_sink(&config.trace);
        Ok(Self::new(AdventureService::new(
            backend,
            traces,
            config.generation.clone(),
        )))
    }
}
