//! LLM backend abstraction.
//!
//! Provides one completion capability over the supported providers. The
//! provider is chosen once at startup by [`build_backend`]; everything
//! downstream only sees `Arc<dyn LlmBackend>`.

use crate::config::LlmConfig;
use crate::error::{ConfigError, LlmError};
use crate::gemini::GeminiBackend;
use crate::openai::OpenAiBackend;
use async_trait::async_trait;
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Default sampling temperature when neither config nor request sets one.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Default output cap, in tokens.
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Available LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    /// OpenAI chat completions API.
    #[serde(rename = "openai")]
    OpenAi,
    /// Google Gemini `generateContent` API.
    Gemini,
    /// Moonshot Kimi, OpenAI-compatible.
    Kimi,
}

impl LlmProvider {
    /// Returns the configuration name of the provider.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
            Self::Kimi => "kimi",
        }
    }

    /// Model used when the configuration does not name one.
    #[must_use]
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4",
            Self::Gemini => "gemini-pro",
            Self::Kimi => "moonshot-v1-8k",
        }
    }

    /// API root used when the configuration does not override it.
    #[must_use]
    pub const fn default_base_url(self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Gemini => "https://generativelanguage.googleapis.com",
            Self::Kimi => "https://api.moonshot.cn/v1",
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "gemini" => Ok(Self::Gemini),
            "kimi" => Ok(Self::Kimi),
            _ => Err(ConfigError::UnknownProvider {
                name: s.to_string(),
            }),
        }
    }
}

/// A request to an LLM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmRequest {
    /// System instruction.
    pub system: String,
    /// User instruction.
    pub prompt: String,
    /// Temperature override; the backend default applies when `None`.
    pub temperature: Option<f32>,
    /// Output cap override; the backend default applies when `None`.
    pub max_tokens: Option<u32>,
}

impl LlmRequest {
    /// Creates a request from a system and a user instruction.
    #[must_use]
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Sets the temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the max tokens.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A response from an LLM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    /// The generated text. Never empty.
    pub content: String,
    /// Model that generated the response.
    pub model: String,
    /// Token usage statistics.
    pub usage: TokenUsage,
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of input tokens.
    pub input_tokens: u32,
    /// Number of output tokens.
    pub output_tokens: u32,
}

impl TokenUsage {
    /// Returns the total number of tokens.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// Trait for LLM backends.
///
/// Implementations hold only immutable configuration and a pooled HTTP
/// client, so a single instance is shared across concurrent requests.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Generates a completion for the given request.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure, a non-success status, an
    /// undecodable envelope, or an empty completion.
    async fn generate_completion(
        &self,
        request: &LlmRequest,
    ) -> Result<LlmResponse, Report<LlmError>>;

    /// Returns the provider type.
    fn provider(&self) -> LlmProvider;

    /// Returns the model name.
    fn model(&self) -> &str;
}

/// Builds the backend selected by `config.provider`.
///
/// # Errors
///
/// Returns an error if the provider name is unknown or its API key is
/// missing.
pub fn build_backend(config: &LlmConfig) -> Result<Arc<dyn LlmBackend>, Report<ConfigError>> {
    let provider: LlmProvider = config.provider.parse()?;
    let settings = config.settings_for(provider);

    let backend: Arc<dyn LlmBackend> = match provider {
        LlmProvider::OpenAi | LlmProvider::Kimi => {
            Arc::new(OpenAiBackend::new(provider, settings)?)
        }
        LlmProvider::Gemini => Arc::new(GeminiBackend::new(settings)?),
    };

    tracing::info!(
        provider = %backend.provider(),
        model = backend.model(),
        "Initialized LLM backend"
    );

    Ok(backend)
}
