//! LLM provider configuration.
//!
//! Deserialized by the binary from environment variables (for example
//! `LLM__PROVIDER=gemini`, `LLM__GEMINI__API_KEY=...`). Every field has a
//! default so a partially specified provider section still loads.

use crate::backend::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, LlmProvider};
use serde::Deserialize;

/// Which provider to use, plus per-provider settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// Provider name: "openai", "gemini" or "kimi".
    #[serde(default = "default_provider")]
    pub provider: String,

    /// OpenAI settings.
    #[serde(default)]
    pub openai: ProviderSettings,

    /// Gemini settings.
    #[serde(default)]
    pub gemini: ProviderSettings,

    /// Kimi (Moonshot) settings.
    #[serde(default)]
    pub kimi: ProviderSettings,
}

fn default_provider() -> String {
    "openai".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            openai: ProviderSettings::default(),
            gemini: ProviderSettings::default(),
            kimi: ProviderSettings::default(),
        }
    }
}

impl LlmConfig {
    /// Returns the settings section for a provider.
    #[must_use]
    pub fn settings_for(&self, provider: LlmProvider) -> &ProviderSettings {
        match provider {
            LlmProvider::OpenAi => &self.openai,
            LlmProvider::Gemini => &self.gemini,
            LlmProvider::Kimi => &self.kimi,
        }
    }
}

/// Settings for one provider. Unset fields fall back to provider defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderSettings {
    api_key: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    base_url: Option<String>,
}

impl ProviderSettings {
    /// Creates settings with only an API key.
    #[must_use]
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    /// Overrides the model.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Overrides the API root.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Overrides the default temperature.
    #[must_use]
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Overrides the default output cap.
    #[must_use]
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// The API key, treating blank values as absent.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// The model, or the provider default.
    #[must_use]
    pub fn resolved_model(&self, provider: LlmProvider) -> String {
        self.model
            .clone()
            .filter(|model| !model.trim().is_empty())
            .unwrap_or_else(|| provider.default_model().to_string())
    }

    /// The API root without a trailing slash, or the provider default.
    #[must_use]
    pub fn resolved_base_url(&self, provider: LlmProvider) -> String {
        self.base_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(provider.default_base_url())
            .trim_end_matches('/')
            .to_string()
    }

    /// The default temperature for this provider.
    #[must_use]
    pub fn resolved_temperature(&self) -> f32 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    /// The default output cap for this provider.
    #[must_use]
    pub fn resolved_max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_select_openai() {
        let config = LlmConfig::default();
        assert_eq!(config.provider, "openai");
        assert!(config.openai.api_key().is_none());
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let settings = ProviderSettings::with_api_key("   ");
        assert!(settings.api_key().is_none());
    }

    #[test]
    fn provider_defaults_fill_unset_fields() {
        let settings = ProviderSettings::with_api_key("k");
        assert_eq!(settings.resolved_model(LlmProvider::Kimi), "moonshot-v1-8k");
        assert_eq!(
            settings.resolved_base_url(LlmProvider::Kimi),
            "https://api.moonshot.cn/v1"
        );
        assert_eq!(settings.resolved_temperature(), 0.7);
        assert_eq!(settings.resolved_max_tokens(), 1000);
    }

    #[test]
    fn overrides_win_over_defaults() {
        let settings = ProviderSettings::with_api_key("k")
            .model("gpt-4o-mini")
            .base_url("http://localhost:8080/v1/")
            .temperature(0.2)
            .max_tokens(300);

        assert_eq!(settings.resolved_model(LlmProvider::OpenAi), "gpt-4o-mini");
        assert_eq!(
            settings.resolved_base_url(LlmProvider::OpenAi),
            "http://localhost:8080/v1"
        );
        assert_eq!(settings.resolved_temperature(), 0.2);
        assert_eq!(settings.resolved_max_tokens(), 300);
    }

    #[test]
    fn partial_section_deserializes() {
        let config: LlmConfig = serde_json::from_value(serde_json::json!({
            "provider": "kimi",
            "kimi": { "api_key": "sk-kimi" }
        }))
        .expect("deserialize");

        assert_eq!(config.provider, "kimi");
        assert_eq!(config.kimi.api_key(), Some("sk-kimi"));
        assert!(config.gemini.api_key().is_none());
    }
}
