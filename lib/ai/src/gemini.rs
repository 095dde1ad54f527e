//! Google Gemini backend.
//!
//! Gemini's `generateContent` endpoint has no separate system role here, so
//! the system and user instructions are folded into one prompt that ends
//! with an explicit JSON-only directive.

use crate::backend::{LlmBackend, LlmProvider, LlmRequest, LlmResponse, TokenUsage};
use crate::config::ProviderSettings;
use crate::error::{ConfigError, LlmError};
use crate::http;
use async_trait::async_trait;
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};

const JSON_ONLY_DIRECTIVE: &str = "IMPORTANT: Return ONLY valid JSON, no extra text.";

/// Gemini `generateContent` client.
#[derive(Debug, Clone)]
pub struct GeminiBackend {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    default_temperature: f32,
    default_max_tokens: u32,
}

impl GeminiBackend {
    /// Creates a Gemini backend.
    ///
    /// # Errors
    ///
    /// Returns an error if no API key is configured.
    pub fn new(settings: &ProviderSettings) -> Result<Self, Report<ConfigError>> {
        let provider = LlmProvider::Gemini;
        let api_key = settings
            .api_key()
            .ok_or(ConfigError::MissingCredential { provider })?
            .to_string();

        Ok(Self {
            client: http::build_client()?,
            api_key,
            base_url: settings.resolved_base_url(provider),
            model: settings.resolved_model(provider),
            default_temperature: settings.resolved_temperature(),
            default_max_tokens: settings.resolved_max_tokens(),
        })
    }

    fn combined_prompt(request: &LlmRequest) -> String {
        format!(
            "{}\n\n{}\n\n{JSON_ONLY_DIRECTIVE}",
            request.system, request.prompt
        )
    }

    fn build_body(&self, request: &LlmRequest) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(Self::combined_prompt(request)),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature.unwrap_or(self.default_temperature),
                max_output_tokens: request.max_tokens.unwrap_or(self.default_max_tokens),
            },
        }
    }

    fn parse_completion(&self, body: GenerateContentResponse) -> Result<LlmResponse, LlmError> {
        let content: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(LlmError::EmptyCompletion {
                provider: LlmProvider::Gemini,
            });
        }

        let usage = body.usage_metadata.unwrap_or_default();
        Ok(LlmResponse {
            content,
            model: body.model_version.unwrap_or_else(|| self.model.clone()),
            usage: TokenUsage {
                input_tokens: usage.prompt_token_count,
                output_tokens: usage.candidates_token_count,
            },
        })
    }
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    async fn generate_completion(
        &self,
        request: &LlmRequest,
    ) -> Result<LlmResponse, Report<LlmError>> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = self.build_body(request);

        tracing::debug!(
            provider = %LlmProvider::Gemini,
            model = %self.model,
            temperature = body.generation_config.temperature,
            max_tokens = body.generation_config.max_output_tokens,
            "Requesting Gemini completion"
        );

        let envelope: GenerateContentResponse = http::send_json(
            LlmProvider::Gemini,
            self.client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&body),
        )
        .await?;

        let response = self.parse_completion(envelope).inspect_err(|e| {
            tracing::error!(
                provider = %LlmProvider::Gemini,
                error = %e,
                "Gemini completion unusable"
            );
        })?;

        Ok(response)
    }

    fn provider(&self) -> LlmProvider {
        LlmProvider::Gemini
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}
