//! OpenAI-compatible chat completions backend.
//!
//! Serves both OpenAI and Kimi (Moonshot), which speak the same wire format
//! and differ only in API root, model and credential.

use crate::backend::{LlmBackend, LlmProvider, LlmRequest, LlmResponse, TokenUsage};
use crate::config::ProviderSettings;
use crate::error::{ConfigError, LlmError};
use crate::http;
use async_trait::async_trait;
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};

/// Chat completions client for one provider.
#[derive(Debug, Clone)]
pub struct OpenAiBackend {
    provider: LlmProvider,
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    default_temperature: f32,
    default_max_tokens: u32,
}

impl OpenAiBackend {
    /// Creates a backend for an OpenAI-compatible provider.
    ///
    /// # Errors
    ///
    /// Returns an error if no API key is configured.
    pub fn new(
        provider: LlmProvider,
        settings: &ProviderSettings,
    ) -> Result<Self, Report<ConfigError>> {
        let api_key = settings
            .api_key()
            .ok_or(ConfigError::MissingCredential { provider })?
            .to_string();

        Ok(Self {
            provider,
            client: http::build_client()?,
            api_key,
            base_url: settings.resolved_base_url(provider),
            model: settings.resolved_model(provider),
            default_temperature: settings.resolved_temperature(),
            default_max_tokens: settings.resolved_max_tokens(),
        })
    }

    fn build_body<'a>(&'a self, request: &'a LlmRequest) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: request.temperature.unwrap_or(self.default_temperature),
            max_tokens: request.max_tokens.unwrap_or(self.default_max_tokens),
        }
    }

    fn parse_completion(&self, body: ChatCompletionResponse) -> Result<LlmResponse, LlmError> {
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(LlmError::EmptyCompletion {
                provider: self.provider,
            })?;

        let usage = body.usage.unwrap_or_default();
        Ok(LlmResponse {
            content,
            model: body.model.unwrap_or_else(|| self.model.clone()),
            usage: TokenUsage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
            },
        })
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn generate_completion(
        &self,
        request: &LlmRequest,
    ) -> Result<LlmResponse, Report<LlmError>> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_body(request);

        tracing::debug!(
            provider = %self.provider,
            model = %self.model,
            temperature = body.temperature,
            max_tokens = body.max_tokens,
            "Requesting chat completion"
        );

        let envelope: ChatCompletionResponse = http::send_json(
            self.provider,
            self.client.post(&url).bearer_auth(&self.api_key).json(&body),
        )
        .await?;

        let response = self.parse_completion(envelope).inspect_err(|e| {
            tracing::error!(provider = %self.provider, error = %e, "Chat completion unusable");
        })?;

        Ok(response)
    }

    fn provider(&self) -> LlmProvider {
        self.provider
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn backend(provider: LlmProvider) -> OpenAiBackend {
        OpenAiBackend::new(provider, &ProviderSettings::with_api_key("sk-test")).expect("backend")
    }

    #[test]
    fn missing_key_is_a_configuration_error() {
        let err = OpenAiBackend::new(LlmProvider::OpenAi, &ProviderSettings::default())
            .expect_err("no key");
        assert_eq!(
            *err.current_context(),
            ConfigError::MissingCredential {
                provider: LlmProvider::OpenAi
            }
        );
    }

    #[test]
    fn kimi_uses_moonshot_endpoint() {
        let kimi = backend(LlmProvider::Kimi);
        assert_eq!(kimi.base_url, "https://api.moonshot.cn/v1");
        assert_eq!(kimi.model(), "moonshot-v1-8k");
        assert_eq!(kimi.provider(), LlmProvider::Kimi);
    }

    #[test]
    fn body_carries_system_and_user_roles() {
        let openai = backend(LlmProvider::OpenAi);
        let request = LlmRequest::new("system text", "user text");

        let body = serde_json::to_value(openai.build_body(&request)).expect("serialize");
        assert_eq!(body["model"], "gpt-4");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "system text");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "user text");
        assert_eq!(body["max_tokens"], 1000);
    }

    #[test]
    fn explicit_zero_temperature_is_kept() {
        let openai = backend(LlmProvider::OpenAi);
        let request = LlmRequest::new("s", "u").with_temperature(0.0).with_max_tokens(50);

        let body = openai.build_body(&request);
        assert_eq!(body.temperature, 0.0);
        assert_eq!(body.max_tokens, 50);
    }

    #[test]
    fn response_extracts_first_choice_and_usage() {
        let openai = backend(LlmProvider::OpenAi);
        let envelope: ChatCompletionResponse = serde_json::from_value(json!({
            "model": "gpt-4-0613",
            "choices": [{ "message": { "role": "assistant", "content": "{\"a\":1}" } }],
            "usage": { "prompt_tokens": 40, "completion_tokens": 12, "total_tokens": 52 }
        }))
        .expect("deserialize");

        let response = openai.parse_completion(envelope).expect("response");
        assert_eq!(response.content, "{\"a\":1}");
        assert_eq!(response.model, "gpt-4-0613");
        assert_eq!(response.usage.total(), 52);
    }

    #[test]
    fn empty_content_is_rejected() {
        let kimi = backend(LlmProvider::Kimi);
        let envelope: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{ "message": { "role": "assistant", "content": "  " } }]
        }))
        .expect("deserialize");

        assert_eq!(
            kimi.parse_completion(envelope).unwrap_err(),
            LlmError::EmptyCompletion {
                provider: LlmProvider::Kimi
            }
        );
    }

    #[test]
    fn missing_choices_are_rejected() {
        let openai = backend(LlmProvider::OpenAi);
        let envelope: ChatCompletionResponse =
            serde_json::from_value(json!({ "choices": [] })).expect("deserialize");

        assert!(matches!(
            openai.parse_completion(envelope),
            Err(LlmError::EmptyCompletion { .. })
        ));
    }
}
