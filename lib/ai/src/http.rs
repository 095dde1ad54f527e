//! Shared HTTP plumbing for the provider backends.

use crate::backend::LlmProvider;
use crate::error::{ConfigError, LlmError};
use rootcause::prelude::Report;
use serde::de::DeserializeOwned;

/// Longest slice of an error body carried into `LlmError::UnexpectedStatus`.
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Builds the pooled client a backend keeps for its lifetime.
///
/// No timeout is configured; the HTTP boundary owns request deadlines.
pub(crate) fn build_client() -> Result<reqwest::Client, Report<ConfigError>> {
    reqwest::Client::builder().build().map_err(|e| {
        ConfigError::HttpClient {
            reason: e.to_string(),
        }
        .into()
    })
}

/// Sends a request and decodes a JSON envelope.
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: LlmProvider,
    request: reqwest::RequestBuilder,
) -> Result<T, Report<LlmError>> {
    let response = request.send().await.map_err(|e| {
        tracing::error!(provider = %provider, error = %e, "LLM request failed");
        LlmError::RequestFailed {
            provider,
            reason: e.to_string(),
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::error!(
            provider = %provider,
            status = %status,
            body = %body,
            "LLM provider returned error"
        );
        return Err(LlmError::UnexpectedStatus {
            provider,
            status: status.as_u16(),
            body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        }
        .into());
    }

    let envelope = response.json::<T>().await.map_err(|e| {
        tracing::error!(provider = %provider, error = %e, "Failed to decode LLM response");
        LlmError::ResponseParseFailed {
            provider,
            reason: e.to_string(),
        }
    })?;

    Ok(envelope)
}
