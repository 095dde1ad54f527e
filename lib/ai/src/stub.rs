//! Scripted backend for tests.
//!
//! Replays queued completions in order and records every request it sees,
//! so callers can assert on prompt amendments between attempts.

use crate::backend::{LlmBackend, LlmProvider, LlmRequest, LlmResponse, TokenUsage};
use crate::error::LlmError;
use async_trait::async_trait;
use rootcause::prelude::Report;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// Backend that answers from a script instead of the network.
#[derive(Debug)]
pub struct StubBackend {
    provider: LlmProvider,
    model: String,
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl StubBackend {
    /// Creates a stub with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self {
            provider: LlmProvider::OpenAi,
            model: "stub-model".to_string(),
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Creates a stub that answers with the given completions in order.
    #[must_use]
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let stub = Self::new();
        for response in responses {
            stub.push_response(response);
        }
        stub
    }

    /// Queues a completion.
    pub fn push_response(&self, content: impl Into<String>) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Ok(content.into()));
    }

    /// Queues a failure.
    pub fn push_error(&self, error: LlmError) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Err(error));
    }

    /// Returns every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns how many completions were requested.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmBackend for StubBackend {
    async fn generate_completion(
        &self,
        request: &LlmRequest,
    ) -> Result<LlmResponse, Report<LlmError>> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let next = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(Err(LlmError::RequestFailed {
                provider: self.provider,
                reason: "stub script exhausted".to_string(),
            }))?;

        if next.trim().is_empty() {
            return Err(LlmError::EmptyCompletion {
                provider: self.provider,
            }
            .into());
        }

        Ok(LlmResponse {
            content: next,
            model: self.model.clone(),
            usage: TokenUsage::default(),
        })
    }

    fn provider(&self) -> LlmProvider {
        self.provider
    }

    fn model(&self) -> &str {
        &self.model
    }
}
