//! Error types for the AI crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `ConfigError`: Fatal problems detected while building a backend
//! - `LlmError`: Failures of a single completion call

use crate::backend::LlmProvider;
use std::fmt;

/// Errors raised while constructing an LLM backend.
///
/// These are fatal: a process that cannot build its backend should not start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The configured provider name is not one we know.
    UnknownProvider { name: String },
    /// The selected provider has no API key configured.
    MissingCredential { provider: LlmProvider },
    /// The HTTP client could not be built.
    HttpClient { reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownProvider { name } => {
                write!(
                    f,
                    "unsupported LLM provider '{name}' (supported: openai, gemini, kimi)"
                )
            }
            Self::MissingCredential { provider } => {
                write!(
                    f,
                    "an API key is required for the {provider} provider (llm.{provider}.api_key)"
                )
            }
            Self::HttpClient { reason } => {
                write!(f, "failed to build HTTP client: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors from a single LLM completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// The request never produced an HTTP response.
    RequestFailed { provider: LlmProvider, reason: String },
    /// The provider answered with a non-success status.
    UnexpectedStatus {
        provider: LlmProvider,
        status: u16,
        body: String,
    },
    /// The response envelope could not be decoded.
    ResponseParseFailed { provider: LlmProvider, reason: String },
    /// The provider returned no completion text.
    EmptyCompletion { provider: LlmProvider },
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestFailed { provider, reason } => {
                write!(f, "{provider} request failed: {reason}")
            }
            Self::UnexpectedStatus {
                provider,
                status,
                body,
            } => {
                write!(f, "{provider} returned HTTP {status}: {body}")
            }
            Self::ResponseParseFailed { provider, reason } => {
                write!(f, "failed to decode {provider} response: {reason}")
            }
            Self::EmptyCompletion { provider } => {
                write!(f, "empty completion from {provider}")
            }
        }
    }
}

impl std::error::Error for LlmError {}
