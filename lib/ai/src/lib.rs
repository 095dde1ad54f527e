//! AI primitives for the SaverFox AI service.
//!
//! This crate provides:
//!
//! - **Backends**: one completion capability over OpenAI, Gemini and Kimi,
//!   selected once at startup from [`LlmConfig`]
//! - **Extraction**: tolerant recovery of JSON from free-form model output
//! - **Tracing**: sinks that receive operation traces and feedback scores

pub mod backend;
pub mod config;
pub mod error;
pub mod extract;
pub mod gemini;
mod http;
pub mod openai;
#[cfg(any(test, feature = "test-util"))]
pub mod stub;
pub mod trace;

pub use backend::{LlmBackend, LlmProvider, LlmRequest, LlmResponse, TokenUsage, build_backend};
pub use config::{LlmConfig, ProviderSettings};
pub use error::{ConfigError, LlmError};
pub use extract::extract_json;
#[cfg(any(test, feature = "test-util"))]
pub use stub::StubBackend;
#[cfg(any(test, feature = "test-util"))]
pub use trace::MemoryTraceSink;
pub use trace::{
    FeedbackScore, LogTraceSink, NoopTraceSink, TraceConfig, TraceOutcome, TraceRecord,
    TraceSink, build_trace_sink,
};
