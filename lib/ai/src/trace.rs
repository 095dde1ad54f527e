//! Trace sinks for AI operations.
//!
//! Every generate/evaluate call produces one [`TraceRecord`], and evaluations
//! additionally report their scores as feedback against the same trace id.
//! Sinks are fire-and-forget: they never fail or block the operation that
//! feeds them. When tracing is not configured the [`NoopTraceSink`] is used.

use chrono::{DateTime, Utc};
use saverfox_core::TraceId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;
#[cfg(any(test, feature = "test-util"))]
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

/// Trace sink configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TraceConfig {
    /// Whether trace records are emitted at all.
    #[serde(default)]
    pub enabled: bool,
    /// Project name attached to every emitted record.
    #[serde(default = "default_project_name")]
    pub project_name: String,
}

fn default_project_name() -> String {
    "saverfox-ai".to_string()
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            project_name: default_project_name(),
        }
    }
}

/// One named score logged against a trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackScore {
    /// Score name, e.g. `goal_alignment`.
    pub name: String,
    /// Score value.
    pub value: f64,
}

impl FeedbackScore {
    /// Creates a feedback score.
    #[must_use]
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Outcome of a traced operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TraceOutcome {
    /// The operation is still running.
    Pending,
    /// The operation produced output.
    Succeeded { output: JsonValue },
    /// The operation failed.
    Failed { error: String },
}

/// A record of one traced operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceRecord {
    /// Trace identifier, shared with the caller.
    pub id: TraceId,
    /// Operation name, e.g. `saverfox.money_adventure.generate`.
    pub name: String,
    /// Tags for categorizing the trace.
    pub tags: Vec<String>,
    /// Free-form metadata.
    pub metadata: Map<String, JsonValue>,
    /// Operation input.
    pub input: JsonValue,
    /// Operation outcome.
    pub outcome: TraceOutcome,
    /// When the operation started.
    pub started_at: DateTime<Utc>,
    /// Wall time of the operation in milliseconds.
    pub latency_ms: u64,
    #[serde(skip)]
    clock: Option<Instant>,
}

impl TraceRecord {
    /// Starts a trace record; latency is measured from this call.
    #[must_use]
    pub fn start(name: impl Into<String>, tags: &[&str]) -> Self {
        Self {
            id: TraceId::new(),
            name: name.into(),
            tags: tags.iter().map(|tag| (*tag).to_string()).collect(),
            metadata: Map::new(),
            input: JsonValue::Null,
            outcome: TraceOutcome::Pending,
            started_at: Utc::now(),
            latency_ms: 0,
            clock: Some(Instant::now()),
        }
    }

    /// Sets the operation input.
    #[must_use]
    pub fn with_input(mut self, input: JsonValue) -> Self {
        self.input = input;
        self
    }

    /// Adds a metadata entry.
    pub fn insert_metadata(&mut self, key: impl Into<String>, value: impl Into<JsonValue>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Marks the operation as succeeded.
    pub fn succeed(&mut self, output: JsonValue) {
        self.outcome = TraceOutcome::Succeeded { output };
        self.stop_clock();
    }

    /// Marks the operation as failed.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.outcome = TraceOutcome::Failed {
            error: error.into(),
        };
        self.stop_clock();
    }

    fn stop_clock(&mut self) {
        if let Some(clock) = self.clock.take() {
            self.latency_ms = u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX);
        }
    }
}

/// Destination for trace records and feedback scores.
pub trait TraceSink: Send + Sync {
    /// Records a finished operation.
    fn record(&self, trace: &TraceRecord);

    /// Logs scores against an existing trace.
    fn log_feedback_scores(&self, trace_id: TraceId, scores: &[FeedbackScore]);
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTraceSink;

impl TraceSink for NoopTraceSink {
    fn record(&self, _trace: &TraceRecord) {}

    fn log_feedback_scores(&self, _trace_id: TraceId, _scores: &[FeedbackScore]) {}
}

/// Sink that emits records as structured `tracing` events.
#[derive(Debug, Clone)]
pub struct LogTraceSink {
    project_name: String,
}

impl LogTraceSink {
    /// Creates a log sink for a project.
    #[must_use]
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
        }
    }
}

impl TraceSink for LogTraceSink {
    fn record(&self, trace: &TraceRecord) {
        let tags = trace.tags.join(",");
        let metadata = JsonValue::Object(trace.metadata.clone());
        match &trace.outcome {
            TraceOutcome::Failed { error } => tracing::warn!(
                target: "saverfox::trace",
                project = %self.project_name,
                trace_id = %trace.id,
                operation = %trace.name,
                tags = %tags,
                trace_metadata = %metadata,
                latency_ms = trace.latency_ms,
                error = %error,
                "Operation failed"
            ),
            TraceOutcome::Succeeded { output } => tracing::info!(
                target: "saverfox::trace",
                project = %self.project_name,
                trace_id = %trace.id,
                operation = %trace.name,
                tags = %tags,
                trace_metadata = %metadata,
                latency_ms = trace.latency_ms,
                output = %output,
                "Operation succeeded"
            ),
            TraceOutcome::Pending => tracing::debug!(
                target: "saverfox::trace",
                project = %self.project_name,
                trace_id = %trace.id,
                operation = %trace.name,
                "Operation recorded before completion"
            ),
        }
    }

    fn log_feedback_scores(&self, trace_id: TraceId, scores: &[FeedbackScore]) {
        for score in scores {
            tracing::info!(
                target: "saverfox::trace",
                project = %self.project_name,
                trace_id = %trace_id,
                score_name = %score.name,
                score_value = score.value,
                "Feedback score"
            );
        }
    }
}

/// Sink that keeps everything in memory, for tests.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Default)]
pub struct MemoryTraceSink {
    traces: Mutex<Vec<TraceRecord>>,
    feedback: Mutex<Vec<(TraceId, FeedbackScore)>>,
}

#[cfg(any(test, feature = "test-util"))]
impl MemoryTraceSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded traces.
    #[must_use]
    pub fn traces(&self) -> Vec<TraceRecord> {
        self.traces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the logged feedback scores.
    #[must_use]
    pub fn feedback(&self) -> Vec<(TraceId, FeedbackScore)> {
        self.feedback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(any(test, feature = "test-util"))]
impl TraceSink for MemoryTraceSink {
    fn record(&self, trace: &TraceRecord) {
        self.traces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(trace.clone());
    }

    fn log_feedback_scores(&self, trace_id: TraceId, scores: &[FeedbackScore]) {
        self.feedback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(scores.iter().cloned().map(|score| (trace_id, score)));
    }
}

/// Builds the sink selected by configuration.
#[must_use]
pub fn build_trace_sink(config: &TraceConfig) -> Arc<dyn TraceSink> {
    if config.enabled {
        tracing::info!(project = %config.project_name, "Trace logging enabled");
        Arc::new(LogTraceSink::new(config.project_name.clone()))
    } else {
        tracing::warn!("Trace logging disabled - traces will not be recorded");
        Arc::new(NoopTraceSink)
    }
}
