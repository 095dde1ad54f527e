//! Scenario generation.
//!
//! [`ScenarioGenerator::generate`] drives a bounded generate-validate-retry
//! loop against the configured backend:
//!
//! - unparseable output is retried with a JSON-only notice appended
//! - a scenario over `max_words` is retried with a length notice appended
//! - a missing scenario or fewer than two choices fails immediately
//!
//! Amendments are always applied to the base prompt, so a second retry
//! never carries the first retry's notice. When the budget runs out on an
//! over-long scenario, the last scenario is accepted and flagged. A retry
//! that yields nothing usable falls back to the earlier over-long scenario.

use crate::error::GenerationError;
use crate::model::{GenerationRequest, GenerationResult, word_count};
use crate::prompt;
use rootcause::prelude::{Report, ResultExt};
use saverfox_ai::{LlmBackend, LlmRequest, TokenUsage, TraceRecord, TraceSink, extract_json};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use tracing::instrument;

/// Trace name of a generation.
pub const GENERATE_OPERATION: &str = "saverfox.money_adventure.generate";

/// Fewest choices a scenario may offer.
pub const MIN_CHOICES: usize = 2;

/// Retry and length limits for scenario generation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeneratorConfig {
    /// Provider calls allowed per generation, at least 1.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Desired scenario length; longer scenarios are flagged.
    #[serde(default = "default_target_words")]
    pub target_words: usize,
    /// Length beyond which a scenario is regenerated.
    #[serde(default = "default_max_words")]
    pub max_words: usize,
}

fn default_max_attempts() -> u32 {
    2
}

fn default_target_words() -> usize {
    60
}

fn default_max_words() -> usize {
    70
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            target_words: default_target_words(),
            max_words: default_max_words(),
        }
    }
}

impl GeneratorConfig {
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }
}

/// Generates money adventure scenarios.
pub struct ScenarioGenerator {
    backend: Arc<dyn LlmBackend>,
    traces: Arc<dyn TraceSink>,
    config: GeneratorConfig,
}

impl ScenarioGenerator {
    /// Creates a generator.
    #[must_use]
    pub fn new(
        backend: Arc<dyn LlmBackend>,
        traces: Arc<dyn TraceSink>,
        config: GeneratorConfig,
    ) -> Self {
        tracing::info!(
            provider = %backend.provider(),
            model = %backend.model(),
            max_attempts = config.max_attempts,
            "Scenario generator initialized"
        );
        Self {
            backend,
            traces,
            config,
        }
    }

    /// Generates a scenario and its choices for the given child.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails, or no attempt yields JSON
    /// with a scenario and at least two choices.
    #[instrument(skip_all, fields(age = request.age(), provider = %self.backend.provider()))]
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, Report<GenerationError>> {
        tracing::info!(
            daily_allowance = request.daily_allowance(),
            has_goal = request.goal_context().is_some(),
            "Generating scenario"
        );

        let mut trace = TraceRecord::start(GENERATE_OPERATION, &["generation", "indonesian"])
            .with_input(json!({
                "user_age": request.age(),
                "allowance": request.allowance(),
                "goal_context": request.goal_context(),
                "recent_activities": request.recent_activities(),
            }));
        trace.insert_metadata("user_age", request.age());
        trace.insert_metadata("allowance_daily", request.daily_allowance());
        trace.insert_metadata("provider", self.backend.provider().as_str());
        trace.insert_metadata("model", self.backend.model());

        let outcome = self.run(request, &mut trace).await;

        match &outcome {
            Ok(result) => {
                trace.succeed(json!({
                    "scenario": result.scenario,
                    "choices": result.choices,
                }));
                tracing::info!(
                    trace_id = %result.trace_id,
                    choices = result.choices.len(),
                    word_count = result.word_count,
                    attempts = result.attempts,
                    constraint_violation = result.constraint_violation,
                    "Scenario generated"
                );
            }
            Err(report) => {
                let error = report.current_context().to_string();
                tracing::error!(trace_id = %trace.id, error = %error, "Scenario generation failed");
                trace.fail(error);
            }
        }
        self.traces.record(&trace);

        outcome
    }

    async fn run(
        &self,
        request: &GenerationRequest,
        trace: &mut TraceRecord,
    ) -> Result<GenerationResult, Report<GenerationError>> {
        let target_words = self.config.target_words;
        let max_attempts = self.config.max_attempts.max(1);
        let system = prompt::scenario_system_prompt(target_words);
        let base_prompt = prompt::scenario_prompt(request, target_words);

        let mut user_prompt = base_prompt.clone();
        let mut usage = TokenUsage::default();
        let mut attempt = 0;
        // Last well-formed scenario that was rejected only for its length.
        let mut too_long: Option<(String, Vec<String>)> = None;

        loop {
            attempt += 1;
            trace.insert_metadata("attempts", attempt);

            let response = self
                .backend
                .generate_completion(&LlmRequest::new(system.as_str(), user_prompt.as_str()))
                .await
                .context(GenerationError::Provider { attempt })?;

            usage.input_tokens += response.usage.input_tokens;
            usage.output_tokens += response.usage.output_tokens;
            trace.insert_metadata("model", response.model.as_str());
            trace.insert_metadata("input_tokens", usage.input_tokens);
            trace.insert_metadata("output_tokens", usage.output_tokens);

            let parsed = match extract_json(&response.content) {
                Some(value) => parse_scenario(&value),
                None if attempt < max_attempts => {
                    tracing::warn!(attempt, "Scenario response was not valid JSON, retrying");
                    user_prompt = prompt::with_parse_failure_notice(&base_prompt);
                    continue;
                }
                None => Err(GenerationError::Extraction { attempts: attempt }),
            };

            let (scenario, choices) = match (parsed, too_long.take()) {
                (Ok(parsed), _) => parsed,
                (Err(error), Some(fallback)) => {
                    tracing::warn!(
                        attempt,
                        error = %error,
                        "Retry produced no usable scenario, keeping the earlier long one"
                    );
                    fallback
                }
                (Err(error), None) => {
                    tracing::error!(attempts = attempt, error = %error, "No usable scenario");
                    return Err(error.into());
                }
            };
            let words = word_count(&scenario);

            if words > self.config.max_words {
                if attempt < max_attempts {
                    tracing::warn!(attempt, word_count = words, "Scenario too long, retrying");
                    user_prompt = prompt::with_length_notice(&base_prompt, words, target_words);
                    too_long = Some((scenario, choices));
                    continue;
                }
                tracing::warn!(
                    word_count = words,
                    max_words = self.config.max_words,
                    "Scenario still too long after final attempt, accepting"
                );
            }

            let constraint_violation = words > target_words;
            trace.insert_metadata("num_choices", choices.len());
            trace.insert_metadata("word_count", words);
            trace.insert_metadata("constraint_violation", constraint_violation);

            return Ok(GenerationResult {
                trace_id: trace.id,
                scenario,
                choices,
                word_count: words,
                attempts: attempt,
                constraint_violation,
            });
        }
    }
}

/// Pulls the scenario text and choice list out of the model's JSON.
fn parse_scenario(value: &JsonValue) -> Result<(String, Vec<String>), GenerationError> {
    let structural = |reason: String| GenerationError::Structural { reason };

    let scenario = value
        .get("scenario")
        .and_then(JsonValue::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .ok_or_else(|| structural("missing scenario".to_string()))?;

    let raw_choices = value
        .get("choices")
        .and_then(JsonValue::as_array)
        .ok_or_else(|| structural("missing choices".to_string()))?;

    let choices = raw_choices
        .iter()
        .enumerate()
        .map(|(idx, choice)| {
            choice
                .as_str()
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_string)
                .ok_or_else(|| structural(format!("choice {idx} is not text")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if choices.len() < MIN_CHOICES {
        return Err(structural(format!(
            "expected at least {MIN_CHOICES} choices, got {}",
            choices.len()
        )));
    }

    Ok((scenario.to_string(), choices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use saverfox_ai::{LlmError, LlmProvider, MemoryTraceSink, StubBackend, TraceOutcome};

    fn words(count: usize) -> String {
        vec!["kata"; count].join(" ")
    }

    fn scenario_json(word_total: usize, choices: &[&str]) -> String {
        json!({ "scenario": words(word_total), "choices": choices }).to_string()
    }

    fn generator(stub: &Arc<StubBackend>, sink: &Arc<MemoryTraceSink>) -> ScenarioGenerator {
        ScenarioGenerator::new(stub.clone(), sink.clone(), GeneratorConfig::default())
    }

    fn bicycle_request() -> GenerationRequest {
        GenerationRequest::new(10, 70_000.0)
            .expect("valid request")
            .with_goal_context("sepeda baru")
    }

    #[tokio::test]
    async fn short_scenario_is_accepted_first_time() {
        let stub = Arc::new(StubBackend::with_responses([scenario_json(
            55,
            &["Menabung", "Jajan", "Berbagi"],
        )]));
        let sink = Arc::new(MemoryTraceSink::new());

        let result = generator(&stub, &sink)
            .generate(&bicycle_request())
            .await
            .expect("generation succeeds");

        assert_eq!(result.choices.len(), 3);
        assert_eq!(result.word_count, 55);
        assert!(result.word_count <= 60);
        assert!(!result.constraint_violation);
        assert_eq!(result.attempts, 1);
        assert_eq!(stub.call_count(), 1);

        let prompt = &stub.requests()[0].prompt;
        assert!(prompt.contains("Usia: 10 tahun"));
        assert!(prompt.contains("Rp 10,000"));
        assert!(prompt.contains("sepeda baru"));
    }

    #[tokio::test]
    async fn success_is_traced_with_metadata() {
        let stub = Arc::new(StubBackend::with_responses([scenario_json(20, &["A", "B"])]));
        let sink = Arc::new(MemoryTraceSink::new());

        let result = generator(&stub, &sink)
            .generate(&bicycle_request())
            .await
            .expect("generation succeeds");

        let traces = sink.traces();
        assert_eq!(traces.len(), 1);
        let trace = &traces[0];
        assert_eq!(trace.id, result.trace_id);
        assert_eq!(trace.name, GENERATE_OPERATION);
        assert_eq!(trace.tags, vec!["generation", "indonesian"]);
        assert_eq!(trace.metadata["user_age"], 10);
        assert_eq!(trace.metadata["num_choices"], 2);
        assert_eq!(trace.metadata["word_count"], 20);
        assert_eq!(trace.metadata["constraint_violation"], false);
        assert_eq!(trace.metadata["provider"], "openai");
        assert!(matches!(trace.outcome, TraceOutcome::Succeeded { .. }));
    }

    #[tokio::test]
    async fn long_scenario_retries_once_then_accepts() {
        let stub = Arc::new(StubBackend::with_responses([
            scenario_json(84, &["A", "B", "C"]),
            scenario_json(75, &["A", "B", "C"]),
        ]));
        let sink = Arc::new(MemoryTraceSink::new());

        let result = generator(&stub, &sink)
            .generate(&bicycle_request())
            .await
            .expect("second attempt is accepted regardless of length");

        assert_eq!(stub.call_count(), 2);
        assert_eq!(result.attempts, 2);
        assert_eq!(result.word_count, 75);
        assert!(result.constraint_violation);

        let requests = stub.requests();
        assert!(!requests[0].prompt.contains("84 kata"));
        assert!(requests[1].prompt.contains("84 kata"));
        assert!(requests[1].prompt.starts_with(&requests[0].prompt));
    }

    #[tokio::test]
    async fn scenario_between_target_and_ceiling_is_flagged_without_retry() {
        let stub = Arc::new(StubBackend::with_responses([scenario_json(65, &["A", "B"])]));
        let sink = Arc::new(MemoryTraceSink::new());

        let result = generator(&stub, &sink)
            .generate(&bicycle_request())
            .await
            .expect("generation succeeds");

        assert_eq!(stub.call_count(), 1);
        assert!(result.constraint_violation);
    }

    #[tokio::test]
    async fn unparseable_output_is_retried_with_notice() {
        let stub = Arc::new(StubBackend::with_responses([
            "Maaf, aku lupa formatnya.".to_string(),
            format!(
                "```json\n{}\n```",
                scenario_json(30, &["Menabung", "Jajan"])
            ),
        ]));
        let sink = Arc::new(MemoryTraceSink::new());

        let result = generator(&stub, &sink)
            .generate(&bicycle_request())
            .await
            .expect("second attempt parses");

        assert_eq!(result.attempts, 2);
        assert_eq!(result.choices, vec!["Menabung", "Jajan"]);

        let requests = stub.requests();
        assert!(!requests[0].prompt.contains("PERHATIAN"));
        assert!(requests[1].prompt.contains("JSON yang valid"));
    }

    #[tokio::test]
    async fn extraction_failure_after_budget_is_terminal() {
        let stub = Arc::new(StubBackend::with_responses(["bukan json", "masih bukan json"]));
        let sink = Arc::new(MemoryTraceSink::new());

        let err = generator(&stub, &sink)
            .generate(&bicycle_request())
            .await
            .expect_err("no parseable response");

        assert_eq!(
            *err.current_context(),
            GenerationError::Extraction { attempts: 2 }
        );
        assert_eq!(stub.call_count(), 2);
        assert!(matches!(
            sink.traces()[0].outcome,
            TraceOutcome::Failed { .. }
        ));
    }

    #[tokio::test]
    async fn garbage_retry_falls_back_to_long_scenario() {
        let stub = Arc::new(StubBackend::with_responses([
            scenario_json(85, &["Menabung", "Jajan"]),
            "maaf, bukan json".to_string(),
        ]));
        let sink = Arc::new(MemoryTraceSink::new());

        let result = generator(&stub, &sink)
            .generate(&bicycle_request())
            .await
            .expect("earlier long scenario is kept");

        assert_eq!(stub.call_count(), 2);
        assert_eq!(result.attempts, 2);
        assert_eq!(result.word_count, 85);
        assert_eq!(result.choices, vec!["Menabung", "Jajan"]);
        assert!(result.constraint_violation);

        let trace = &sink.traces()[0];
        assert_eq!(trace.metadata["attempts"], 2);
        assert_eq!(trace.metadata["word_count"], 85);
        assert!(matches!(trace.outcome, TraceOutcome::Succeeded { .. }));
    }

    #[tokio::test]
    async fn malformed_retry_falls_back_to_long_scenario() {
        let stub = Arc::new(StubBackend::with_responses([
            scenario_json(80, &["A", "B"]),
            scenario_json(30, &["Hanya satu"]),
        ]));
        let sink = Arc::new(MemoryTraceSink::new());

        let result = generator(&stub, &sink)
            .generate(&bicycle_request())
            .await
            .expect("earlier long scenario is kept");

        assert_eq!(result.word_count, 80);
        assert_eq!(result.attempts, 2);
        assert!(result.constraint_violation);
    }

    #[tokio::test]
    async fn too_few_choices_fail_without_retry() {
        let stub = Arc::new(StubBackend::with_responses([
            scenario_json(30, &["Hanya satu"]),
            scenario_json(30, &["A", "B"]),
        ]));
        let sink = Arc::new(MemoryTraceSink::new());

        let err = generator(&stub, &sink)
            .generate(&bicycle_request())
            .await
            .expect_err("structural failure");

        assert!(matches!(
            err.current_context(),
            GenerationError::Structural { .. }
        ));
        assert_eq!(stub.call_count(), 1);
    }

    #[tokio::test]
    async fn missing_scenario_is_structural() {
        let stub = Arc::new(StubBackend::with_responses([
            json!({ "choices": ["A", "B"] }).to_string(),
        ]));
        let sink = Arc::new(MemoryTraceSink::new());

        let err = generator(&stub, &sink)
            .generate(&bicycle_request())
            .await
            .expect_err("structural failure");

        assert_eq!(
            *err.current_context(),
            GenerationError::Structural {
                reason: "missing scenario".to_string()
            }
        );
    }

    #[tokio::test]
    async fn provider_failure_is_reported_with_attempt() {
        let stub = Arc::new(StubBackend::new());
        stub.push_error(LlmError::UnexpectedStatus {
            provider: LlmProvider::OpenAi,
            status: 503,
            body: "overloaded".to_string(),
        });
        let sink = Arc::new(MemoryTraceSink::new());

        let err = generator(&stub, &sink)
            .generate(&bicycle_request())
            .await
            .expect_err("provider failure");

        assert_eq!(
            *err.current_context(),
            GenerationError::Provider { attempt: 1 }
        );
        assert_eq!(sink.traces().len(), 1);
    }

    #[tokio::test]
    async fn single_attempt_budget_accepts_long_scenario() {
        let stub = Arc::new(StubBackend::with_responses([scenario_json(90, &["A", "B"])]));
        let sink = Arc::new(MemoryTraceSink::new());
        let config = GeneratorConfig::default().with_max_attempts(0);
        assert_eq!(config.max_attempts, 1);

        let result = ScenarioGenerator::new(stub.clone(), sink, config)
            .generate(&bicycle_request())
            .await
            .expect("accepted");

        assert_eq!(stub.call_count(), 1);
        assert!(result.constraint_violation);
    }

    #[test]
    fn non_text_choices_are_structural() {
        let err = parse_scenario(&json!({ "scenario": "x", "choices": ["A", 3] }))
            .expect_err("numeric choice");
        assert_eq!(
            err,
            GenerationError::Structural {
                reason: "choice 1 is not text".to_string()
            }
        );
    }

    #[test]
    fn config_defaults_deserialize() {
        let config: GeneratorConfig = serde_json::from_value(json!({})).expect("deserialize");
        assert_eq!(config, GeneratorConfig::default());
        assert_eq!(config.max_attempts, 2);
        assert_eq!(config.target_words, 60);
        assert_eq!(config.max_words, 70);
    }
}
