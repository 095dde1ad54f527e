//! Choice evaluation.
//!
//! Evaluation is single pass: one provider call, one extraction, no retry.
//! Every score dimension must be present and numeric; nothing is defaulted.

use crate::error::{EvaluationError, ScoreError};
use crate::model::{EvaluationRequest, EvaluationResult};
use crate::prompt;
use crate::scores::{ScoreDimension, Scores};
use rootcause::prelude::{Report, ResultExt};
use saverfox_ai::{LlmBackend, LlmRequest, TraceRecord, TraceSink, extract_json};
use serde_json::{Map, Value as JsonValue, json};
use std::sync::Arc;
use tracing::instrument;

/// Trace name of an evaluation.
pub const EVALUATE_OPERATION: &str = "saverfox.money_adventure.evaluate";

/// Evaluates a child's choice with feedback and scores.
pub struct ChoiceEvaluator {
    backend: Arc<dyn LlmBackend>,
    traces: Arc<dyn TraceSink>,
}

impl ChoiceEvaluator {
    /// Creates an evaluator.
    #[must_use]
    pub fn new(backend: Arc<dyn LlmBackend>, traces: Arc<dyn TraceSink>) -> Self {
        tracing::info!(
            provider = %backend.provider(),
            model = %backend.model(),
            "Choice evaluator initialized"
        );
        Self { backend, traces }
    }

    /// Evaluates the chosen option.
    ///
    /// On success the scores are also logged as feedback against the
    /// evaluation's trace.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails, the response holds no JSON,
    /// `feedback` or `scores` are missing, or any score is missing,
    /// non-numeric or outside `[0, 1]`.
    #[instrument(skip_all, fields(age = request.age(), choice_index = request.choice_index()))]
    pub async fn evaluate(
        &self,
        request: &EvaluationRequest,
    ) -> Result<EvaluationResult, Report<EvaluationError>> {
        let preview: String = request.choice_text().chars().take(50).collect();
        tracing::info!(choice = %preview, "Evaluating choice");

        let mut trace = TraceRecord::start(EVALUATE_OPERATION, &["evaluation", "indonesian"])
            .with_input(json!({
                "scenario": request.scenario(),
                "choice_index": request.choice_index(),
                "choice_text": request.choice_text(),
                "user_age": request.age(),
                "amounts": request.amounts(),
            }));
        trace.insert_metadata("user_age", request.age());
        trace.insert_metadata("choice_index", request.choice_index());
        trace.insert_metadata("provider", self.backend.provider().as_str());

        let outcome = self.run(request, &mut trace).await;

        match &outcome {
            Ok(result) => {
                trace.succeed(json!({
                    "feedback": result.feedback,
                    "scores": result.scores,
                }));
                self.traces.record(&trace);
                self.traces
                    .log_feedback_scores(trace.id, &result.scores.to_feedback());
                tracing::info!(
                    trace_id = %result.trace_id,
                    age_appropriateness = result.scores.age_appropriateness(),
                    goal_alignment = result.scores.goal_alignment(),
                    financial_reasoning = result.scores.financial_reasoning(),
                    "Choice evaluated"
                );
            }
            Err(report) => {
                let error = report.current_context().to_string();
                tracing::error!(trace_id = %trace.id, error = %error, "Choice evaluation failed");
                trace.fail(error);
                self.traces.record(&trace);
            }
        }

        outcome
    }

    async fn run(
        &self,
        request: &EvaluationRequest,
        trace: &mut TraceRecord,
    ) -> Result<EvaluationResult, Report<EvaluationError>> {
        let llm_request = LlmRequest::new(
            prompt::EVALUATOR_SYSTEM_PROMPT,
            prompt::evaluation_prompt(request),
        );

        let response = self
            .backend
            .generate_completion(&llm_request)
            .await
            .context(EvaluationError::Provider)?;

        trace.insert_metadata("model", response.model.as_str());
        trace.insert_metadata("input_tokens", response.usage.input_tokens);
        trace.insert_metadata("output_tokens", response.usage.output_tokens);

        let Some(value) = extract_json(&response.content) else {
            return Err(EvaluationError::Extraction.into());
        };

        let (feedback, scores) = parse_evaluation(&value)?;

        Ok(EvaluationResult {
            trace_id: trace.id,
            feedback,
            scores,
        })
    }
}

/// Pulls feedback and validated scores out of the model's JSON.
fn parse_evaluation(value: &JsonValue) -> Result<(String, Scores), EvaluationError> {
    let feedback = value
        .get("feedback")
        .and_then(JsonValue::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .ok_or_else(|| EvaluationError::Structural {
            reason: "missing feedback".to_string(),
        })?;

    let scores = value
        .get("scores")
        .and_then(JsonValue::as_object)
        .filter(|scores| !scores.is_empty())
        .ok_or_else(|| EvaluationError::Structural {
            reason: "missing scores".to_string(),
        })?;

    let scores = Scores::new(
        score(scores, ScoreDimension::AgeAppropriateness)?,
        score(scores, ScoreDimension::GoalAlignment)?,
        score(scores, ScoreDimension::FinancialReasoning)?,
    )?;

    Ok((feedback.to_string(), scores))
}

/// Reads one score, accepting JSON numbers and numeric strings.
fn score(
    scores: &Map<String, JsonValue>,
    dimension: ScoreDimension,
) -> Result<f64, EvaluationError> {
    let raw = scores
        .get(dimension.as_str())
        .ok_or_else(|| EvaluationError::Structural {
            reason: format!("missing score '{dimension}'"),
        })?;

    let value = match raw {
        JsonValue::Number(number) => number.as_f64(),
        JsonValue::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };

    value.ok_or_else(|| {
        ScoreError::NotNumeric {
            dimension,
            raw: raw.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use saverfox_ai::{FeedbackScore, LlmError, MemoryTraceSink, StubBackend, TraceOutcome};
    use std::collections::BTreeMap;

    fn evaluator(stub: &Arc<StubBackend>, sink: &Arc<MemoryTraceSink>) -> ChoiceEvaluator {
        ChoiceEvaluator::new(stub.clone(), sink.clone())
    }

    fn saving_request() -> EvaluationRequest {
        EvaluationRequest::new(
            "Kamu menemukan uang Rp 5.000 di jalan!",
            0,
            "Menabung untuk sepeda",
            10,
        )
        .expect("valid request")
        .with_amounts(BTreeMap::from([("found_money".to_string(), 5000.0)]))
    }

    #[tokio::test]
    async fn valid_evaluation_logs_feedback_scores() {
        let stub = Arc::new(StubBackend::with_responses([json!({
            "feedback": "Pilihan yang bagus! Menabung membuatmu makin dekat ke sepeda.",
            "scores": {
                "age_appropriateness": 0.9,
                "goal_alignment": 0.95,
                "financial_reasoning": 0.85
            }
        })
        .to_string()]));
        let sink = Arc::new(MemoryTraceSink::new());

        let result = evaluator(&stub, &sink)
            .evaluate(&saving_request())
            .await
            .expect("evaluation succeeds");

        assert!(result.feedback.starts_with("Pilihan yang bagus"));
        assert_eq!(result.scores.goal_alignment(), 0.95);
        assert_eq!(stub.call_count(), 1);
        assert!(stub.requests()[0].prompt.contains("found_money: Rp 5,000"));

        let traces = sink.traces();
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].id, result.trace_id);
        assert_eq!(traces[0].name, EVALUATE_OPERATION);
        assert_eq!(traces[0].tags, vec!["evaluation", "indonesian"]);

        let feedback = sink.feedback();
        assert_eq!(feedback.len(), 3);
        assert!(feedback.iter().all(|(id, _)| *id == result.trace_id));
        assert!(feedback.contains(&(
            result.trace_id,
            FeedbackScore::new("financial_reasoning", 0.85)
        )));
    }

    #[tokio::test]
    async fn fenced_response_with_numeric_strings_is_accepted() {
        let stub = Arc::new(StubBackend::with_responses([
            "```json\n{\"feedback\": \"Hebat!\", \"scores\": {\"age_appropriateness\": \"0.8\", \"goal_alignment\": 1, \"financial_reasoning\": 0}}\n```",
        ]));
        let sink = Arc::new(MemoryTraceSink::new());

        let result = evaluator(&stub, &sink)
            .evaluate(&saving_request())
            .await
            .expect("evaluation succeeds");

        assert_eq!(result.scores.age_appropriateness(), 0.8);
        assert_eq!(result.scores.goal_alignment(), 1.0);
        assert_eq!(result.scores.financial_reasoning(), 0.0);
    }

    #[tokio::test]
    async fn missing_dimension_fails_without_default() {
        let stub = Arc::new(StubBackend::with_responses([json!({
            "feedback": "Bagus!",
            "scores": { "age_appropriateness": 0.9, "goal_alignment": 0.8 }
        })
        .to_string()]));
        let sink = Arc::new(MemoryTraceSink::new());

        let err = evaluator(&stub, &sink)
            .evaluate(&saving_request())
            .await
            .expect_err("missing financial_reasoning");

        assert_eq!(
            *err.current_context(),
            EvaluationError::Structural {
                reason: "missing score 'financial_reasoning'".to_string()
            }
        );
        assert_eq!(stub.call_count(), 1);
        assert!(sink.feedback().is_empty());
        assert!(matches!(
            sink.traces()[0].outcome,
            TraceOutcome::Failed { .. }
        ));
    }

    #[tokio::test]
    async fn malformed_json_is_a_terminal_extraction_error() {
        let stub = Arc::new(StubBackend::with_responses([
            "{\"feedback\": \"Bagus\", \"scores\": {",
            "{\"feedback\": \"tidak dipakai\"}",
        ]));
        let sink = Arc::new(MemoryTraceSink::new());

        let err = evaluator(&stub, &sink)
            .evaluate(&saving_request())
            .await
            .expect_err("malformed JSON");

        assert_eq!(*err.current_context(), EvaluationError::Extraction);
        assert_eq!(stub.call_count(), 1);
    }

    #[tokio::test]
    async fn out_of_range_score_is_rejected() {
        let stub = Arc::new(StubBackend::with_responses([json!({
            "feedback": "Bagus!",
            "scores": {
                "age_appropriateness": 0.9,
                "goal_alignment": 1.2,
                "financial_reasoning": 0.5
            }
        })
        .to_string()]));
        let sink = Arc::new(MemoryTraceSink::new());

        let err = evaluator(&stub, &sink)
            .evaluate(&saving_request())
            .await
            .expect_err("score above 1");

        assert_eq!(
            *err.current_context(),
            EvaluationError::InvalidScore(ScoreError::OutOfRange {
                dimension: ScoreDimension::GoalAlignment,
                value: 1.2,
            })
        );
    }

    #[tokio::test]
    async fn provider_failure_is_contextualized() {
        let stub = Arc::new(StubBackend::new());
        stub.push_error(LlmError::RequestFailed {
            provider: saverfox_ai::LlmProvider::OpenAi,
            reason: "connection reset".to_string(),
        });
        let sink = Arc::new(MemoryTraceSink::new());

        let err = evaluator(&stub, &sink)
            .evaluate(&saving_request())
            .await
            .expect_err("provider failure");

        assert_eq!(*err.current_context(), EvaluationError::Provider);
    }

    #[test]
    fn non_numeric_score_is_a_score_error() {
        let err = parse_evaluation(&json!({
            "feedback": "Bagus!",
            "scores": {
                "age_appropriateness": "tinggi",
                "goal_alignment": 0.5,
                "financial_reasoning": 0.5
            }
        }))
        .expect_err("non-numeric");

        assert!(matches!(
            err,
            EvaluationError::InvalidScore(ScoreError::NotNumeric {
                dimension: ScoreDimension::AgeAppropriateness,
                ..
            })
        ));
    }

    #[test]
    fn empty_scores_object_is_structural() {
        let err = parse_evaluation(&json!({ "feedback": "Bagus!", "scores": {} }))
            .expect_err("empty scores");
        assert_eq!(
            err,
            EvaluationError::Structural {
                reason: "missing scores".to_string()
            }
        );
    }

    #[test]
    fn blank_feedback_is_structural() {
        let err = parse_evaluation(&json!({
            "feedback": "  ",
            "scores": { "age_appropriateness": 0.5 }
        }))
        .expect_err("blank feedback");
        assert!(matches!(err, EvaluationError::Structural { .. }));
    }
}
