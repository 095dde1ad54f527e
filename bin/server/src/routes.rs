//! HTTP routes for health checks and money adventures.

use crate::error::{ApiError, FieldError};
use crate::state::AppState;
use axum::{
    Json, Router,
    extract::{OriginalUri, State, rejection::JsonRejection},
    routing::{get, post},
};
use saverfox_adventure::{
    EvaluationRequest, GenerationRequest, MAX_AGE, MIN_AGE, Scores, check_allowance,
    check_scenario,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Service name reported by the root endpoint.
const SERVICE_NAME: &str = "SaverFox AI Service";

/// Builds the router with the adventure API nested under `api_prefix`.
pub fn router(state: Arc<AppState>, api_prefix: &str) -> Router {
    let api = Router::new()
        .route("/adventure/generate", post(generate_adventure))
        .route("/adventure/evaluate", post(evaluate_choice));

    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(health));

    let prefix = api_prefix.trim_matches('/');
    let app = if prefix.is_empty() {
        app.merge(api)
    } else {
        app.nest(&format!("/{prefix}"), api)
    };

    app.fallback(not_found).with_state(state)
}

async fn root() -> Json<JsonValue> {
    Json(json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "status": "healthy",
    }))
}

async fn health() -> Json<JsonValue> {
    Json(json!({ "status": "healthy" }))
}

async fn not_found(OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::not_found(uri.path())
}

/// Body of a generation request.
#[derive(Debug, Deserialize)]
pub struct GenerateAdventureBody {
    pub user_age: i64,
    pub allowance: f64,
    #[serde(default)]
    pub goal_context: Option<String>,
    #[serde(default)]
    pub recent_activities: Option<Vec<String>>,
}

/// A generated scenario.
#[derive(Debug, Serialize)]
pub struct GenerateAdventureResponse {
    pub scenario: String,
    pub choices: Vec<String>,
    pub opik_trace_id: String,
    pub word_count: usize,
    pub constraint_violation: bool,
}

/// Body of an evaluation request.
#[derive(Debug, Deserialize)]
pub struct EvaluateChoiceBody {
    pub scenario: String,
    pub choice_index: i64,
    pub choice_text: String,
    pub user_age: i64,
    #[serde(default)]
    pub amounts: Option<BTreeMap<String, f64>>,
}

/// Feedback and scores for a choice.
#[derive(Debug, Serialize)]
pub struct EvaluateChoiceResponse {
    pub feedback: String,
    pub scores: Scores,
    pub opik_trace_id: String,
}

fn age_field(age: i64) -> Result<u8, FieldError> {
    u8::try_from(age)
        .ok()
        .filter(|age| (MIN_AGE..=MAX_AGE).contains(age))
        .ok_or_else(|| {
            FieldError::new(
                "user_age",
                format!("age must be between {MIN_AGE} and {MAX_AGE}, got {age}"),
            )
        })
}

fn body_error(path: &str, rejection: &JsonRejection) -> ApiError {
    tracing::debug!(error = %rejection.body_text(), "Rejected request body");
    ApiError::validation(path, vec![FieldError::new("body", rejection.body_text())])
}

async fn generate_adventure(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    body: Result<Json<GenerateAdventureBody>, JsonRejection>,
) -> Result<Json<GenerateAdventureResponse>, ApiError> {
    let path = uri.path();
    let Json(body) = body.map_err(|rejection| body_error(path, &rejection))?;

    let mut errors = Vec::new();
    let age = age_field(body.user_age).map_err(|e| errors.push(e)).ok();
    if let Err(e) = check_allowance(body.allowance) {
        errors.push(e.into());
    }

    let request = match age {
        Some(age) if errors.is_empty() => GenerationRequest::new(age, body.allowance)
            .map_err(|e| errors.push(e.into()))
            .ok(),
        _ => None,
    };
    let Some(request) = request else {
        return Err(ApiError::validation(path, errors));
    };
    let request = match body.goal_context {
        Some(goal) => request.with_goal_context(goal),
        None => request,
    };
    let request = request.with_recent_activities(body.recent_activities.unwrap_or_default());

    let result = state
        .adventures
        .generate_scenario(&request)
        .await
        .map_err(|report| ApiError::generation(path, &report))?;

    Ok(Json(GenerateAdventureResponse {
        scenario: result.scenario,
        choices: result.choices,
        opik_trace_id: result.trace_id.to_string(),
        word_count: result.word_count,
        constraint_violation: result.constraint_violation,
    }))
}

async fn evaluate_choice(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    body: Result<Json<EvaluateChoiceBody>, JsonRejection>,
) -> Result<Json<EvaluateChoiceResponse>, ApiError> {
    let path = uri.path();
    let Json(body) = body.map_err(|rejection| body_error(path, &rejection))?;

    let mut errors: Vec<FieldError> = Vec::new();
    if let Err(e) = check_scenario(&body.scenario) {
        errors.push(e.into());
    }
    let choice_index = usize::try_from(body.choice_index)
        .map_err(|_| {
            errors.push(FieldError::new(
                "choice_index",
                "choice index must be non-negative",
            ));
        })
        .ok();
    let age = age_field(body.user_age).map_err(|e| errors.push(e)).ok();

    let request = match (choice_index, age) {
        (Some(choice_index), Some(age)) if errors.is_empty() => {
            EvaluationRequest::new(body.scenario, choice_index, body.choice_text, age)
                .map_err(|e| errors.push(e.into()))
                .ok()
        }
        _ => None,
    };
    let Some(request) = request else {
        return Err(ApiError::validation(path, errors));
    };
    let request = request.with_amounts(body.amounts.unwrap_or_default());

    let result = state
        .adventures
        .evaluate_choice(&request)
        .await
        .map_err(|report| ApiError::evaluation(path, &report))?;

    Ok(Json(EvaluateChoiceResponse {
        feedback: result.feedback,
        scores: result.scores,
        opik_trace_id: result.trace_id.to_string(),
    }))
}
