//! HTTP error responses.
//!
//! Every failure leaves the service as an [`ErrorResponse`] JSON body.
//! Domain reports are mapped to a status here, so handlers only decide
//! which kind of failure occurred.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use rootcause::prelude::Report;
use saverfox_adventure::{EvaluationError, GenerationError, RequestError};
use serde::Serialize;

/// One invalid request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<RequestError> for FieldError {
    fn from(err: RequestError) -> Self {
        Self::new(err.field(), err.to_string())
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status_code: u16,
    pub message: String,
    /// Reason phrase of the status, e.g. `Bad Request`.
    pub error: String,
    /// RFC 3339 time the error was produced.
    pub timestamp: String,
    /// Request path that failed.
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<Vec<FieldError>>,
}

/// An error returned from a handler.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    path: String,
    validation_errors: Option<Vec<FieldError>>,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            path: path.into(),
            validation_errors: None,
        }
    }

    /// The request body or its values were invalid.
    pub fn validation(path: impl Into<String>, errors: Vec<FieldError>) -> Self {
        Self {
            validation_errors: Some(errors),
            ..Self::new(StatusCode::BAD_REQUEST, "Validation error", path)
        }
    }

    /// No route matched.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "Resource not found", path)
    }

    /// Maps a failed scenario generation.
    pub fn generation(path: impl Into<String>, report: &Report<GenerationError>) -> Self {
        match report.current_context() {
            GenerationError::Provider { .. } => {
                tracing::error!(error = %report, "LLM provider failed during generation");
                Self::new(StatusCode::BAD_GATEWAY, "LLM provider request failed", path)
            }
            context => {
                tracing::error!(error = %context, "Validation error during generation");
                Self::new(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    format!("Failed to generate valid scenario: {context}"),
                    path,
                )
            }
        }
    }

    /// Maps a failed choice evaluation.
    pub fn evaluation(path: impl Into<String>, report: &Report<EvaluationError>) -> Self {
        match report.current_context() {
            EvaluationError::Provider => {
                tracing::error!(error = %report, "LLM provider failed during evaluation");
                Self::new(StatusCode::BAD_GATEWAY, "LLM provider request failed", path)
            }
            context => {
                tracing::error!(error = %context, "Validation error during evaluation");
                Self::new(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    format!("Failed to evaluate choice: {context}"),
                    path,
                )
            }
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            status_code: self.status.as_u16(),
            message: self.message,
            error: self
                .status
                .canonical_reason()
                .unwrap_or("Unknown Error")
                .to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            path: self.path,
            validation_errors: self.validation_errors,
        };

        (self.status, Json(body)).into_response()
    }
}
