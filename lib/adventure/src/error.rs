//! Error types for the adventure crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `RequestError`: Caller-supplied input outside the accepted ranges
//! - `ScoreError`: A score dimension that is missing a valid value
//! - `GenerationError`: Scenario generation failures
//! - `EvaluationError`: Choice evaluation failures
//!
//! Provider failures arrive as `Report<LlmError>` and are re-contextualized
//! as the `Provider` variant of the operation error.

use crate::scores::ScoreDimension;
use std::fmt;

/// Invalid request input.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestError {
    /// Age outside 5–18.
    AgeOutOfRange { age: u8 },
    /// Allowance not a positive finite amount.
    InvalidAllowance { allowance: f64 },
    /// Scenario text is blank.
    EmptyScenario,
}

impl RequestError {
    /// The request field the error refers to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::AgeOutOfRange { .. } => "user_age",
            Self::InvalidAllowance { .. } => "allowance",
            Self::EmptyScenario => "scenario",
        }
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AgeOutOfRange { age } => {
                write!(f, "age must be between 5 and 18, got {age}")
            }
            Self::InvalidAllowance { allowance } => {
                write!(f, "allowance must be greater than 0, got {allowance}")
            }
            Self::EmptyScenario => write!(f, "scenario must not be empty"),
        }
    }
}

impl std::error::Error for RequestError {}

/// Invalid score value.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreError {
    /// Value outside `[0.0, 1.0]`.
    OutOfRange { dimension: ScoreDimension, value: f64 },
    /// Value present but not convertible to a number.
    NotNumeric { dimension: ScoreDimension, raw: String },
}

impl fmt::Display for ScoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { dimension, value } => {
                write!(f, "score '{dimension}' must be between 0 and 1, got {value}")
            }
            Self::NotNumeric { dimension, raw } => {
                write!(f, "score '{dimension}' is not a number: {raw}")
            }
        }
    }
}

impl std::error::Error for ScoreError {}

/// Scenario generation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// The provider call failed on the given attempt.
    Provider { attempt: u32 },
    /// No attempt produced parseable JSON.
    Extraction { attempts: u32 },
    /// The model's JSON lacked a usable scenario or choice list.
    Structural { reason: String },
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provider { attempt } => {
                write!(f, "LLM provider failed on attempt {attempt}")
            }
            Self::Extraction { attempts } => {
                write!(f, "no valid JSON in LLM response after {attempts} attempt(s)")
            }
            Self::Structural { reason } => {
                write!(f, "invalid scenario response: {reason}")
            }
        }
    }
}

impl std::error::Error for GenerationError {}

/// Choice evaluation failures.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationError {
    /// The provider call failed.
    Provider,
    /// The response held no parseable JSON.
    Extraction,
    /// A required field was absent or empty.
    Structural { reason: String },
    /// A score was non-numeric or out of range.
    InvalidScore(ScoreError),
}

impl fmt::Display for EvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provider => write!(f, "LLM provider failed during evaluation"),
            Self::Extraction => write!(f, "no valid JSON in LLM evaluation response"),
            Self::Structural { reason } => {
                write!(f, "invalid evaluation response: {reason}")
            }
            Self::InvalidScore(err) => write!(f, "invalid scores in response: {err}"),
        }
    }
}

impl std::error::Error for EvaluationError {}

impl From<ScoreError> for EvaluationError {
    fn from(err: ScoreError) -> Self {
        Self::InvalidScore(err)
    }
}
