//! Money adventure scenarios for children.
//!
//! This crate turns a child's context into a short Indonesian story with
//! choices, and turns a chosen option into supportive feedback with three
//! bounded scores. The LLM is reached through [`saverfox_ai::LlmBackend`];
//! every operation is recorded on a [`saverfox_ai::TraceSink`].

pub mod error;
pub mod evaluator;
pub mod generator;
pub mod model;
pub mod prompt;
pub mod scores;
pub mod service;

pub use error::{EvaluationError, GenerationError, RequestError, ScoreError};
pub use evaluator::{ChoiceEvaluator, EVALUATE_OPERATION};
pub use generator::{GENERATE_OPERATION, GeneratorConfig, ScenarioGenerator};
pub use model::{
    EvaluationRequest, EvaluationResult, GenerationRequest, GenerationResult, MAX_AGE, MIN_AGE,
    check_age, check_allowance, check_scenario, word_count,
};
pub use scores::{ScoreDimension, Scores};
pub use service::AdventureService;
