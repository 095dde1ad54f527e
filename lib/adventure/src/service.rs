//! Money adventure service facade.

use crate::error::{EvaluationError, GenerationError};
use crate::evaluator::ChoiceEvaluator;
use crate::generator::{GeneratorConfig, ScenarioGenerator};
use crate::model::{EvaluationRequest, EvaluationResult, GenerationRequest, GenerationResult};
use saverfox_ai::{LlmBackend, TraceSink};
use saverfox_core::Result;
use std::sync::Arc;

/// Generates scenarios and evaluates choices over one shared backend.
pub struct AdventureService {
    generator: ScenarioGenerator,
    evaluator: ChoiceEvaluator,
}

impl AdventureService {
    /// Creates the service. The backend and trace sink are shared by both
    /// operations.
    #[must_use]
    pub fn new(
        backend: Arc<dyn LlmBackend>,
        traces: Arc<dyn TraceSink>,
        config: GeneratorConfig,
    ) -> Self {
        Self {
            generator: ScenarioGenerator::new(Arc::clone(&backend), Arc::clone(&traces), config),
            evaluator: ChoiceEvaluator::new(backend, traces),
        }
    }

    /// Generates a scenario with choices.
    ///
    /// # Errors
    ///
    /// See [`ScenarioGenerator::generate`].
    pub async fn generate_scenario(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, GenerationError> {
        self.generator.generate(request).await
    }

    /// Evaluates a chosen option.
    ///
    /// # Errors
    ///
    /// See [`ChoiceEvaluator::evaluate`].
    pub async fn evaluate_choice(
        &self,
        request: &EvaluationRequest,
    ) -> Result<EvaluationResult, EvaluationError> {
        self.evaluator.evaluate(request).await
    }
}
