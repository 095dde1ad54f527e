//! Request and result models for money adventures.
//!
//! Requests validate their ranges at construction, so the generator and
//! evaluator never see an out-of-range age or a non-positive allowance.

use crate::error::RequestError;
use crate::scores::Scores;
use saverfox_core::TraceId;
use serde::Serialize;
use std::collections::BTreeMap;

/// Youngest supported age.
pub const MIN_AGE: u8 = 5;
/// Oldest supported age.
pub const MAX_AGE: u8 = 18;

/// Checks that `age` is within the supported range.
///
/// # Errors
///
/// Returns [`RequestError::AgeOutOfRange`] outside 5–18.
pub fn check_age(age: u8) -> Result<u8, RequestError> {
    if (MIN_AGE..=MAX_AGE).contains(&age) {
        Ok(age)
    } else {
        Err(RequestError::AgeOutOfRange { age })
    }
}

/// Checks that `allowance` is a positive finite amount.
///
/// # Errors
///
/// Returns [`RequestError::InvalidAllowance`] for zero, negative, NaN or
/// infinite amounts.
pub fn check_allowance(allowance: f64) -> Result<f64, RequestError> {
    if allowance.is_finite() && allowance > 0.0 {
        Ok(allowance)
    } else {
        Err(RequestError::InvalidAllowance { allowance })
    }
}

/// Checks that a scenario has visible text.
///
/// # Errors
///
/// Returns [`RequestError::EmptyScenario`] for blank text.
pub fn check_scenario(scenario: &str) -> Result<(), RequestError> {
    if scenario.trim().is_empty() {
        Err(RequestError::EmptyScenario)
    } else {
        Ok(())
    }
}

/// Counts whitespace-separated words.
#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Context for generating one scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    age: u8,
    allowance: f64,
    goal_context: Option<String>,
    recent_activities: Vec<String>,
}

impl GenerationRequest {
    /// Creates a request for a child of `age` with a weekly `allowance`.
    ///
    /// # Errors
    ///
    /// Returns an error if the age is outside 5–18 or the allowance is not a
    /// positive finite amount.
    pub fn new(age: u8, allowance: f64) -> Result<Self, RequestError> {
        Ok(Self {
            age: check_age(age)?,
            allowance: check_allowance(allowance)?,
            goal_context: None,
            recent_activities: Vec::new(),
        })
    }

    /// Sets the savings goal the story should relate to. Blank text is ignored.
    #[must_use]
    pub fn with_goal_context(mut self, goal: impl Into<String>) -> Self {
        let goal = goal.into();
        self.goal_context = (!goal.trim().is_empty()).then_some(goal);
        self
    }

    /// Sets the child's recent activities, most recent first.
    #[must_use]
    pub fn with_recent_activities<I, S>(mut self, activities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.recent_activities = activities.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn age(&self) -> u8 {
        self.age
    }

    /// Weekly allowance in rupiah.
    #[must_use]
    pub fn allowance(&self) -> f64 {
        self.allowance
    }

    /// Weekly allowance spread over seven days.
    #[must_use]
    pub fn daily_allowance(&self) -> f64 {
        self.allowance / 7.0
    }

    #[must_use]
    pub fn goal_context(&self) -> Option<&str> {
        self.goal_context.as_deref()
    }

    #[must_use]
    pub fn recent_activities(&self) -> &[String] {
        &self.recent_activities
    }
}

/// A generated scenario with its choices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationResult {
    /// Trace the generation was recorded under.
    pub trace_id: TraceId,
    /// Story text, never empty.
    pub scenario: String,
    /// At least two choices, in presentation order.
    pub choices: Vec<String>,
    /// Whitespace word count of the scenario.
    pub word_count: usize,
    /// Provider calls made, including the accepted one.
    pub attempts: u32,
    /// Whether the scenario is longer than the target length.
    pub constraint_violation: bool,
}

/// A child's choice to evaluate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationRequest {
    scenario: String,
    choice_index: usize,
    choice_text: String,
    age: u8,
    amounts: BTreeMap<String, f64>,
}

impl EvaluationRequest {
    /// Creates an evaluation request.
    ///
    /// # Errors
    ///
    /// Returns an error if the scenario is blank or the age is outside 5–18.
    pub fn new(
        scenario: impl Into<String>,
        choice_index: usize,
        choice_text: impl Into<String>,
        age: u8,
    ) -> Result<Self, RequestError> {
        let scenario = scenario.into();
        check_scenario(&scenario)?;

        Ok(Self {
            scenario,
            choice_index,
            choice_text: choice_text.into(),
            age: check_age(age)?,
            amounts: BTreeMap::new(),
        })
    }

    /// Sets the named monetary amounts mentioned in the scenario.
    #[must_use]
    pub fn with_amounts(mut self, amounts: BTreeMap<String, f64>) -> Self {
        self.amounts = amounts;
        self
    }

    #[must_use]
    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    #[must_use]
    pub fn choice_index(&self) -> usize {
        self.choice_index
    }

    #[must_use]
    pub fn choice_text(&self) -> &str {
        &self.choice_text
    }

    #[must_use]
    pub fn age(&self) -> u8 {
        self.age
    }

    #[must_use]
    pub fn amounts(&self) -> &BTreeMap<String, f64> {
        &self.amounts
    }
}

/// Feedback and scores for an evaluated choice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    /// Trace the evaluation and its scores were recorded under.
    pub trace_id: TraceId,
    /// Supportive feedback, never empty.
    pub feedback: String,
    pub scores: Scores,
}
