//! Evaluation scores.
//!
//! A [`Scores`] value can only exist with every dimension inside
//! `[0.0, 1.0]`; construction rejects anything else, including NaN.

use crate::error::ScoreError;
use saverfox_ai::FeedbackScore;
use serde::Serialize;
use std::fmt;

/// One of the three evaluation axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreDimension {
    /// How suitable the decision is for the child's age.
    AgeAppropriateness,
    /// How well the decision serves the child's savings goal.
    GoalAlignment,
    /// Quality of the financial reasoning shown.
    FinancialReasoning,
}

impl ScoreDimension {
    /// All dimensions, in wire order.
    pub const ALL: [Self; 3] = [
        Self::AgeAppropriateness,
        Self::GoalAlignment,
        Self::FinancialReasoning,
    ];

    /// The JSON field name of the dimension.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AgeAppropriateness => "age_appropriateness",
            Self::GoalAlignment => "goal_alignment",
            Self::FinancialReasoning => "financial_reasoning",
        }
    }
}

impl fmt::Display for ScoreDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scores for a child's choice, each in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Scores {
    age_appropriateness: f64,
    goal_alignment: f64,
    financial_reasoning: f64,
}

impl Scores {
    /// Creates scores, validating every dimension.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreError::OutOfRange`] for the first dimension outside
    /// `[0.0, 1.0]`.
    pub fn new(
        age_appropriateness: f64,
        goal_alignment: f64,
        financial_reasoning: f64,
    ) -> Result<Self, ScoreError> {
        Ok(Self {
            age_appropriateness: check(ScoreDimension::AgeAppropriateness, age_appropriateness)?,
            goal_alignment: check(ScoreDimension::GoalAlignment, goal_alignment)?,
            financial_reasoning: check(ScoreDimension::FinancialReasoning, financial_reasoning)?,
        })
    }

    #[must_use]
    pub fn age_appropriateness(&self) -> f64 {
        self.age_appropriateness
    }

    #[must_use]
    pub fn goal_alignment(&self) -> f64 {
        self.goal_alignment
    }

    #[must_use]
    pub fn financial_reasoning(&self) -> f64 {
        self.financial_reasoning
    }

    /// Returns the value of one dimension.
    #[must_use]
    pub fn get(&self, dimension: ScoreDimension) -> f64 {
        match dimension {
            ScoreDimension::AgeAppropriateness => self.age_appropriateness,
            ScoreDimension::GoalAlignment => self.goal_alignment,
            ScoreDimension::FinancialReasoning => self.financial_reasoning,
        }
    }

    /// The scores as trace feedback entries.
    #[must_use]
    pub fn to_feedback(&self) -> Vec<FeedbackScore> {
        ScoreDimension::ALL
            .iter()
            .map(|dimension| FeedbackScore::new(dimension.as_str(), self.get(*dimension)))
            .collect()
    }
}

fn check(dimension: ScoreDimension, value: f64) -> Result<f64, ScoreError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ScoreError::OutOfRange { dimension, value })
    }
}
