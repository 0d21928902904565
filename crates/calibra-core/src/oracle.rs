//! Oracle contract.
//!
//! The oracle is an external text-generation service that produces
//! questions and evaluates answers. The engine only consumes this
//! contract; prompt construction and response parsing live with the
//! implementation. Errors from an oracle are dependency failures: the
//! session manager absorbs them with a deterministic local fallback and
//! never surfaces them to the caller.

use crate::error::Result;
use crate::session::{Evaluation, QuestionCategory};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Where an oracle result came from.
///
/// `Fallback` marks a deterministic locally computed default, used when
/// the service was unreachable or its response could not be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleSource {
    Model,
    Fallback,
}

/// Inputs for question generation.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionContext {
    pub job_title: String,
    /// Difficulty level (1-5)
    pub level: u8,
    pub keywords: Vec<String>,
    pub category: QuestionCategory,
    pub language: String,
    /// Recently asked question texts, newest last, to reduce repetition
    pub previous_questions: Vec<String>,
}

/// A generated question with provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedQuestion {
    pub text: String,
    pub category: QuestionCategory,
    pub level: u8,
    pub estimated_minutes: u32,
    pub topics: Vec<String>,
    pub context: String,
    pub source: OracleSource,
}

/// Inputs for answer evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerContext {
    pub question_text: String,
    pub category: QuestionCategory,
    /// Difficulty level of the question (1-5)
    pub level: u8,
    pub answer_text: String,
    pub job_title: String,
    pub topics: Vec<String>,
}

/// An evaluation with provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredEvaluation {
    pub evaluation: Evaluation,
    pub source: OracleSource,
}

/// External question/answer oracle.
///
/// Implementations may block on network I/O and must bound each call
/// with the configured timeout. A returned error means the dependency
/// failed; implementations must not panic.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Generates the next question for the given context.
    async fn generate_question(&self, context: &QuestionContext) -> Result<GeneratedQuestion>;

    /// Evaluates a candidate answer.
    async fn evaluate(&self, context: &AnswerContext) -> Result<ScoredEvaluation>;
}
