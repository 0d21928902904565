//! Session domain model.
//!
//! The `Session` aggregate and its child records. All state transitions go
//! through methods on `Session` so the structural invariants (one open
//! question, append-only question list, bounded score window, write-once
//! summary) are enforced in one place.

use crate::error::{CalibraError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Question category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionCategory {
    Technical,
    Soft,
}

impl fmt::Display for QuestionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionCategory::Technical => write!(f, "technical"),
            QuestionCategory::Soft => write!(f, "soft"),
        }
    }
}

/// Directive produced by an evaluation about the difficulty level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelDirective {
    Increase,
    Maintain,
    Decrease,
}

impl LevelDirective {
    /// Numeric delta implied by the directive, clamped so the level never
    /// leaves `[min_level, max_level]`.
    pub fn delta(&self, current_level: u8, min_level: u8, max_level: u8) -> i8 {
        match self {
            LevelDirective::Increase if current_level < max_level => 1,
            LevelDirective::Decrease if current_level > min_level => -1,
            _ => 0,
        }
    }
}

/// Immutable configuration captured when a session is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Target job title or assessment subject
    pub job_title: String,
    /// Total number of questions to ask
    pub num_questions: u32,
    /// Desired ratio of soft-skill questions (0.0-1.0)
    pub soft_pct: f64,
    /// Starting difficulty level (1-5)
    pub initial_level: u8,
    /// Topic keywords for question generation (non-empty)
    pub keywords: Vec<String>,
    /// Language tag (e.g. "en")
    pub language: String,
    /// Optional free-text profile of the subject
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_brief: Option<String>,
}

impl SessionSettings {
    /// Validates settings against the engine's configured bounds.
    ///
    /// Called before a session is created; nothing is persisted when this
    /// fails.
    pub fn validate(&self, config: &crate::config::EngineConfig) -> Result<()> {
        if self.job_title.trim().is_empty() {
            return Err(CalibraError::validation("job_title must not be empty"));
        }
        if self.num_questions < config.limits.min_questions
            || self.num_questions > config.limits.max_questions
        {
            return Err(CalibraError::validation(format!(
                "num_questions must be between {} and {}",
                config.limits.min_questions, config.limits.max_questions
            )));
        }
        if !(0.0..=1.0).contains(&self.soft_pct) {
            return Err(CalibraError::validation("soft_pct must be between 0.0 and 1.0"));
        }
        if self.initial_level < config.leveling.min_level
            || self.initial_level > config.leveling.max_level
        {
            return Err(CalibraError::validation(format!(
                "initial_level must be between {} and {}",
                config.leveling.min_level, config.leveling.max_level
            )));
        }
        if self.keywords.is_empty() || self.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(CalibraError::validation("keywords must not be empty"));
        }
        if self.language.trim().is_empty() {
            return Err(CalibraError::validation("language must not be empty"));
        }
        Ok(())
    }
}

/// Mutable per-session state driven by the leveling algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Current difficulty level (1-5)
    pub current_level: u8,
    /// Number of questions issued so far
    pub asked_count: u32,
    /// Rolling window of the most recent overall scores, oldest first
    #[serde(default)]
    pub recent_scores: Vec<f64>,
}

impl SessionState {
    /// Appends a score, evicting the oldest entry once the window is full.
    pub fn push_score(&mut self, score: f64, window_size: usize) {
        self.recent_scores.push(score);
        if self.recent_scores.len() > window_size {
            let excess = self.recent_scores.len() - window_size;
            self.recent_scores.drain(..excess);
        }
    }
}

/// Sub-scores for one evaluated answer (0-100 each).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscores {
    pub correctness: f64,
    pub depth: f64,
    pub clarity: f64,
    pub relevance: f64,
}

/// Evaluation of a candidate answer. Immutable once attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Overall score (0-100)
    pub overall_score: f64,
    pub subscores: Subscores,
    /// Free-text feedback
    pub feedback: String,
    pub level_recommendation: LevelDirective,
    /// Numeric delta implied by the recommendation (-1, 0, +1)
    pub level_adjustment: i8,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
}

/// One issued question and, once available, its answer and evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// 1-based sequence number, equal to its position in the list
    pub seq: u32,
    pub text: String,
    pub category: QuestionCategory,
    /// Difficulty level at time of issuance
    pub level: u8,
    #[serde(default)]
    pub topics: Vec<String>,
    /// Rough time budget in minutes
    #[serde(default)]
    pub estimated_minutes: u32,
    /// Optional hint or framing shown alongside the question
    #[serde(default)]
    pub context: String,
    /// Candidate answer, set at most once
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_answer: Option<String>,
    /// Evaluation, set at most once, only after an answer exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<Evaluation>,
}

impl QuestionRecord {
    /// A question is open until it has both an answer and an evaluation.
    pub fn is_open(&self) -> bool {
        self.candidate_answer.is_none() || self.evaluation.is_none()
    }
}

/// Final summary, present iff the session is complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Simple mean of all evaluated overall scores
    pub overall_score: f64,
    /// Mean over technical questions (0.0 if none)
    pub technical_score: f64,
    /// Mean over soft-skill questions (0.0 if none)
    pub soft_skills_score: f64,
    pub final_level: u8,
    pub questions_answered: u32,
    /// Top 3 strengths by frequency across all evaluations
    pub strengths: Vec<String>,
    /// Top 3 improvement areas by frequency
    pub improvements: Vec<String>,
    pub recommendation: String,
    /// RFC 3339 completion timestamp
    pub completed_at: String,
}

/// An adaptive assessment session: the aggregate root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier (UUID format)
    pub id: String,
    /// Timestamp when the session was created (RFC 3339)
    pub created_at: String,
    /// Timestamp when the session was last updated (RFC 3339)
    pub updated_at: String,
    pub settings: SessionSettings,
    pub state: SessionState,
    /// Append-only list of issued questions; length == state.asked_count
    #[serde(default)]
    pub questions: Vec<QuestionRecord>,
    /// Set exactly once, when the final answer has been evaluated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
}

impl Session {
    /// Creates a new session from validated settings.
    pub fn new(settings: SessionSettings) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        let initial_level = settings.initial_level;
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now.clone(),
            updated_at: now,
            settings,
            state: SessionState {
                current_level: initial_level,
                asked_count: 0,
                recent_scores: Vec::new(),
            },
            questions: Vec::new(),
            summary: None,
        }
    }

    /// Whether the session has been finalized.
    pub fn is_complete(&self) -> bool {
        self.summary.is_some()
    }

    /// Whether all questions have been issued.
    pub fn is_exhausted(&self) -> bool {
        self.state.asked_count >= self.settings.num_questions
    }

    /// The most recently issued question if it still lacks an answer or
    /// an evaluation. Only the last question can ever be open.
    pub fn open_question(&self) -> Option<&QuestionRecord> {
        self.questions.last().filter(|q| q.is_open())
    }

    /// Fraction of issued questions that are soft-skill questions.
    pub fn soft_ratio(&self) -> f64 {
        if self.questions.is_empty() {
            return 0.0;
        }
        let soft = self
            .questions
            .iter()
            .filter(|q| q.category == QuestionCategory::Soft)
            .count();
        soft as f64 / self.questions.len() as f64
    }

    /// Appends a newly issued question and advances `asked_count`.
    ///
    /// Rejected with a conflict if the session is complete or exhausted,
    /// or if the previous question is still open.
    pub fn append_question(&mut self, question: QuestionRecord) -> Result<()> {
        if self.is_complete() {
            return Err(CalibraError::conflict("session is already complete"));
        }
        if self.is_exhausted() {
            return Err(CalibraError::conflict("all questions have been issued"));
        }
        if self.open_question().is_some() {
            return Err(CalibraError::conflict(
                "previous question has not been answered yet",
            ));
        }
        let expected_seq = self.state.asked_count + 1;
        if question.seq != expected_seq {
            return Err(CalibraError::internal(format!(
                "question sequence {} does not match expected {}",
                question.seq, expected_seq
            )));
        }
        self.questions.push(question);
        self.state.asked_count = self.questions.len() as u32;
        self.touch();
        Ok(())
    }

    /// Attaches the candidate's answer to the open question.
    pub fn attach_answer(&mut self, answer: impl Into<String>) -> Result<()> {
        if self.is_complete() {
            return Err(CalibraError::conflict("session is already complete"));
        }
        let last = self
            .questions
            .last_mut()
            .ok_or_else(|| CalibraError::conflict("no question has been issued"))?;
        if last.candidate_answer.is_some() {
            return Err(CalibraError::conflict("question has already been answered"));
        }
        last.candidate_answer = Some(answer.into());
        self.touch();
        Ok(())
    }

    /// Attaches the evaluation to the answered question and records the
    /// overall score in the rolling window.
    pub fn attach_evaluation(&mut self, evaluation: Evaluation, window_size: usize) -> Result<()> {
        let last = self
            .questions
            .last_mut()
            .ok_or_else(|| CalibraError::conflict("no question has been issued"))?;
        if last.candidate_answer.is_none() {
            return Err(CalibraError::conflict("question has no answer to evaluate"));
        }
        if last.evaluation.is_some() {
            return Err(CalibraError::conflict("question has already been evaluated"));
        }
        let score = evaluation.overall_score;
        last.evaluation = Some(evaluation);
        self.state.push_score(score, window_size);
        self.touch();
        Ok(())
    }

    /// Records the final summary. Write-once.
    pub fn set_summary(&mut self, summary: Summary) -> Result<()> {
        if self.summary.is_some() {
            return Err(CalibraError::conflict("summary has already been set"));
        }
        self.summary = Some(summary);
        self.touch();
        Ok(())
    }

    /// Restart semantics: clears questions, summary, and mutable state,
    /// preserving the original settings.
    pub fn reset(&mut self) {
        self.questions.clear();
        self.summary = None;
        self.state = SessionState {
            current_level: self.settings.initial_level,
            asked_count: 0,
            recent_scores: Vec::new(),
        };
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}
