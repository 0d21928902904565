//! Read models returned by the use case layer.
//!
//! These are flat, serializable projections of the domain aggregate,
//! shaped for callers (CLI, HTTP handler, test harness) rather than for
//! the state machine.

use calibra_core::oracle::OracleSource;
use calibra_core::session::{Evaluation, QuestionCategory, Session, Summary};
use serde::Serialize;

/// Returned by session creation and restart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionCreated {
    pub session_id: String,
    pub job_title: String,
    pub num_questions: u32,
    pub initial_level: u8,
    pub created_at: String,
}

impl SessionCreated {
    pub fn from_session(session: &Session) -> Self {
        Self {
            session_id: session.id.clone(),
            job_title: session.settings.job_title.clone(),
            num_questions: session.settings.num_questions,
            initial_level: session.settings.initial_level,
            created_at: session.created_at.clone(),
        }
    }
}

/// A question as presented to the candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionView {
    pub session_id: String,
    /// 1-based position within the session
    pub seq: u32,
    pub total_questions: u32,
    pub text: String,
    pub category: QuestionCategory,
    pub level: u8,
    pub topics: Vec<String>,
    pub estimated_minutes: u32,
    pub context: String,
    /// Whether the question came from the model or a local fallback
    pub source: OracleSource,
}

/// Result of submitting an answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerOutcome {
    pub session_id: String,
    pub evaluation: Evaluation,
    /// Difficulty level after applying the leveling rule
    pub new_level: u8,
    /// Why the level did or did not change
    pub level_reason: String,
    pub questions_remaining: u32,
    pub is_complete: bool,
    /// Present only when this answer completed the session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
}

/// Point-in-time progress snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusView {
    pub session_id: String,
    pub job_title: String,
    pub questions_asked: u32,
    pub questions_total: u32,
    /// Asked questions as a percentage of the total
    pub progress_pct: f64,
    pub current_level: u8,
    pub recent_scores: Vec<f64>,
    pub has_open_question: bool,
    pub is_complete: bool,
}

impl StatusView {
    pub fn from_session(session: &Session) -> Self {
        let total = session.settings.num_questions;
        let asked = session.state.asked_count;
        let progress_pct = if total == 0 {
            0.0
        } else {
            (asked as f64 / total as f64 * 1000.0).round() / 10.0
        };
        Self {
            session_id: session.id.clone(),
            job_title: session.settings.job_title.clone(),
            questions_asked: asked,
            questions_total: total,
            progress_pct,
            current_level: session.state.current_level,
            recent_scores: session.state.recent_scores.clone(),
            has_open_question: session.open_question().is_some(),
            is_complete: session.is_complete(),
        }
    }
}
