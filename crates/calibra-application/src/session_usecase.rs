//! The session state machine: orchestration of store, oracle, and
//! leveling.
//!
//! Every operation loads the aggregate, applies the transition in memory,
//! and persists once at the end. A crash mid-operation therefore leaves
//! the previously committed document intact. Oracle failures never fail a
//! transition: they are absorbed with deterministic local fallbacks and
//! marked as such on the produced question or evaluation.

use std::sync::Arc;

use calibra_core::config::EngineConfig;
use calibra_core::error::{CalibraError, Result};
use calibra_core::leveling::update_level;
use calibra_core::oracle::{AnswerContext, Oracle, QuestionContext};
use calibra_core::session::{
    ListOptions, QuestionRecord, Session, SessionMetadata, SessionRepository, SessionSettings,
    StoreStats, Summary,
};
use calibra_interaction::fallback;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::category::choose_category;
use crate::finalize::build_summary;
use crate::views::{AnswerOutcome, QuestionView, SessionCreated, StatusView};

/// Use case facade over one session store and one oracle.
pub struct SessionUseCase {
    repository: Arc<dyn SessionRepository>,
    oracle: Arc<dyn Oracle>,
    config: EngineConfig,
    rng: Mutex<StdRng>,
}

impl SessionUseCase {
    pub fn new(
        repository: Arc<dyn SessionRepository>,
        oracle: Arc<dyn Oracle>,
        config: EngineConfig,
    ) -> Self {
        Self {
            repository,
            oracle,
            config,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Like [`SessionUseCase::new`] but with a seeded generator, making
    /// category tie-breaks reproducible.
    pub fn with_rng_seed(
        repository: Arc<dyn SessionRepository>,
        oracle: Arc<dyn Oracle>,
        config: EngineConfig,
        seed: u64,
    ) -> Self {
        Self {
            repository,
            oracle,
            config,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Validates settings, creates the session, and persists it.
    pub async fn create_session(&self, settings: SessionSettings) -> Result<SessionCreated> {
        settings.validate(&self.config)?;
        let session = Session::new(settings);
        self.repository.save(&session).await?;
        info!(
            session_id = %session.id,
            job_title = %session.settings.job_title,
            num_questions = session.settings.num_questions,
            "session created"
        );
        Ok(SessionCreated::from_session(&session))
    }

    /// Issues the next question.
    ///
    /// Conflict when the session is complete, exhausted, or still has an
    /// unanswered question. Oracle failures fall back to a canned question.
    pub async fn next_question(&self, session_id: &str) -> Result<QuestionView> {
        let mut session = self.load(session_id).await?;
        if session.is_complete() {
            return Err(CalibraError::conflict("session is already complete"));
        }
        if session.is_exhausted() {
            return Err(CalibraError::conflict("all questions have been issued"));
        }
        if session.open_question().is_some() {
            return Err(CalibraError::conflict(
                "previous question has not been answered yet",
            ));
        }

        let category = {
            let mut rng = self.rng.lock().await;
            choose_category(&session.questions, session.settings.soft_pct, &mut *rng)
        };

        let context = QuestionContext {
            job_title: session.settings.job_title.clone(),
            level: session.state.current_level,
            keywords: session.settings.keywords.clone(),
            category,
            language: session.settings.language.clone(),
            previous_questions: session.questions.iter().map(|q| q.text.clone()).collect(),
        };

        let generated = match self.oracle.generate_question(&context).await {
            Ok(generated) => generated,
            Err(e) => {
                warn!(session_id = %session.id, error = %e, "question generation failed, using fallback");
                fallback::canned_question(&context)
            }
        };

        let record = QuestionRecord {
            seq: session.state.asked_count + 1,
            text: generated.text,
            category: generated.category,
            level: generated.level,
            topics: generated.topics,
            estimated_minutes: generated.estimated_minutes,
            context: generated.context,
            candidate_answer: None,
            evaluation: None,
        };
        session.append_question(record)?;
        self.repository.save(&session).await?;

        let question = session.questions.last().ok_or_else(|| {
            CalibraError::internal("question list empty after append")
        })?;
        Ok(QuestionView {
            session_id: session.id.clone(),
            seq: question.seq,
            total_questions: session.settings.num_questions,
            text: question.text.clone(),
            category: question.category,
            level: question.level,
            topics: question.topics.clone(),
            estimated_minutes: question.estimated_minutes,
            context: question.context.clone(),
            source: generated.source,
        })
    }

    /// Records an answer, evaluates it, applies the leveling rule, and
    /// finalizes the session when this was the last question.
    ///
    /// All of that is committed with a single save, so a crash anywhere in
    /// between leaves the question unanswered on disk.
    pub async fn submit_answer(&self, session_id: &str, answer: &str) -> Result<AnswerOutcome> {
        if answer.trim().is_empty() {
            return Err(CalibraError::validation("answer must not be empty"));
        }
        let mut session = self.load(session_id).await?;
        let open = session
            .open_question()
            .ok_or_else(|| CalibraError::conflict("no open question to answer"))?;

        let context = AnswerContext {
            question_text: open.text.clone(),
            category: open.category,
            level: open.level,
            answer_text: answer.to_string(),
            job_title: session.settings.job_title.clone(),
            topics: open.topics.clone(),
        };
        session.attach_answer(answer)?;

        let scored = match self.oracle.evaluate(&context).await {
            Ok(scored) => scored,
            Err(e) => {
                warn!(session_id = %session.id, error = %e, "evaluation failed, using fallback");
                fallback::heuristic_evaluation(&context)
            }
        };
        let evaluation = scored.evaluation.clone();
        session.attach_evaluation(scored.evaluation, self.config.leveling.window_size)?;

        let (new_level, level_reason) = update_level(
            session.state.current_level,
            &session.state.recent_scores,
            &self.config.leveling,
        );
        if new_level != session.state.current_level {
            info!(
                session_id = %session.id,
                from = session.state.current_level,
                to = new_level,
                reason = %level_reason,
                "difficulty level changed"
            );
        }
        session.state.current_level = new_level;

        let mut summary = None;
        if session.is_exhausted() {
            let built = build_summary(&session);
            session.set_summary(built.clone())?;
            summary = Some(built);
            info!(session_id = %session.id, "session finalized");
        }

        self.repository.save(&session).await?;

        Ok(AnswerOutcome {
            session_id: session.id.clone(),
            evaluation,
            new_level,
            level_reason,
            questions_remaining: session.settings.num_questions - session.state.asked_count,
            is_complete: session.is_complete(),
            summary,
        })
    }

    /// The final summary. Conflict while the session is still in progress.
    pub async fn get_summary(&self, session_id: &str) -> Result<Summary> {
        let session = self.load(session_id).await?;
        session
            .summary
            .ok_or_else(|| CalibraError::conflict("session is not complete yet"))
    }

    /// Progress snapshot for one session.
    pub async fn status(&self, session_id: &str) -> Result<StatusView> {
        let session = self.load(session_id).await?;
        Ok(StatusView::from_session(&session))
    }

    /// Enumerates stored sessions.
    pub async fn list_sessions(&self, options: &ListOptions) -> Result<Vec<SessionMetadata>> {
        self.repository.list(options).await
    }

    /// Deletes a session. `NotFound` when it does not exist.
    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        self.repository.delete(session_id).await?;
        info!(%session_id, "session deleted");
        Ok(())
    }

    /// Clears questions, scores, and summary while keeping the settings,
    /// then persists the reset session.
    pub async fn restart_session(&self, session_id: &str) -> Result<SessionCreated> {
        let mut session = self.load(session_id).await?;
        session.reset();
        self.repository.save(&session).await?;
        info!(%session_id, "session restarted");
        Ok(SessionCreated::from_session(&session))
    }

    /// Removes backups past the configured retention.
    pub async fn cleanup_backups(&self) -> Result<usize> {
        let removed = self
            .repository
            .cleanup_backups(self.config.storage.backup_retention_days)
            .await?;
        if removed > 0 {
            info!(removed, "expired backups removed");
        }
        Ok(removed)
    }

    /// Storage usage statistics.
    pub async fn store_stats(&self) -> Result<StoreStats> {
        self.repository.stats().await
    }

    async fn load(&self, session_id: &str) -> Result<Session> {
        self.repository
            .load(session_id)
            .await?
            .ok_or_else(|| CalibraError::not_found(session_id))
    }
}
