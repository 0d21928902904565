//! End-to-end tests of the session state machine against the real JSON
//! file store and a scripted oracle.

use std::sync::Arc;

use async_trait::async_trait;
use calibra_core::config::EngineConfig;
use calibra_core::error::{CalibraError, Result};
use calibra_core::oracle::{
    AnswerContext, GeneratedQuestion, Oracle, OracleSource, QuestionContext, ScoredEvaluation,
};
use calibra_core::session::{
    Evaluation, LevelDirective, QuestionCategory, SessionSettings, Subscores,
};
use calibra_application::SessionUseCase;
use calibra_infrastructure::JsonSessionStore;
use tokio::sync::Mutex;

/// Oracle that returns canned questions and pops scores from a script.
struct ScriptedOracle {
    scores: Mutex<Vec<f64>>,
}

impl ScriptedOracle {
    fn new(scores: Vec<f64>) -> Self {
        Self {
            scores: Mutex::new(scores),
        }
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn generate_question(&self, context: &QuestionContext) -> Result<GeneratedQuestion> {
        Ok(GeneratedQuestion {
            text: format!(
                "Scripted {} question at level {}",
                context.category, context.level
            ),
            category: context.category,
            level: context.level,
            estimated_minutes: 3,
            topics: vec!["scripted".to_string()],
            context: String::new(),
            source: OracleSource::Model,
        })
    }

    async fn evaluate(&self, context: &AnswerContext) -> Result<ScoredEvaluation> {
        let mut scores = self.scores.lock().await;
        let score = scores.remove(0);
        let recommendation = if score >= 80.0 {
            LevelDirective::Increase
        } else if score <= 50.0 {
            LevelDirective::Decrease
        } else {
            LevelDirective::Maintain
        };
        Ok(ScoredEvaluation {
            evaluation: Evaluation {
                overall_score: score,
                subscores: Subscores {
                    correctness: score,
                    depth: score,
                    clarity: score,
                    relevance: score,
                },
                feedback: "scripted".to_string(),
                level_recommendation: recommendation,
                level_adjustment: recommendation.delta(context.level, 1, 5),
                strengths: vec!["precision".to_string()],
                improvements: vec!["breadth".to_string()],
            },
            source: OracleSource::Model,
        })
    }
}

/// Oracle whose every call fails, exercising the fallback path.
struct BrokenOracle;

#[async_trait]
impl Oracle for BrokenOracle {
    async fn generate_question(&self, _context: &QuestionContext) -> Result<GeneratedQuestion> {
        Err(CalibraError::dependency("oracle unavailable"))
    }

    async fn evaluate(&self, _context: &AnswerContext) -> Result<ScoredEvaluation> {
        Err(CalibraError::dependency("oracle unavailable"))
    }
}

fn settings(num_questions: u32, soft_pct: f64) -> SessionSettings {
    SessionSettings {
        job_title: "Software Engineer".to_string(),
        num_questions,
        soft_pct,
        initial_level: 3,
        keywords: vec!["rust".to_string(), "systems".to_string()],
        language: "en".to_string(),
        profile_brief: None,
    }
}

async fn usecase_with(
    dir: &tempfile::TempDir,
    oracle: Arc<dyn Oracle>,
    seed: u64,
) -> SessionUseCase {
    let store = JsonSessionStore::new(dir.path()).await.unwrap();
    SessionUseCase::with_rng_seed(Arc::new(store), oracle, EngineConfig::default(), seed)
}

#[tokio::test]
async fn test_full_session_reaches_summary() {
    let dir = tempfile::tempdir().unwrap();
    let oracle = Arc::new(ScriptedOracle::new(vec![90.0, 85.0, 82.0]));
    let usecase = usecase_with(&dir, oracle, 1).await;

    let created = usecase.create_session(settings(3, 0.0)).await.unwrap();
    assert_eq!(created.num_questions, 3);

    let mut last = None;
    for seq in 1..=3 {
        let question = usecase.next_question(&created.session_id).await.unwrap();
        assert_eq!(question.seq, seq);
        let outcome = usecase
            .submit_answer(&created.session_id, "a reasonably detailed answer")
            .await
            .unwrap();
        last = Some(outcome);
    }

    let outcome = last.unwrap();
    assert!(outcome.is_complete);
    assert_eq!(outcome.questions_remaining, 0);
    let summary = outcome.summary.unwrap();
    // (90 + 85 + 82) / 3 = 85.67
    assert_eq!(summary.overall_score, 85.67);
    assert_eq!(summary.questions_answered, 3);
    assert!(summary.recommendation.contains("Strong candidate"));

    // Fetchable afterwards as well
    let fetched = usecase.get_summary(&created.session_id).await.unwrap();
    assert_eq!(fetched, summary);
}

#[tokio::test]
async fn test_high_scores_raise_level_single_steps() {
    let dir = tempfile::tempdir().unwrap();
    let oracle = Arc::new(ScriptedOracle::new(vec![95.0, 95.0]));
    let usecase = usecase_with(&dir, oracle, 1).await;
    let created = usecase.create_session(settings(2, 0.0)).await.unwrap();

    let q1 = usecase.next_question(&created.session_id).await.unwrap();
    assert_eq!(q1.level, 3);
    let outcome = usecase
        .submit_answer(&created.session_id, "answer")
        .await
        .unwrap();
    assert_eq!(outcome.new_level, 4);

    let q2 = usecase.next_question(&created.session_id).await.unwrap();
    assert_eq!(q2.level, 4);
    let outcome = usecase
        .submit_answer(&created.session_id, "answer")
        .await
        .unwrap();
    assert_eq!(outcome.new_level, 5);
}

#[tokio::test]
async fn test_conflicts_on_out_of_order_operations() {
    let dir = tempfile::tempdir().unwrap();
    let oracle = Arc::new(ScriptedOracle::new(vec![70.0, 70.0]));
    let usecase = usecase_with(&dir, oracle, 1).await;
    let created = usecase.create_session(settings(2, 0.0)).await.unwrap();
    let id = &created.session_id;

    // Answer before any question
    assert!(usecase.submit_answer(id, "early").await.unwrap_err().is_conflict());

    usecase.next_question(id).await.unwrap();
    // Second question while the first is open
    assert!(usecase.next_question(id).await.unwrap_err().is_conflict());

    usecase.submit_answer(id, "answer").await.unwrap();
    // Second answer to the same question
    assert!(usecase.submit_answer(id, "again").await.unwrap_err().is_conflict());

    // Summary before completion
    assert!(usecase.get_summary(id).await.unwrap_err().is_conflict());

    usecase.next_question(id).await.unwrap();
    usecase.submit_answer(id, "answer").await.unwrap();
    // Exhausted session issues no more questions
    assert!(usecase.next_question(id).await.unwrap_err().is_conflict());
}

#[tokio::test]
async fn test_empty_answer_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let oracle = Arc::new(ScriptedOracle::new(vec![70.0]));
    let usecase = usecase_with(&dir, oracle, 1).await;
    let created = usecase.create_session(settings(1, 0.0)).await.unwrap();
    usecase.next_question(&created.session_id).await.unwrap();

    let err = usecase
        .submit_answer(&created.session_id, "   ")
        .await
        .unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn test_broken_oracle_falls_back_and_session_still_completes() {
    let dir = tempfile::tempdir().unwrap();
    let usecase = usecase_with(&dir, Arc::new(BrokenOracle), 1).await;
    let created = usecase.create_session(settings(1, 0.0)).await.unwrap();

    let question = usecase.next_question(&created.session_id).await.unwrap();
    assert_eq!(question.source, OracleSource::Fallback);
    assert!(!question.text.is_empty());

    // A long answer lands in the 70-point heuristic band
    let answer = "word ".repeat(40);
    let outcome = usecase
        .submit_answer(&created.session_id, &answer)
        .await
        .unwrap();
    assert_eq!(outcome.evaluation.overall_score, 70.0);
    assert!(outcome.is_complete);
}

#[tokio::test]
async fn test_category_ratio_converges() {
    let dir = tempfile::tempdir().unwrap();
    let oracle = Arc::new(ScriptedOracle::new(vec![65.0; 10]));
    let usecase = usecase_with(&dir, oracle, 42).await;
    let created = usecase.create_session(settings(10, 0.3)).await.unwrap();

    let mut soft = 0;
    for _ in 0..10 {
        let question = usecase.next_question(&created.session_id).await.unwrap();
        if question.category == QuestionCategory::Soft {
            soft += 1;
        }
        usecase
            .submit_answer(&created.session_id, "answer")
            .await
            .unwrap();
    }
    assert_eq!(soft, 3);
}

#[tokio::test]
async fn test_status_tracks_progress() {
    let dir = tempfile::tempdir().unwrap();
    let oracle = Arc::new(ScriptedOracle::new(vec![75.0]));
    let usecase = usecase_with(&dir, oracle, 1).await;
    let created = usecase.create_session(settings(4, 0.0)).await.unwrap();

    let status = usecase.status(&created.session_id).await.unwrap();
    assert_eq!(status.questions_asked, 0);
    assert_eq!(status.progress_pct, 0.0);
    assert!(!status.has_open_question);

    usecase.next_question(&created.session_id).await.unwrap();
    let status = usecase.status(&created.session_id).await.unwrap();
    assert_eq!(status.questions_asked, 1);
    assert_eq!(status.progress_pct, 25.0);
    assert!(status.has_open_question);

    usecase
        .submit_answer(&created.session_id, "answer")
        .await
        .unwrap();
    let status = usecase.status(&created.session_id).await.unwrap();
    assert_eq!(status.recent_scores, vec![75.0]);
    assert!(!status.has_open_question);
    assert!(!status.is_complete);
}

#[tokio::test]
async fn test_restart_resets_but_keeps_settings() {
    let dir = tempfile::tempdir().unwrap();
    let oracle = Arc::new(ScriptedOracle::new(vec![95.0]));
    let usecase = usecase_with(&dir, oracle, 1).await;
    let created = usecase.create_session(settings(3, 0.0)).await.unwrap();

    usecase.next_question(&created.session_id).await.unwrap();
    usecase
        .submit_answer(&created.session_id, "answer")
        .await
        .unwrap();

    let restarted = usecase.restart_session(&created.session_id).await.unwrap();
    assert_eq!(restarted.session_id, created.session_id);
    assert_eq!(restarted.num_questions, 3);

    let status = usecase.status(&created.session_id).await.unwrap();
    assert_eq!(status.questions_asked, 0);
    assert_eq!(status.current_level, 3);
    assert!(status.recent_scores.is_empty());
}

#[tokio::test]
async fn test_delete_and_missing_session_errors() {
    let dir = tempfile::tempdir().unwrap();
    let oracle = Arc::new(ScriptedOracle::new(vec![]));
    let usecase = usecase_with(&dir, oracle, 1).await;
    let created = usecase.create_session(settings(2, 0.0)).await.unwrap();

    usecase.delete_session(&created.session_id).await.unwrap();
    assert!(usecase.status(&created.session_id).await.unwrap_err().is_not_found());
    assert!(
        usecase
            .delete_session(&created.session_id)
            .await
            .unwrap_err()
            .is_not_found()
    );
    assert!(usecase.next_question("no-such-id").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_state_survives_usecase_restart() {
    let dir = tempfile::tempdir().unwrap();
    let oracle: Arc<dyn Oracle> = Arc::new(ScriptedOracle::new(vec![88.0, 88.0]));
    let usecase = usecase_with(&dir, oracle.clone(), 1).await;
    let created = usecase.create_session(settings(2, 0.0)).await.unwrap();
    usecase.next_question(&created.session_id).await.unwrap();
    usecase
        .submit_answer(&created.session_id, "answer")
        .await
        .unwrap();
    drop(usecase);

    // A fresh use case over the same directory sees the committed state
    let usecase = usecase_with(&dir, oracle, 1).await;
    let status = usecase.status(&created.session_id).await.unwrap();
    assert_eq!(status.questions_asked, 1);
    assert_eq!(status.current_level, 4);
    assert_eq!(status.recent_scores, vec![88.0]);
}

#[tokio::test]
async fn test_list_sessions_excludes_backups() {
    let dir = tempfile::tempdir().unwrap();
    let oracle = Arc::new(ScriptedOracle::new(vec![70.0]));
    let usecase = usecase_with(&dir, oracle, 1).await;

    let a = usecase.create_session(settings(2, 0.0)).await.unwrap();
    let b = usecase.create_session(settings(3, 0.0)).await.unwrap();
    // Overwrite `a` to produce a backup file
    usecase.next_question(&a.session_id).await.unwrap();

    let listed = usecase
        .list_sessions(&Default::default())
        .await
        .unwrap();
    assert_eq!(listed.len(), 2);
    let ids: Vec<_> = listed.iter().map(|m| m.id.as_str()).collect();
    assert!(ids.contains(&a.session_id.as_str()));
    assert!(ids.contains(&b.session_id.as_str()));

    let stats = usecase.store_stats().await.unwrap();
    assert_eq!(stats.session_count, 2);
    assert!(stats.backup_count >= 1);
}
