//! Deterministic local fallbacks for oracle failures.
//!
//! When the oracle is unreachable or its response is unusable, the
//! session must still move forward. The fallbacks here are plain data and
//! pure functions: canned questions keyed by (job, category, level), and
//! a length-heuristic evaluation with fixed bands. No randomness, so the
//! same inputs always produce the same session state.

use calibra_core::config::{MAX_LEVEL, MIN_LEVEL};
use calibra_core::oracle::{
    AnswerContext, GeneratedQuestion, OracleSource, QuestionContext, ScoredEvaluation,
};
use calibra_core::session::{Evaluation, LevelDirective, QuestionCategory, Subscores};

struct CannedQuestion {
    job_key: &'static str,
    category: QuestionCategory,
    level: u8,
    text: &'static str,
}

const CANNED_QUESTIONS: &[CannedQuestion] = &[
    CannedQuestion {
        job_key: "software_engineer",
        category: QuestionCategory::Technical,
        level: 1,
        text: "Explain what a variable is in programming and give an example.",
    },
    CannedQuestion {
        job_key: "software_engineer",
        category: QuestionCategory::Technical,
        level: 2,
        text: "What is the difference between a list and a map, and when would you use each?",
    },
    CannedQuestion {
        job_key: "software_engineer",
        category: QuestionCategory::Technical,
        level: 3,
        text: "How would you implement a function to reverse a string, and what is its complexity?",
    },
    CannedQuestion {
        job_key: "software_engineer",
        category: QuestionCategory::Technical,
        level: 4,
        text: "Design a simple REST API for a todo application, including its error model.",
    },
    CannedQuestion {
        job_key: "software_engineer",
        category: QuestionCategory::Technical,
        level: 5,
        text: "How would you design a distributed system that handles millions of concurrent users?",
    },
    CannedQuestion {
        job_key: "software_engineer",
        category: QuestionCategory::Soft,
        level: 1,
        text: "Tell me about a time you had to learn something new quickly.",
    },
    CannedQuestion {
        job_key: "software_engineer",
        category: QuestionCategory::Soft,
        level: 2,
        text: "How do you handle feedback on your work?",
    },
    CannedQuestion {
        job_key: "software_engineer",
        category: QuestionCategory::Soft,
        level: 3,
        text: "Describe how you would approach a project with unclear requirements.",
    },
    CannedQuestion {
        job_key: "software_engineer",
        category: QuestionCategory::Soft,
        level: 4,
        text: "How do you mentor junior colleagues?",
    },
    CannedQuestion {
        job_key: "software_engineer",
        category: QuestionCategory::Soft,
        level: 5,
        text: "How would you lead a team through a major technical decision?",
    },
];

/// Normalizes a job title into a lookup key ("Software Engineer" ->
/// "software_engineer").
fn job_key(job_title: &str) -> String {
    job_title
        .trim()
        .to_lowercase()
        .replace([' ', '-'], "_")
}

/// Returns a deterministic canned question for the given context.
///
/// Falls through to a generic template when the (job, category, level)
/// triple has no table entry.
pub fn canned_question(context: &QuestionContext) -> GeneratedQuestion {
    let key = job_key(&context.job_title);
    let text = CANNED_QUESTIONS
        .iter()
        .find(|q| q.job_key == key && q.category == context.category && q.level == context.level)
        .map(|q| q.text.to_string())
        .unwrap_or_else(|| {
            format!(
                "Describe your experience with the {} aspects of {} work.",
                context.category, context.job_title
            )
        });

    GeneratedQuestion {
        text,
        category: context.category,
        level: context.level,
        estimated_minutes: 5,
        topics: vec![context.category.to_string()],
        context: "Please provide specific examples where possible.".to_string(),
        source: OracleSource::Fallback,
    }
}

/// Scores an answer by length bands when no oracle evaluation is
/// available. Shorter answers score lower; the bands are fixed.
pub fn heuristic_evaluation(context: &AnswerContext) -> ScoredEvaluation {
    let length = context.answer_text.trim().len();
    let score: f64 = if length < 50 {
        30.0
    } else if length < 150 {
        50.0
    } else if length < 300 {
        70.0
    } else {
        80.0
    };

    let recommendation = if score >= 80.0 {
        LevelDirective::Increase
    } else if score <= 40.0 {
        LevelDirective::Decrease
    } else {
        LevelDirective::Maintain
    };

    ScoredEvaluation {
        evaluation: Evaluation {
            overall_score: score,
            subscores: Subscores {
                correctness: score,
                depth: score,
                clarity: score,
                relevance: score,
            },
            feedback: "Your answer shows engagement with the topic. Consider providing more \
                       specific examples and deeper analysis in future responses."
                .to_string(),
            level_recommendation: recommendation,
            level_adjustment: recommendation.delta(context.level, MIN_LEVEL, MAX_LEVEL),
            strengths: vec!["Relevant response".to_string()],
            improvements: vec![
                "Add more depth".to_string(),
                "Include specific examples".to_string(),
            ],
        },
        source: OracleSource::Fallback,
    }
}
