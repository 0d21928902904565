//! Prompt construction for the chat oracle.
//!
//! The oracle is instructed to answer in a labeled-line plain-text format
//! (`QUESTION:`, `TOPICS:`, ... / `CORRECTNESS:`, `OVERALL:`, ...) that
//! `parser` turns back into typed structs.

use calibra_core::oracle::{AnswerContext, QuestionContext};

/// Human-readable descriptor for a difficulty level.
pub fn difficulty_descriptor(level: u8) -> &'static str {
    match level {
        1 => "entry-level/junior",
        2 => "junior",
        3 => "mid-level",
        4 => "senior",
        _ => "expert/architect",
    }
}

/// Builds the question-generation prompt.
pub fn question_prompt(context: &QuestionContext) -> String {
    let keywords = if context.keywords.is_empty() {
        "general skills".to_string()
    } else {
        context.keywords.join(", ")
    };

    let mut previous = String::new();
    if !context.previous_questions.is_empty() {
        previous.push_str("\nPrevious questions asked (avoid similar topics):\n");
        // Only the most recent few matter for avoiding repetition
        let recent = context
            .previous_questions
            .iter()
            .rev()
            .take(3)
            .rev();
        for question in recent {
            previous.push_str(&format!("- {question}\n"));
        }
    }

    format!(
        "You are an expert interviewer. Generate a SHORT, quiz-like {category} question \
         for a {job_title} position.\n\
         \n\
         REQUIREMENTS:\n\
         - Difficulty level: {level}/5 ({descriptor}) - strictly follow this level\n\
         - Focus areas: {keywords}\n\
         - Language: {language}\n\
         - Concise and direct, 1-2 sentences, focused on one concept\n\
         \n\
         Respond in this exact format:\n\
         \n\
         QUESTION: [your short question, 1-2 sentences max]\n\
         TOPICS: [comma-separated list of 2-3 main topics]\n\
         TIME: [estimated minutes to answer]\n\
         CONTEXT: [brief context if needed, or leave empty]\n\
         {previous}",
        category = context.category,
        job_title = context.job_title,
        level = context.level,
        descriptor = difficulty_descriptor(context.level),
        keywords = keywords,
        language = context.language,
        previous = previous,
    )
}

/// Builds the answer-evaluation prompt.
pub fn evaluation_prompt(context: &AnswerContext) -> String {
    let topics = if context.topics.is_empty() {
        "general".to_string()
    } else {
        context.topics.join(", ")
    };

    format!(
        "You are an expert interviewer evaluating a candidate's response for a \
         {job_title} position.\n\
         \n\
         QUESTION CONTEXT:\n\
         - Question: {question}\n\
         - Type: {category}\n\
         - Difficulty: {level}/5 ({descriptor})\n\
         - Topics: {topics}\n\
         \n\
         CANDIDATE'S ANSWER:\n\
         {answer}\n\
         \n\
         Score the answer 0-100 on correctness, depth, clarity, and relevance, \
         and decide whether the difficulty should change.\n\
         \n\
         Respond in this exact format:\n\
         \n\
         CORRECTNESS: [score 0-100]\n\
         DEPTH: [score 0-100]\n\
         CLARITY: [score 0-100]\n\
         RELEVANCE: [score 0-100]\n\
         OVERALL: [score 0-100]\n\
         LEVEL_RECOMMENDATION: [INCREASE/MAINTAIN/DECREASE]\n\
         STRENGTHS: [bullet list of 2-3 key strengths]\n\
         IMPROVEMENTS: [bullet list of 2-3 areas for improvement]\n\
         FEEDBACK: [constructive feedback paragraph]",
        job_title = context.job_title,
        question = context.question_text,
        category = context.category,
        level = context.level,
        descriptor = difficulty_descriptor(context.level),
        topics = topics,
        answer = context.answer_text,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use calibra_core::session::QuestionCategory;

    #[test]
    fn test_question_prompt_bounds_previous_questions() {
        let context = QuestionContext {
            job_title: "Software Engineer".to_string(),
            level: 3,
            keywords: vec!["rust".to_string()],
            category: QuestionCategory::Technical,
            language: "en".to_string(),
            previous_questions: (1..=5).map(|i| format!("old question {i}")).collect(),
        };
        let prompt = question_prompt(&context);
        // Only the last three make it into the prompt
        assert!(!prompt.contains("old question 1"));
        assert!(!prompt.contains("old question 2"));
        assert!(prompt.contains("old question 3"));
        assert!(prompt.contains("old question 5"));
        assert!(prompt.contains("mid-level"));
    }

    #[test]
    fn test_evaluation_prompt_includes_answer() {
        let context = AnswerContext {
            question_text: "What is ownership?".to_string(),
            category: QuestionCategory::Technical,
            level: 2,
            answer_text: "Ownership is Rust's memory model.".to_string(),
            job_title: "Software Engineer".to_string(),
            topics: vec!["rust".to_string()],
        };
        let prompt = evaluation_prompt(&context);
        assert!(prompt.contains("What is ownership?"));
        assert!(prompt.contains("OVERALL:"));
        assert!(prompt.contains("junior"));
    }
}
