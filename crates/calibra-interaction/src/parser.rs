//! Parsing of labeled-line oracle responses into typed structs.
//!
//! Parsing is tolerant: optional fields default when missing. Only the
//! essential field (question text / overall score) is required - when it
//! cannot be extracted the functions return `None` and the caller falls
//! back to a deterministic local result.

use calibra_core::session::LevelDirective;

/// Fields extracted from a question-generation response.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedQuestion {
    pub text: String,
    pub topics: Vec<String>,
    pub estimated_minutes: u32,
    pub context: String,
}

/// Fields extracted from an evaluation response.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEvaluation {
    pub overall_score: f64,
    pub correctness: f64,
    pub depth: f64,
    pub clarity: f64,
    pub relevance: f64,
    pub feedback: String,
    pub recommendation: LevelDirective,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
}

const QUESTION_MARKERS: [&str; 4] = ["QUESTION:", "TOPICS:", "TIME:", "CONTEXT:"];

/// Parses a question response. `None` when no question text can be found.
pub fn parse_question_response(response: &str) -> Option<ParsedQuestion> {
    let mut text = String::new();
    let mut topics = Vec::new();
    let mut estimated_minutes = 5;
    let mut context = String::new();

    for line in response.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("QUESTION:") {
            text = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("TOPICS:") {
            topics = rest
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
        } else if let Some(rest) = line.strip_prefix("TIME:") {
            if let Some(minutes) = extract_number(rest) {
                estimated_minutes = minutes.clamp(1.0, 120.0) as u32;
            }
        } else if let Some(rest) = line.strip_prefix("CONTEXT:") {
            context = rest.trim().to_string();
        }
    }

    if text.is_empty() {
        // No marker found: fall back to the first line that is not a label
        text = response
            .lines()
            .map(str::trim)
            .find(|line| {
                !line.is_empty() && !QUESTION_MARKERS.iter().any(|m| line.starts_with(m))
            })
            .map(|line| line.trim_matches(['.', ',', ';', ':', '-']).to_string())
            .unwrap_or_default();
    }

    if text.is_empty() {
        return None;
    }
    Some(ParsedQuestion {
        text,
        topics,
        estimated_minutes,
        context,
    })
}

/// Parses an evaluation response. `None` when the overall score is missing.
pub fn parse_evaluation_response(response: &str) -> Option<ParsedEvaluation> {
    let mut overall = None;
    let mut correctness = 50.0;
    let mut depth = 50.0;
    let mut clarity = 50.0;
    let mut relevance = 50.0;
    let mut recommendation = LevelDirective::Maintain;
    let mut strengths = Vec::new();
    let mut improvements = Vec::new();
    let mut feedback = String::new();

    #[derive(PartialEq)]
    enum Section {
        None,
        Strengths,
        Improvements,
        Feedback,
    }
    let mut section = Section::None;

    for line in response.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("CORRECTNESS:") {
            if let Some(score) = extract_number(rest) {
                correctness = score.clamp(0.0, 100.0);
            }
            section = Section::None;
        } else if let Some(rest) = line.strip_prefix("DEPTH:") {
            if let Some(score) = extract_number(rest) {
                depth = score.clamp(0.0, 100.0);
            }
            section = Section::None;
        } else if let Some(rest) = line.strip_prefix("CLARITY:") {
            if let Some(score) = extract_number(rest) {
                clarity = score.clamp(0.0, 100.0);
            }
            section = Section::None;
        } else if let Some(rest) = line.strip_prefix("RELEVANCE:") {
            if let Some(score) = extract_number(rest) {
                relevance = score.clamp(0.0, 100.0);
            }
            section = Section::None;
        } else if let Some(rest) = line.strip_prefix("OVERALL:") {
            if let Some(score) = extract_number(rest) {
                overall = Some(score.clamp(0.0, 100.0));
            }
            section = Section::None;
        } else if let Some(rest) = line.strip_prefix("LEVEL_RECOMMENDATION:") {
            recommendation = match rest.trim().to_uppercase().as_str() {
                "INCREASE" => LevelDirective::Increase,
                "DECREASE" => LevelDirective::Decrease,
                _ => LevelDirective::Maintain,
            };
            section = Section::None;
        } else if line.starts_with("STRENGTHS:") {
            section = Section::Strengths;
        } else if line.starts_with("IMPROVEMENTS:") {
            section = Section::Improvements;
        } else if let Some(rest) = line.strip_prefix("FEEDBACK:") {
            section = Section::Feedback;
            let rest = rest.trim();
            if !rest.is_empty() {
                feedback.push_str(rest);
            }
        } else if line.starts_with('-') || line.starts_with('\u{2022}') {
            let item = line.trim_start_matches(['-', '\u{2022}', ' ']).to_string();
            match section {
                Section::Strengths => strengths.push(item),
                Section::Improvements => improvements.push(item),
                _ => {}
            }
        } else if section == Section::Feedback && !line.is_empty() {
            if !feedback.is_empty() {
                feedback.push(' ');
            }
            feedback.push_str(line);
        }
    }

    Some(ParsedEvaluation {
        overall_score: overall?,
        correctness,
        depth,
        clarity,
        relevance,
        feedback,
        recommendation,
        strengths,
        improvements,
    })
}

/// Extracts the first number from a line like `"85"` or `"[85/100]"`.
fn extract_number(text: &str) -> Option<f64> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_well_formed_question() {
        let response = "QUESTION: What is a B-tree?\n\
                        TOPICS: databases, data structures\n\
                        TIME: 3\n\
                        CONTEXT: Think about index structures.";
        let parsed = parse_question_response(response).unwrap();
        assert_eq!(parsed.text, "What is a B-tree?");
        assert_eq!(parsed.topics, vec!["databases", "data structures"]);
        assert_eq!(parsed.estimated_minutes, 3);
        assert_eq!(parsed.context, "Think about index structures.");
    }

    #[test]
    fn test_parse_question_without_markers_uses_first_line() {
        let parsed = parse_question_response("Explain how TCP handshakes work.\n").unwrap();
        assert_eq!(parsed.text, "Explain how TCP handshakes work");
        assert_eq!(parsed.estimated_minutes, 5);
        assert!(parsed.topics.is_empty());
    }

    #[test]
    fn test_parse_empty_question_is_none() {
        assert!(parse_question_response("").is_none());
        assert!(parse_question_response("QUESTION:\nTOPICS: a, b").is_none());
    }

    #[test]
    fn test_parse_well_formed_evaluation() {
        let response = "CORRECTNESS: 85\n\
                        DEPTH: 70\n\
                        CLARITY: 90\n\
                        RELEVANCE: 80\n\
                        OVERALL: 82\n\
                        LEVEL_RECOMMENDATION: INCREASE\n\
                        STRENGTHS:\n\
                        - Clear structure\n\
                        - Good examples\n\
                        IMPROVEMENTS:\n\
                        - More depth\n\
                        FEEDBACK: Solid answer overall.\n\
                        Keep building on fundamentals.";
        let parsed = parse_evaluation_response(response).unwrap();
        assert_eq!(parsed.overall_score, 82.0);
        assert_eq!(parsed.correctness, 85.0);
        assert_eq!(parsed.recommendation, LevelDirective::Increase);
        assert_eq!(parsed.strengths, vec!["Clear structure", "Good examples"]);
        assert_eq!(parsed.improvements, vec!["More depth"]);
        assert_eq!(parsed.feedback, "Solid answer overall. Keep building on fundamentals.");
    }

    #[test]
    fn test_missing_subscores_default_to_fifty() {
        let parsed = parse_evaluation_response("OVERALL: 60").unwrap();
        assert_eq!(parsed.overall_score, 60.0);
        assert_eq!(parsed.correctness, 50.0);
        assert_eq!(parsed.depth, 50.0);
        assert_eq!(parsed.recommendation, LevelDirective::Maintain);
    }

    #[test]
    fn test_missing_overall_is_none() {
        assert!(parse_evaluation_response("CORRECTNESS: 85\nDEPTH: 70").is_none());
        assert!(parse_evaluation_response("complete garbage").is_none());
    }

    #[test]
    fn test_scores_clamped() {
        let parsed = parse_evaluation_response("OVERALL: 150\nCLARITY: 400").unwrap();
        assert_eq!(parsed.overall_score, 100.0);
        assert_eq!(parsed.clarity, 100.0);
    }

    #[test]
    fn test_extract_number() {
        assert_eq!(extract_number(" 85"), Some(85.0));
        assert_eq!(extract_number("[3 minutes]"), Some(3.0));
        assert_eq!(extract_number("82.5"), Some(82.5));
        assert_eq!(extract_number("none"), None);
    }
}
