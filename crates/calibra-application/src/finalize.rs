//! Session finalization: turning evaluated questions into a summary.

use calibra_core::session::{QuestionCategory, Session, Summary};

const TOP_ITEMS: usize = 3;

fn mean(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let avg = scores.iter().sum::<f64>() / scores.len() as f64;
    (avg * 100.0).round() / 100.0
}

/// The most frequent items, ties broken by first occurrence.
fn top_by_frequency<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for item in items {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        match counts.iter_mut().find(|(existing, _)| *existing == item) {
            Some((_, count)) => *count += 1,
            None => counts.push((item, 1)),
        }
    }
    // sort_by is stable, so equal counts keep first-occurrence order
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(TOP_ITEMS)
        .map(|(item, _)| item.to_string())
        .collect()
}

fn recommendation_for(overall: f64) -> &'static str {
    if overall >= 80.0 {
        "Strong candidate - exceeds expectations for this role"
    } else if overall >= 70.0 {
        "Good candidate - meets expectations with room to grow"
    } else if overall >= 60.0 {
        "Average candidate - consider for junior positions or with additional training"
    } else {
        "Below expectations - significant gaps in required competencies"
    }
}

/// Builds the final summary from all evaluated questions.
///
/// Overall score is a simple mean of the per-answer overall scores.
/// Category scores are means over their subset and 0.0 when the subset is
/// empty. Strengths and improvements are the three most frequent entries
/// across all evaluations.
pub fn build_summary(session: &Session) -> Summary {
    let evaluated: Vec<_> = session
        .questions
        .iter()
        .filter_map(|q| q.evaluation.as_ref().map(|e| (q.category, e)))
        .collect();

    let all: Vec<f64> = evaluated.iter().map(|(_, e)| e.overall_score).collect();
    let technical: Vec<f64> = evaluated
        .iter()
        .filter(|(c, _)| *c == QuestionCategory::Technical)
        .map(|(_, e)| e.overall_score)
        .collect();
    let soft: Vec<f64> = evaluated
        .iter()
        .filter(|(c, _)| *c == QuestionCategory::Soft)
        .map(|(_, e)| e.overall_score)
        .collect();

    let overall = mean(&all);
    let strengths = top_by_frequency(
        evaluated
            .iter()
            .flat_map(|(_, e)| e.strengths.iter().map(String::as_str)),
    );
    let improvements = top_by_frequency(
        evaluated
            .iter()
            .flat_map(|(_, e)| e.improvements.iter().map(String::as_str)),
    );

    Summary {
        overall_score: overall,
        technical_score: mean(&technical),
        soft_skills_score: mean(&soft),
        final_level: session.state.current_level,
        questions_answered: evaluated.len() as u32,
        strengths,
        improvements,
        recommendation: recommendation_for(overall).to_string(),
        completed_at: chrono::Utc::now().to_rfc3339(),
    }
}
