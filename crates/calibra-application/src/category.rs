//! Question category selection.
//!
//! Greedy ratio balancing: each pick moves the realized soft-skill ratio
//! toward the configured target. The random draw only breaks exact ties,
//! so a seeded generator makes the whole sequence reproducible.

use calibra_core::session::{QuestionCategory, QuestionRecord};
use rand::Rng;

/// Picks the category for the next question.
///
/// When the realized soft ratio is below the target the next question is
/// a soft-skill one, when above it is technical. On an exact tie a
/// Bernoulli draw with probability `soft_pct` decides.
pub fn choose_category(
    questions: &[QuestionRecord],
    soft_pct: f64,
    rng: &mut impl Rng,
) -> QuestionCategory {
    let soft = questions
        .iter()
        .filter(|q| q.category == QuestionCategory::Soft)
        .count();
    let ratio = if questions.is_empty() {
        0.0
    } else {
        soft as f64 / questions.len() as f64
    };

    if ratio < soft_pct {
        QuestionCategory::Soft
    } else if ratio > soft_pct {
        QuestionCategory::Technical
    } else if rng.r#gen::<f64>() < soft_pct {
        QuestionCategory::Soft
    } else {
        QuestionCategory::Technical
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn question(seq: u32, category: QuestionCategory) -> QuestionRecord {
        QuestionRecord {
            seq,
            text: format!("q{seq}"),
            category,
            level: 3,
            topics: vec![],
            estimated_minutes: 5,
            context: String::new(),
            candidate_answer: None,
            evaluation: None,
        }
    }

    #[test]
    fn test_zero_target_is_always_technical() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            assert_eq!(choose_category(&[], 0.0, &mut rng), QuestionCategory::Technical);
        }
    }

    #[test]
    fn test_full_target_is_always_soft() {
        let mut rng = StdRng::seed_from_u64(7);
        let history = vec![question(1, QuestionCategory::Soft)];
        for _ in 0..20 {
            assert_eq!(choose_category(&history, 1.0, &mut rng), QuestionCategory::Soft);
        }
    }

    #[test]
    fn test_deficit_forces_soft() {
        let mut rng = StdRng::seed_from_u64(7);
        let history = vec![
            question(1, QuestionCategory::Technical),
            question(2, QuestionCategory::Technical),
            question(3, QuestionCategory::Technical),
        ];
        assert_eq!(choose_category(&history, 0.5, &mut rng), QuestionCategory::Soft);
    }

    #[test]
    fn test_surplus_forces_technical() {
        let mut rng = StdRng::seed_from_u64(7);
        let history = vec![
            question(1, QuestionCategory::Soft),
            question(2, QuestionCategory::Soft),
        ];
        assert_eq!(choose_category(&history, 0.3, &mut rng), QuestionCategory::Technical);
    }

    #[test]
    fn test_sequence_converges_to_target() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut history = Vec::new();
        for seq in 1..=10 {
            let category = choose_category(&history, 0.3, &mut rng);
            history.push(question(seq, category));
        }
        let soft = history
            .iter()
            .filter(|q| q.category == QuestionCategory::Soft)
            .count();
        // 10 questions at a 0.3 target settle on 3 soft picks
        assert_eq!(soft, 3);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let pick = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut history = Vec::new();
            for seq in 1..=8 {
                let category = choose_category(&history, 0.5, &mut rng);
                history.push(question(seq, category));
            }
            history.iter().map(|q| q.category).collect::<Vec<_>>()
        };
        assert_eq!(pick(99), pick(99));
    }
}
