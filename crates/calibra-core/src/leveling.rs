//! Adaptive leveling and scoring analytics.
//!
//! Pure functions only: the same inputs always produce the same outputs,
//! and nothing here touches storage or the oracle. `update_level` is the
//! control input for the session state machine; the remaining functions
//! are reporting conveniences.

use crate::config::LevelingConfig;
use crate::session::QuestionRecord;

/// Performance classification over the whole score range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceBand {
    Excellent,
    Good,
    Satisfactory,
    NeedsImprovement,
    Poor,
}

impl PerformanceBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceBand::Excellent => "excellent",
            PerformanceBand::Good => "good",
            PerformanceBand::Satisfactory => "satisfactory",
            PerformanceBand::NeedsImprovement => "needs_improvement",
            PerformanceBand::Poor => "poor",
        }
    }
}

/// Direction of the most recent scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreTrend {
    Improving,
    Declining,
    Stable,
    InsufficientData,
}

/// Computes the new difficulty level from the rolling score window.
///
/// Takes the mean of the last `window_size` scores. At or above the upper
/// threshold the level rises by one; at or below the lower threshold it
/// falls by one; otherwise it is unchanged. Moves are always single steps
/// and never leave `[min_level, max_level]`.
///
/// Returns the new level and a human-readable reason.
pub fn update_level(
    current_level: u8,
    recent_scores: &[f64],
    config: &LevelingConfig,
) -> (u8, String) {
    if recent_scores.is_empty() {
        return (current_level, "no scores available for adjustment".to_string());
    }

    let start = recent_scores.len().saturating_sub(config.window_size);
    let window = &recent_scores[start..];
    let avg = window.iter().sum::<f64>() / window.len() as f64;

    if avg >= config.upper_threshold && current_level < config.max_level {
        (
            current_level + 1,
            format!("average score {:.1} >= {} threshold", avg, config.upper_threshold),
        )
    } else if avg <= config.lower_threshold && current_level > config.min_level {
        (
            current_level - 1,
            format!("average score {:.1} <= {} threshold", avg, config.lower_threshold),
        )
    } else {
        (
            current_level,
            format!("average score {:.1} within acceptable range", avg),
        )
    }
}

/// Level-weighted mean over answered questions: sum(score x level) / sum(level).
///
/// Higher-difficulty answers weigh proportionally more. Returns 0.0 when
/// no question has an evaluation.
pub fn weighted_average(questions: &[QuestionRecord]) -> f64 {
    let mut total_score = 0.0;
    let mut total_weight = 0.0;

    for question in questions {
        let Some(evaluation) = &question.evaluation else {
            continue;
        };
        let weight = question.level as f64;
        total_score += evaluation.overall_score * weight;
        total_weight += weight;
    }

    if total_weight == 0.0 {
        return 0.0;
    }
    (total_score / total_weight * 100.0).round() / 100.0
}

/// Classifies the trend over the last three scores by slope sign.
pub fn score_trend(scores: &[f64]) -> ScoreTrend {
    if scores.len() < 3 {
        return ScoreTrend::InsufficientData;
    }
    let recent = &scores[scores.len() - 3..];
    if recent[2] > recent[0] {
        ScoreTrend::Improving
    } else if recent[2] < recent[0] {
        ScoreTrend::Declining
    } else {
        ScoreTrend::Stable
    }
}

/// Percentile rank of `score` within a comparison population (0-100).
///
/// Equal scores count half, so a score equal to the whole population
/// ranks at the 50th percentile. Returns 50.0 for an empty population.
pub fn percentile_rank(score: f64, population: &[f64]) -> f64 {
    if population.is_empty() {
        return 50.0;
    }
    let below = population.iter().filter(|s| **s < score).count() as f64;
    let equal = population.iter().filter(|s| **s == score).count() as f64;
    let percentile = (below + 0.5 * equal) / population.len() as f64 * 100.0;
    (percentile * 10.0).round() / 10.0
}

/// Buckets a score into a fixed performance band.
pub fn performance_band(score: f64) -> PerformanceBand {
    if score >= 90.0 {
        PerformanceBand::Excellent
    } else if score >= 75.0 {
        PerformanceBand::Good
    } else if score >= 60.0 {
        PerformanceBand::Satisfactory
    } else if score >= 45.0 {
        PerformanceBand::NeedsImprovement
    } else {
        PerformanceBand::Poor
    }
}
