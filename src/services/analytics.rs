// src/services/analytics.rs

use serde::Serialize;
use std::collections::HashMap;

use crate::models::assessment::Assessment;
use crate::models::question::Question;
use crate::models::submission::Submission;

/// Display ceiling for the score histogram. Assessments worth more than
/// this still render on a 0-10 axis, with higher scores landing in the top
/// bucket.
const DISPLAY_CEILING: f64 = 10.0;

const BUCKET_COUNT: usize = 5;

/// Slack added to the top bucket's upper bound so scores sitting exactly at
/// the max survive float rounding.
const TOP_BUCKET_EPSILON: f64 = 0.01;

#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    /// Mean of per-submission scores normalized to 0-10.
    pub class_mean: f64,
    pub class_max: f64,
    pub class_min: f64,
    pub total_submissions: usize,
}

#[derive(Debug, Serialize)]
pub struct HistogramBucket {
    pub label: String,
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct ScoreDistribution {
    pub buckets: Vec<HistogramBucket>,
    /// Submissions that scored exactly zero.
    pub zero_scores: u64,
    /// Submissions at or above the assessment's true (uncapped) max.
    pub full_scores: u64,
}

#[derive(Debug, Serialize)]
pub struct QuestionPerformance {
    /// Position label in assessment order: Q1..Qn.
    pub label: String,
    pub question_id: i64,
    /// Percentage of available points earned, one decimal.
    pub accuracy: f64,
}

#[derive(Debug, Serialize)]
pub struct AssessmentAnalytics {
    pub summary: AnalyticsSummary,
    pub distribution: ScoreDistribution,
    pub question_performance: Vec<QuestionPerformance>,
}

/// Computes the dashboard statistics for one assessment from its finalized
/// submissions. Pure; callers pass a read-only snapshot and no locking is
/// involved.
pub fn compute(
    assessment: &Assessment,
    questions: &HashMap<i64, Question>,
    submissions: &[Submission],
) -> AssessmentAnalytics {
    let assessment_max = assessment_max_score(assessment, questions);
    let display_max = assessment_max.min(DISPLAY_CEILING);
    let step = display_max / BUCKET_COUNT as f64;

    let mut buckets: Vec<HistogramBucket> = (0..BUCKET_COUNT)
        .map(|i| HistogramBucket {
            label: format!(
                "{} - {}",
                format_bound(i as f64 * step),
                format_bound((i + 1) as f64 * step)
            ),
            count: 0,
        })
        .collect();

    let mut zero_scores = 0;
    let mut full_scores = 0;

    for submission in submissions {
        if submission.total_earned == 0.0 {
            zero_scores += 1;
        }
        if submission.total_earned >= assessment_max {
            full_scores += 1;
        }

        // Cap at the display max before binning so over-ceiling scores land
        // in the top bucket instead of falling off the chart.
        let score = submission.total_earned.min(display_max);
        for i in 0..BUCKET_COUNT {
            let lower = i as f64 * step;
            let upper = (i + 1) as f64 * step;
            let hit = if i == BUCKET_COUNT - 1 {
                score >= lower && score <= upper + TOP_BUCKET_EPSILON
            } else {
                score >= lower && score < upper
            };
            if hit {
                buckets[i].count += 1;
                break;
            }
        }
    }

    let normalized: Vec<f64> = submissions.iter().map(Submission::normalized_score).collect();
    let summary = if normalized.is_empty() {
        AnalyticsSummary {
            class_mean: 0.0,
            class_max: 0.0,
            class_min: 0.0,
            total_submissions: 0,
        }
    } else {
        AnalyticsSummary {
            class_mean: normalized.iter().sum::<f64>() / normalized.len() as f64,
            class_max: normalized.iter().copied().fold(f64::MIN, f64::max),
            class_min: normalized.iter().copied().fold(f64::MAX, f64::min),
            total_submissions: normalized.len(),
        }
    };

    let question_performance = assessment
        .slots
        .iter()
        .enumerate()
        .map(|(index, slot)| {
            let mut earned = 0.0;
            let mut max = 0.0;
            for submission in submissions {
                if let Some(answer) = submission.answers.get(&slot.question_id) {
                    earned += answer.score_earned;
                    max += answer.score_max;
                }
            }
            let accuracy = if max > 0.0 { earned / max * 100.0 } else { 0.0 };
            QuestionPerformance {
                label: format!("Q{}", index + 1),
                question_id: slot.question_id,
                accuracy: (accuracy * 10.0).round() / 10.0,
            }
        })
        .collect();

    AssessmentAnalytics {
        summary,
        distribution: ScoreDistribution {
            buckets,
            zero_scores,
            full_scores,
        },
        question_performance,
    }
}

/// Sum of effective slot max scores (slot override, else the question's
/// own max). Falls back to 10 when nothing positive is configured, so the
/// histogram always has a usable range.
fn assessment_max_score(assessment: &Assessment, questions: &HashMap<i64, Question>) -> f64 {
    let total: f64 = assessment
        .slots
        .iter()
        .map(|slot| {
            slot.max_score
                .or_else(|| questions.get(&slot.question_id).map(|q| q.max_score))
                .unwrap_or(0.0)
        })
        .sum();

    if total > 0.0 { total } else { DISPLAY_CEILING }
}

/// Integer bounds render without decimals, fractional ones with a single
/// decimal, matching the dashboard's bucket labels.
fn format_bound(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value)
    }
}
