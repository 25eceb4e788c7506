// tests/analytics.rs

mod common;

use std::collections::HashMap;

use acadia_backend::models::assessment::AssessmentKind;
use acadia_backend::models::question::Question;
use acadia_backend::models::submission::{GradedAnswer, Submission};
use acadia_backend::services::analytics::compute;
use acadia_backend::store::memory::MemoryStore;
use chrono::Utc;
use common::*;
use serde_json::json;

/// Builds a finalized submission with a single graded answer on `question_id`.
fn finalized_submission(
    learner_id: i64,
    assessment_id: i64,
    question_id: i64,
    earned: f64,
    max: f64,
) -> Submission {
    let mut submission = Submission::new(learner_id, assessment_id, AssessmentKind::Exam, Utc::now());
    submission
        .record_answer(GradedAnswer {
            question_id,
            answer: json!("answer"),
            is_correct: earned >= max && max > 0.0,
            score_earned: earned,
            score_max: max,
            graded_at: Utc::now(),
        })
        .expect("record succeeds");
    submission.finalize(Utc::now()).expect("finalize succeeds");
    submission
}

fn question_map(questions: Vec<Question>) -> HashMap<i64, Question> {
    questions.into_iter().map(|q| (q.id, q)).collect()
}

#[test]
fn histogram_buckets_the_documented_scenario() {
    // Assessment worth 10 points; submissions scoring 0, 2, 5, 8, 10 and 12
    // (extra credit, capped at the display max for binning).
    let assessment = assessment(100, vec![slot(1)]);
    let questions = question_map(vec![multiple_choice_question(1, 10.0)]);
    let submissions: Vec<Submission> = [0.0, 2.0, 5.0, 8.0, 10.0, 12.0]
        .iter()
        .enumerate()
        .map(|(i, earned)| finalized_submission(i as i64 + 1, 100, 1, *earned, 10.0))
        .collect();

    let analytics = compute(&assessment, &questions, &submissions);

    let counts: Vec<u64> = analytics
        .distribution
        .buckets
        .iter()
        .map(|b| b.count)
        .collect();
    assert_eq!(counts, vec![1, 1, 1, 0, 3]);

    assert_eq!(analytics.distribution.zero_scores, 1);
    // 10 and 12 both reach the true max of 10.
    assert_eq!(analytics.distribution.full_scores, 2);

    let labels: Vec<&str> = analytics
        .distribution
        .buckets
        .iter()
        .map(|b| b.label.as_str())
        .collect();
    assert_eq!(labels, vec!["0 - 2", "2 - 4", "4 - 6", "6 - 8", "8 - 10"]);
}

#[test]
fn per_question_accuracy_averages_earned_over_available() {
    let assessment = assessment(100, vec![slot(1)]);
    let questions = question_map(vec![multiple_choice_question(1, 5.0)]);
    let submissions = vec![
        finalized_submission(1, 100, 1, 5.0, 5.0),
        finalized_submission(2, 100, 1, 0.0, 5.0),
    ];

    let analytics = compute(&assessment, &questions, &submissions);

    assert_eq!(analytics.question_performance.len(), 1);
    let q1 = &analytics.question_performance[0];
    assert_eq!(q1.label, "Q1");
    assert_eq!(q1.question_id, 1);
    assert_eq!(q1.accuracy, 50.0);
}

#[test]
fn questions_keep_assessment_order_and_unanswered_report_zero() {
    let assessment = assessment(100, vec![slot(1), slot(2)]);
    let questions = question_map(vec![
        multiple_choice_question(1, 5.0),
        numeric_question(2, 5.0, 1.0, 0.0),
    ]);
    // Only question 2 was ever answered.
    let submissions = vec![finalized_submission(1, 100, 2, 5.0, 5.0)];

    let analytics = compute(&assessment, &questions, &submissions);

    let labels: Vec<&str> = analytics
        .question_performance
        .iter()
        .map(|p| p.label.as_str())
        .collect();
    assert_eq!(labels, vec!["Q1", "Q2"]);
    assert_eq!(analytics.question_performance[0].accuracy, 0.0);
    assert_eq!(analytics.question_performance[1].accuracy, 100.0);
}

#[test]
fn accuracy_rounds_to_one_decimal() {
    let assessment = assessment(100, vec![slot(1)]);
    let questions = question_map(vec![multiple_choice_question(1, 3.0)]);
    let submissions = vec![finalized_submission(1, 100, 1, 1.0, 3.0)];

    let analytics = compute(&assessment, &questions, &submissions);

    assert_eq!(analytics.question_performance[0].accuracy, 33.3);
}

#[test]
fn class_statistics_are_normalized_to_ten() {
    let assessment = assessment(100, vec![slot(1)]);
    let questions = question_map(vec![multiple_choice_question(1, 10.0)]);
    let submissions = vec![
        finalized_submission(1, 100, 1, 5.0, 10.0),
        finalized_submission(2, 100, 1, 10.0, 10.0),
    ];

    let analytics = compute(&assessment, &questions, &submissions);

    assert_eq!(analytics.summary.total_submissions, 2);
    assert_eq!(analytics.summary.class_mean, 7.5);
    assert_eq!(analytics.summary.class_max, 10.0);
    assert_eq!(analytics.summary.class_min, 5.0);
}

#[test]
fn zero_max_submissions_normalize_to_zero() {
    let assessment = assessment(100, vec![slot(1)]);
    let questions = question_map(vec![multiple_choice_question(1, 10.0)]);

    // Finalized without ever answering: total max is zero.
    let mut empty = Submission::new(1, 100, AssessmentKind::Exam, Utc::now());
    empty.finalize(Utc::now()).expect("finalize succeeds");

    let analytics = compute(&assessment, &questions, &[empty]);

    assert_eq!(analytics.summary.class_mean, 0.0);
    assert!(analytics.summary.class_mean.is_finite());
    assert_eq!(analytics.distribution.zero_scores, 1);
}

#[test]
fn no_submissions_yield_empty_statistics() {
    let assessment = assessment(100, vec![slot(1)]);
    let questions = question_map(vec![multiple_choice_question(1, 10.0)]);

    let analytics = compute(&assessment, &questions, &[]);

    assert_eq!(analytics.summary.total_submissions, 0);
    assert_eq!(analytics.summary.class_mean, 0.0);
    assert!(analytics.distribution.buckets.iter().all(|b| b.count == 0));
    assert_eq!(analytics.distribution.zero_scores, 0);
    assert_eq!(analytics.distribution.full_scores, 0);
}

#[test]
fn display_range_is_capped_at_ten_for_large_assessments() {
    // Two questions worth 10 each: the true max is 20, the display max 10.
    let assessment = assessment(100, vec![slot(1), slot(2)]);
    let questions = question_map(vec![
        multiple_choice_question(1, 10.0),
        multiple_choice_question(2, 10.0),
    ]);

    let mut strong = Submission::new(1, 100, AssessmentKind::Exam, Utc::now());
    for (question_id, earned) in [(1, 10.0), (2, 5.0)] {
        strong
            .record_answer(GradedAnswer {
                question_id,
                answer: json!("B"),
                is_correct: earned == 10.0,
                score_earned: earned,
                score_max: 10.0,
                graded_at: Utc::now(),
            })
            .expect("record succeeds");
    }
    strong.finalize(Utc::now()).expect("finalize succeeds");

    let analytics = compute(&assessment, &questions, &[strong]);

    // 15 points binned at the display cap of 10: lands in the top bucket.
    assert_eq!(analytics.distribution.buckets[4].count, 1);
    let labels: Vec<&str> = analytics
        .distribution
        .buckets
        .iter()
        .map(|b| b.label.as_str())
        .collect();
    assert_eq!(labels, vec!["0 - 2", "2 - 4", "4 - 6", "6 - 8", "8 - 10"]);
    // 15 is below the true max of 20.
    assert_eq!(analytics.distribution.full_scores, 0);
}

#[test]
fn slot_overrides_shape_the_assessment_max() {
    let assessment = assessment(100, vec![slot_with_max(1, 4.0)]);
    let questions = question_map(vec![multiple_choice_question(1, 10.0)]);
    let submissions = vec![finalized_submission(1, 100, 1, 4.0, 4.0)];

    let analytics = compute(&assessment, &questions, &submissions);

    // The override (4), not the question max (10), is the true max.
    assert_eq!(analytics.distribution.full_scores, 1);
}

#[tokio::test]
async fn analytics_scan_only_finalized_submissions() {
    let store = MemoryStore::new();
    store.insert_question(multiple_choice_question(1, 10.0));
    store.insert_assessment(assessment(100, vec![slot(1)]));
    let service = service_over(&store);

    // Learner 1 finalizes; learner 2 stays in progress.
    service
        .submit_answers(1, 100, vec![answer(1, json!("B"))], true)
        .await
        .expect("submit succeeds");
    service
        .submit_answers(2, 100, vec![answer(1, json!("A"))], false)
        .await
        .expect("submit succeeds");

    let analytics = service
        .assessment_analytics(100)
        .await
        .expect("analytics succeed");

    assert_eq!(analytics.summary.total_submissions, 1);
    assert_eq!(analytics.summary.class_mean, 10.0);
}
