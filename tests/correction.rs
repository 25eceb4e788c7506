// tests/correction.rs

use acadia_backend::correction::{
    CorrectionError, QuestionKind, effective_max_score, grade, grade_document,
};
use serde_json::json;

fn multiple_choice() -> serde_json::Value {
    json!({
        "type": "multiple_choice",
        "alternatives": [
            { "letter": "A", "text": "The Treaty of Tordesillas", "correct": false },
            { "letter": "B", "text": "The Iron Law of Wages", "correct": true },
            { "letter": "C", "text": "The Continental System", "correct": false },
        ]
    })
}

#[test]
fn multiple_choice_exact_match() {
    let kind = QuestionKind::parse(&multiple_choice()).expect("valid definition");

    let right = grade(&kind, Some(&json!("B")), 10.0);
    assert!(right.is_correct);
    assert_eq!(right.score_earned, 10.0);
    assert_eq!(right.score_max, 10.0);

    let wrong = grade(&kind, Some(&json!("A")), 10.0);
    assert!(!wrong.is_correct);
    assert_eq!(wrong.score_earned, 0.0);
    assert_eq!(wrong.score_max, 10.0);
}

#[test]
fn multiple_choice_accepts_full_text() {
    let kind = QuestionKind::parse(&multiple_choice()).expect("valid definition");

    let by_text = grade(&kind, Some(&json!("The Iron Law of Wages")), 10.0);
    assert!(by_text.is_correct);

    // Surrounding whitespace is tolerated.
    let padded = grade(&kind, Some(&json!("  B ")), 10.0);
    assert!(padded.is_correct);
}

#[test]
fn multiple_choice_without_key_grades_incorrect() {
    let kind = QuestionKind::parse(&json!({
        "type": "multiple_choice",
        "alternatives": [
            { "letter": "A", "text": "Option A" },
            { "letter": "B", "text": "Option B" },
        ]
    }))
    .expect("valid definition");

    let result = grade(&kind, Some(&json!("A")), 10.0);
    assert!(!result.is_correct);
    assert_eq!(result.score_earned, 0.0);
}

#[test]
fn numeric_tolerance() {
    let kind = QuestionKind::parse(&json!({
        "type": "numeric",
        "correct_value": 15.5,
        "error_margin": 0.5
    }))
    .expect("valid definition");

    assert!(grade(&kind, Some(&json!(15.9)), 5.0).is_correct);
    assert!(grade(&kind, Some(&json!(16.0)), 5.0).is_correct);
    assert!(!grade(&kind, Some(&json!(16.1)), 5.0).is_correct);
}

#[test]
fn numeric_defaults_to_zero_margin() {
    let kind = QuestionKind::parse(&json!({
        "type": "numeric",
        "correct_value": 42.0
    }))
    .expect("valid definition");

    assert!(grade(&kind, Some(&json!(42.0)), 2.0).is_correct);
    assert!(!grade(&kind, Some(&json!(42.001)), 2.0).is_correct);
}

#[test]
fn numeric_accepts_string_input() {
    let kind = QuestionKind::parse(&json!({
        "type": "numeric",
        "correct_value": 1822.0
    }))
    .expect("valid definition");

    assert!(grade(&kind, Some(&json!("1822")), 1.0).is_correct);
    assert!(!grade(&kind, Some(&json!("not a number")), 1.0).is_correct);
}

#[test]
fn true_false_set_is_all_or_nothing() {
    let kind = QuestionKind::parse(&json!({
        "type": "true_false_set",
        "statements": [
            { "text": "First", "correct": true },
            { "text": "Second", "correct": false },
            { "text": "Third", "correct": true },
        ]
    }))
    .expect("valid definition");

    let all_right = grade(&kind, Some(&json!([true, false, true])), 6.0);
    assert!(all_right.is_correct);
    assert_eq!(all_right.score_earned, 6.0);

    // Two of three matches still earns nothing.
    let partial = grade(&kind, Some(&json!([true, true, true])), 6.0);
    assert!(!partial.is_correct);
    assert_eq!(partial.score_earned, 0.0);

    let short = grade(&kind, Some(&json!([true, false])), 6.0);
    assert!(!short.is_correct);

    let not_an_array = grade(&kind, Some(&json!("true")), 6.0);
    assert!(!not_an_array.is_correct);
}

#[test]
fn proposition_set_compares_the_sum() {
    let kind = QuestionKind::parse(&json!({
        "type": "proposition_set",
        "propositions": [
            { "value": 1, "text": "P1", "correct": true },
            { "value": 2, "text": "P2", "correct": false },
            { "value": 4, "text": "P4", "correct": true },
            { "value": 8, "text": "P8", "correct": false },
        ]
    }))
    .expect("valid definition");

    assert!(grade(&kind, Some(&json!(5)), 10.0).is_correct);
    assert!(!grade(&kind, Some(&json!(3)), 10.0).is_correct);
    assert!(!grade(&kind, Some(&json!(0)), 10.0).is_correct);
}

#[test]
fn essay_is_never_auto_graded() {
    let kind = QuestionKind::parse(&json!({ "type": "essay" })).expect("valid definition");

    let result = grade(&kind, Some(&json!("A thorough answer.")), 10.0);
    assert!(!result.is_correct);
    assert_eq!(result.score_earned, 0.0);
    // The ceiling is recorded for later manual grading.
    assert_eq!(result.score_max, 10.0);
}

#[test]
fn missing_answer_grades_incorrect_instead_of_failing() {
    let kind = QuestionKind::parse(&multiple_choice()).expect("valid definition");

    let absent = grade(&kind, None, 10.0);
    assert!(!absent.is_correct);
    assert_eq!(absent.score_earned, 0.0);
    assert_eq!(absent.score_max, 10.0);

    let null = grade(&kind, Some(&serde_json::Value::Null), 10.0);
    assert!(!null.is_correct);
    assert_eq!(null.score_earned, 0.0);
}

#[test]
fn grading_is_deterministic() {
    let kind = QuestionKind::parse(&multiple_choice()).expect("valid definition");
    let answer = json!("B");

    let first = grade(&kind, Some(&answer), 7.5);
    let second = grade(&kind, Some(&answer), 7.5);
    assert_eq!(first, second);
}

#[test]
fn scores_stay_within_bounds() {
    let definitions = [
        multiple_choice(),
        json!({ "type": "numeric", "correct_value": 3.0 }),
        json!({ "type": "essay" }),
    ];
    let answers = [json!("B"), json!(99), json!("text")];

    for (definition, answer) in definitions.iter().zip(&answers) {
        let kind = QuestionKind::parse(definition).expect("valid definition");
        let result = grade(&kind, Some(answer), 10.0);
        assert!(result.score_earned >= 0.0);
        assert!(result.score_earned <= result.score_max);
    }
}

#[test]
fn missing_type_is_invalid() {
    let err = QuestionKind::parse(&json!({ "alternatives": [] })).unwrap_err();
    assert!(matches!(err, CorrectionError::InvalidQuestion(_)));
}

#[test]
fn unknown_type_is_unsupported() {
    let err = QuestionKind::parse(&json!({ "type": "matching_columns" })).unwrap_err();
    match err {
        CorrectionError::UnsupportedQuestionType(kind) => assert_eq!(kind, "matching_columns"),
        other => panic!("expected UnsupportedQuestionType, got {other:?}"),
    }
}

#[test]
fn malformed_payload_is_invalid() {
    let err = QuestionKind::parse(&json!({ "type": "numeric" })).unwrap_err();
    assert!(matches!(err, CorrectionError::InvalidQuestion(_)));
}

#[test]
fn override_takes_precedence_over_question_max() {
    assert_eq!(effective_max_score(10.0, Some(20.0)), 20.0);
    assert_eq!(effective_max_score(10.0, None), 10.0);
    assert_eq!(effective_max_score(10.0, Some(0.0)), 0.0);
}

#[test]
fn invalid_scores_collapse_to_safe_defaults() {
    assert_eq!(effective_max_score(10.0, Some(-1.0)), 10.0);
    assert_eq!(effective_max_score(10.0, Some(f64::NAN)), 10.0);
    assert_eq!(effective_max_score(-5.0, None), 0.0);
    assert_eq!(effective_max_score(f64::INFINITY, None), 0.0);
}

#[test]
fn grade_document_runs_the_whole_pipeline() {
    let result = grade_document(&multiple_choice(), 10.0, Some(&json!("B")), Some(4.0))
        .expect("gradable document");
    assert!(result.is_correct);
    assert_eq!(result.score_earned, 4.0);
    assert_eq!(result.score_max, 4.0);

    let err = grade_document(&json!({ "type": "riddle" }), 10.0, Some(&json!("x")), None);
    assert!(matches!(
        err,
        Err(CorrectionError::UnsupportedQuestionType(_))
    ));
}
