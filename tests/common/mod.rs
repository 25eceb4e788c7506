// tests/common/mod.rs

use std::sync::Arc;

use acadia_backend::models::assessment::{Assessment, AssessmentKind, QuestionSlot};
use acadia_backend::models::question::Question;
use acadia_backend::services::submission::{AnswerInput, SubmissionService};
use acadia_backend::store::memory::MemoryStore;
use serde_json::{Value, json};

pub fn multiple_choice_question(id: i64, max_score: f64) -> Question {
    question(
        id,
        max_score,
        json!({
            "type": "multiple_choice",
            "alternatives": [
                { "letter": "A", "text": "Option A", "correct": false },
                { "letter": "B", "text": "Option B", "correct": true },
                { "letter": "C", "text": "Option C", "correct": false },
            ]
        }),
    )
}

pub fn numeric_question(id: i64, max_score: f64, correct_value: f64, error_margin: f64) -> Question {
    question(
        id,
        max_score,
        json!({
            "type": "numeric",
            "correct_value": correct_value,
            "error_margin": error_margin,
        }),
    )
}

pub fn essay_question(id: i64, max_score: f64) -> Question {
    question(id, max_score, json!({ "type": "essay" }))
}

pub fn question(id: i64, max_score: f64, definition: Value) -> Question {
    Question {
        id,
        author_id: 1,
        statement: format!("Question {id}"),
        image_url: None,
        definition,
        max_score,
        created_at: None,
    }
}

pub fn slot(question_id: i64) -> QuestionSlot {
    QuestionSlot {
        question_id,
        max_score: None,
    }
}

pub fn slot_with_max(question_id: i64, max_score: f64) -> QuestionSlot {
    QuestionSlot {
        question_id,
        max_score: Some(max_score),
    }
}

pub fn assessment(id: i64, slots: Vec<QuestionSlot>) -> Assessment {
    Assessment {
        id,
        author_id: 1,
        title: format!("Assessment {id}"),
        description: None,
        kind: AssessmentKind::Exam,
        slots,
        created_at: None,
    }
}

pub fn answer(question_id: i64, value: Value) -> AnswerInput {
    AnswerInput {
        question_id,
        answer: value,
    }
}

/// Builds a submission service whose three collaborators all point at the
/// same in-memory store.
pub fn service_over(store: &MemoryStore) -> SubmissionService {
    SubmissionService::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
    )
}
