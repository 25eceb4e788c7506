// src/models/assessment.rs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use validator::Validate;

/// Whether an assessment is a timed exam or a take-home exercise list.
/// Grading and aggregation treat both the same; the distinction drives
/// client presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssessmentKind {
    #[serde(rename = "EXAM")]
    Exam,
    #[serde(rename = "EXERCISE_LIST")]
    ExerciseList,
}

impl AssessmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentKind::Exam => "EXAM",
            AssessmentKind::ExerciseList => "EXERCISE_LIST",
        }
    }
}

impl FromStr for AssessmentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EXAM" => Ok(AssessmentKind::Exam),
            "EXERCISE_LIST" => Ok(AssessmentKind::ExerciseList),
            other => Err(format!("unknown assessment kind '{}'", other)),
        }
    }
}

/// One position in an assessment: a question reference plus an optional
/// per-assessment max score that overrides the question's own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSlot {
    pub question_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_score: Option<f64>,
}

/// Represents the 'assessments' table in the database.
/// Question order is the slot order; it drives the Q1..Qn analytics labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub kind: AssessmentKind,
    pub slots: Vec<QuestionSlot>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Assessment {
    pub fn question_ids(&self) -> Vec<i64> {
        self.slots.iter().map(|slot| slot.question_id).collect()
    }

    /// Per-question max score overrides declared by this assessment.
    pub fn score_overrides(&self) -> HashMap<i64, f64> {
        self.slots
            .iter()
            .filter_map(|slot| slot.max_score.map(|max| (slot.question_id, max)))
            .collect()
    }
}

/// DTO for creating a new assessment.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAssessmentRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub kind: AssessmentKind,
    #[validate(custom(function = validate_slots))]
    pub questions: Vec<QuestionSlot>,
}

/// Slots must be non-empty, reference each question at most once, and carry
/// finite non-negative overrides.
fn validate_slots(slots: &[QuestionSlot]) -> Result<(), validator::ValidationError> {
    if slots.is_empty() {
        return Err(validator::ValidationError::new("questions_cannot_be_empty"));
    }
    let mut seen = std::collections::HashSet::new();
    for slot in slots {
        if !seen.insert(slot.question_id) {
            return Err(validator::ValidationError::new("duplicate_question"));
        }
        if let Some(max) = slot.max_score {
            if !max.is_finite() || max < 0.0 {
                return Err(validator::ValidationError::new("invalid_score_override"));
            }
        }
    }
    Ok(())
}
