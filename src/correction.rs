// src/correction.rs

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;

/// Question types the engine knows how to grade automatically
/// (`essay` is recognized but always deferred to manual grading).
pub const QUESTION_TYPES: [&str; 5] = [
    "multiple_choice",
    "true_false_set",
    "proposition_set",
    "numeric",
    "essay",
];

/// Errors produced while turning a stored question document into a gradable
/// definition, or while resolving a question during batch grading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrectionError {
    /// The question document is malformed (missing type, bad payload).
    InvalidQuestion(String),
    /// The question type is not in the recognized set.
    UnsupportedQuestionType(String),
    /// The referenced question does not exist (batch grading).
    QuestionNotFound(i64),
}

impl fmt::Display for CorrectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrectionError::InvalidQuestion(msg) => write!(f, "Invalid question: {}", msg),
            CorrectionError::UnsupportedQuestionType(kind) => {
                write!(f, "Unsupported question type '{}'", kind)
            }
            CorrectionError::QuestionNotFound(id) => write!(f, "Question {} not found", id),
        }
    }
}

impl std::error::Error for CorrectionError {}

/// One selectable alternative of a multiple-choice question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alternative {
    pub letter: String,
    pub text: String,
    #[serde(default)]
    pub correct: bool,
}

/// One statement of a true/false set, judged independently by the learner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
    pub text: String,
    #[serde(default)]
    pub correct: bool,
}

/// One proposition of a summation-marked set. Values are conventionally
/// distinct powers of two so the submitted sum encodes the selected subset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposition {
    pub value: u32,
    pub text: String,
    #[serde(default)]
    pub correct: bool,
}

/// Tagged per-type question definition, as stored in the question document.
///
/// The document keeps the discriminator in a `type` field
/// (e.g. `{"type": "numeric", "correct_value": 15.5, "error_margin": 0.5}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice { alternatives: Vec<Alternative> },
    TrueFalseSet { statements: Vec<Statement> },
    PropositionSet { propositions: Vec<Proposition> },
    Numeric {
        correct_value: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error_margin: Option<f64>,
    },
    Essay,
}

impl QuestionKind {
    /// Parses a stored question document into a typed definition.
    ///
    /// Distinguishes the two client-error cases the graders care about:
    /// a document with no `type` at all versus a `type` outside the
    /// recognized set.
    pub fn parse(document: &Value) -> Result<Self, CorrectionError> {
        let kind = document
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                CorrectionError::InvalidQuestion("question definition has no type field".into())
            })?;

        if !QUESTION_TYPES.contains(&kind) {
            return Err(CorrectionError::UnsupportedQuestionType(kind.to_string()));
        }

        serde_json::from_value(document.clone()).map_err(|e| {
            CorrectionError::InvalidQuestion(format!("malformed '{}' payload: {}", kind, e))
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice { .. } => "multiple_choice",
            QuestionKind::TrueFalseSet { .. } => "true_false_set",
            QuestionKind::PropositionSet { .. } => "proposition_set",
            QuestionKind::Numeric { .. } => "numeric",
            QuestionKind::Essay => "essay",
        }
    }

    /// Learner-facing view of the definition with the answer key stripped.
    pub fn public_payload(&self) -> Value {
        match self {
            QuestionKind::MultipleChoice { alternatives } => json!(
                alternatives
                    .iter()
                    .map(|alt| json!({ "letter": alt.letter, "text": alt.text }))
                    .collect::<Vec<_>>()
            ),
            QuestionKind::TrueFalseSet { statements } => json!(
                statements
                    .iter()
                    .map(|st| json!({ "text": st.text }))
                    .collect::<Vec<_>>()
            ),
            QuestionKind::PropositionSet { propositions } => json!(
                propositions
                    .iter()
                    .map(|p| json!({ "value": p.value, "text": p.text }))
                    .collect::<Vec<_>>()
            ),
            QuestionKind::Numeric { .. } | QuestionKind::Essay => Value::Null,
        }
    }
}

/// Output of grading one answer against one question definition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GradedResult {
    pub is_correct: bool,
    pub score_earned: f64,
    pub score_max: f64,
}

/// Resolves the max score for one graded answer: an explicit per-assessment
/// override wins over the question's own max score; anything non-finite or
/// negative collapses to zero.
pub fn effective_max_score(question_max: f64, override_max: Option<f64>) -> f64 {
    if let Some(max) = override_max {
        if max.is_finite() && max >= 0.0 {
            return max;
        }
    }
    if question_max.is_finite() && question_max >= 0.0 {
        question_max
    } else {
        0.0
    }
}

/// Grades one raw answer against a typed question definition.
///
/// Pure and deterministic. A missing or shape-mismatched answer grades as
/// incorrect with zero score; callers always get a result for every
/// submitted answer. Scores satisfy `0 <= score_earned <= score_max`.
pub fn grade(kind: &QuestionKind, answer: Option<&Value>, max_score: f64) -> GradedResult {
    let answer = match answer {
        Some(value) if !value.is_null() => value,
        _ => {
            return GradedResult {
                is_correct: false,
                score_earned: 0.0,
                score_max: max_score,
            };
        }
    };

    let is_correct = match kind {
        // Essays wait for manual grading; the max is recorded as the ceiling.
        QuestionKind::Essay => false,

        QuestionKind::MultipleChoice { alternatives } => {
            match alternatives.iter().find(|alt| alt.correct) {
                Some(key) => answer
                    .as_str()
                    .map(str::trim)
                    .is_some_and(|s| s == key.letter || s == key.text),
                None => {
                    tracing::warn!("multiple choice question has no alternative marked correct");
                    false
                }
            }
        }

        QuestionKind::TrueFalseSet { statements } => match answer.as_array() {
            Some(judgments) => {
                judgments.len() == statements.len()
                    && statements
                        .iter()
                        .zip(judgments)
                        .all(|(st, judged)| judged.as_bool() == Some(st.correct))
            }
            None => false,
        },

        QuestionKind::PropositionSet { propositions } => {
            let key: u32 = propositions.iter().filter(|p| p.correct).map(|p| p.value).sum();
            numeric_answer(answer).is_some_and(|v| v == f64::from(key))
        }

        QuestionKind::Numeric {
            correct_value,
            error_margin,
        } => {
            let margin = error_margin.unwrap_or(0.0);
            numeric_answer(answer).is_some_and(|v| (v - correct_value).abs() <= margin)
        }
    };

    GradedResult {
        is_correct,
        score_earned: if is_correct { max_score } else { 0.0 },
        score_max: max_score,
    }
}

/// Grades one answer against a stored question document in a single step:
/// parse the definition, resolve the max score, grade.
pub fn grade_document(
    definition: &Value,
    question_max: f64,
    answer: Option<&Value>,
    override_max: Option<f64>,
) -> Result<GradedResult, CorrectionError> {
    let kind = QuestionKind::parse(definition)?;
    Ok(grade(
        &kind,
        answer,
        effective_max_score(question_max, override_max),
    ))
}

/// Numeric inputs arrive both as JSON numbers and as strings.
fn numeric_answer(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
