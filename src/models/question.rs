// src/models/question.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::prelude::FromRow;
use url::Url;
use validator::Validate;

use crate::correction::{CorrectionError, QuestionKind};

/// Represents the 'questions' table in the database.
///
/// The per-type payload lives in `definition`, a document tagged by `type`
/// (see `correction::QuestionKind`). The answer key stays inside it, so this
/// struct must never be serialized into learner-facing responses directly;
/// use `PublicQuestion` for that.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    /// The teacher who authored the question.
    pub author_id: i64,

    /// Question statement, sanitized HTML.
    pub statement: String,

    /// Optional illustration attached to the statement.
    pub image_url: Option<String>,

    /// Tagged per-type definition document.
    pub definition: Value,

    /// Default scoring unit; assessments may override it per slot.
    pub max_score: f64,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for sending a question to learners (answer key stripped).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub statement: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    /// Per-type selectable content (alternatives, statements, propositions)
    /// without correctness flags. Null for numeric and essay questions.
    #[serde(skip_serializing_if = "Value::is_null")]
    pub choices: Value,
    pub max_score: f64,
}

impl PublicQuestion {
    /// Builds the learner view, applying the effective max score for the
    /// assessment slot the question appears in.
    pub fn from_question(question: &Question, max_score: f64) -> Result<Self, CorrectionError> {
        let kind = QuestionKind::parse(&question.definition)?;
        Ok(Self {
            id: question.id,
            statement: question.statement.clone(),
            image_url: question.image_url.clone(),
            kind: kind.name().to_string(),
            choices: kind.public_payload(),
            max_score,
        })
    }
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 10000))]
    pub statement: String,
    #[validate(custom(function = validate_url_string))]
    pub image_url: Option<String>,
    /// Tagged definition document; parsed and rejected before insertion.
    pub definition: Value,
    #[validate(custom(function = validate_score))]
    pub max_score: f64,
}

/// DTO for updating a question. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuestionRequest {
    #[validate(length(min = 1, max = 10000))]
    pub statement: Option<String>,
    #[validate(custom(function = validate_url_string))]
    pub image_url: Option<String>,
    pub definition: Option<Value>,
    #[validate(custom(function = validate_score))]
    pub max_score: Option<f64>,
}

/// Validates that a string is a correctly formatted URL.
fn validate_url_string(url: &str) -> Result<(), validator::ValidationError> {
    if url.len() > 500 {
        return Err(validator::ValidationError::new("url_too_long"));
    }
    if Url::parse(url).is_err() {
        return Err(validator::ValidationError::new("invalid_url"));
    }
    Ok(())
}

/// Scores must be finite and non-negative.
fn validate_score(score: f64) -> Result<(), validator::ValidationError> {
    if !score.is_finite() || score < 0.0 {
        return Err(validator::ValidationError::new("invalid_score"));
    }
    Ok(())
}
