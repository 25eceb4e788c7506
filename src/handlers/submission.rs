// src/handlers/submission.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;

use crate::{
    error::AppError,
    services::submission::{AnswerInput, SubmissionService},
    utils::jwt::Claims,
};

/// DTO for submitting a batch of answers.
#[derive(Debug, Deserialize)]
pub struct SubmitAnswersRequest {
    pub answers: Vec<AnswerInput>,
    /// When set, the submission is finalized in the same request after the
    /// answers are recorded.
    #[serde(default)]
    pub finalize: bool,
}

/// Submits a learner's answers to an assessment.
///
/// Each answer is graded against the stored question and upserted into the
/// learner's submission, keyed by question id. Items that fail to grade are
/// skipped and reported; the rest of the batch proceeds. Finalized
/// submissions reject the whole request.
pub async fn submit_answers(
    State(service): State<SubmissionService>,
    Extension(claims): Extension<Claims>,
    Path(assessment_id): Path<i64>,
    Json(payload): Json<SubmitAnswersRequest>,
) -> Result<impl IntoResponse, AppError> {
    if claims.role != "student" {
        return Err(AppError::Forbidden(
            "Only students can submit answers".to_string(),
        ));
    }

    if payload.answers.is_empty() {
        return Err(AppError::BadRequest("No answers submitted".to_string()));
    }

    let outcome = service
        .submit_answers(
            claims.user_id(),
            assessment_id,
            payload.answers,
            payload.finalize,
        )
        .await?;

    Ok(Json(json!({
        "saved": outcome.saved,
        "skipped": outcome.skipped,
        "items": outcome.items,
        "total_earned": outcome.submission.total_earned,
        "total_max": outcome.submission.total_max,
        "finalized": outcome.submission.is_finalized(),
    })))
}

/// Finalizes the learner's submission for an assessment.
///
/// Finalization is terminal: answers can no longer be modified, and a
/// second finalize request is rejected with a conflict.
pub async fn finalize_submission(
    State(service): State<SubmissionService>,
    Extension(claims): Extension<Claims>,
    Path(assessment_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if claims.role != "student" {
        return Err(AppError::Forbidden(
            "Only students can finalize submissions".to_string(),
        ));
    }

    let submission = service
        .finalize_submission(claims.user_id(), assessment_id)
        .await?;

    Ok(Json(json!({
        "status": submission.status,
        "finalized_at": submission.finalized_at,
        "total_earned": submission.total_earned,
        "total_max": submission.total_max,
    })))
}

/// Returns the learner's own submission for an assessment: the raw answers,
/// the per-question correction results, and the running totals.
pub async fn get_own_submission(
    State(service): State<SubmissionService>,
    Extension(claims): Extension<Claims>,
    Path(assessment_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let submission = service
        .submission(claims.user_id(), assessment_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound("No submission found for this assessment".to_string())
        })?;

    let mut answers = BTreeMap::new();
    let mut correction = BTreeMap::new();
    for (question_id, graded) in &submission.answers {
        answers.insert(*question_id, graded.answer.clone());
        correction.insert(
            *question_id,
            json!({
                "is_correct": graded.is_correct,
                "score_earned": graded.score_earned,
                "score_max": graded.score_max,
            }),
        );
    }

    Ok(Json(json!({
        "status": submission.status,
        "started_at": submission.started_at,
        "finalized_at": submission.finalized_at,
        "answers": answers,
        "correction": correction,
        "total_earned": submission.total_earned,
        "total_max": submission.total_max,
    })))
}
