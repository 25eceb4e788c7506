// src/handlers/assessment.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use sqlx::prelude::FromRow;
use sqlx::types::Json as SqlJson;
use validator::Validate;

use crate::{
    error::AppError,
    models::assessment::CreateAssessmentRequest,
    models::question::PublicQuestion,
    services::submission::SubmissionService,
    utils::jwt::Claims,
};

/// Summary row for assessment listings.
#[derive(Debug, serde::Serialize, FromRow)]
pub struct AssessmentSummary {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub kind: String,
    pub question_count: i64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Lists assessments: teachers see the ones they authored, students see
/// everything published.
pub async fn list_assessments(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let base = r#"
        SELECT id, author_id, title, kind,
               jsonb_array_length(slots)::BIGINT AS question_count,
               created_at
        FROM assessments
    "#;

    let summaries = if claims.role == "teacher" {
        sqlx::query_as::<_, AssessmentSummary>(&format!(
            "{} WHERE author_id = $1 ORDER BY id DESC",
            base
        ))
        .bind(claims.user_id())
        .fetch_all(&pool)
        .await?
    } else {
        sqlx::query_as::<_, AssessmentSummary>(&format!("{} ORDER BY id DESC", base))
            .fetch_all(&pool)
            .await?
    };

    Ok(Json(summaries))
}

/// Creates a new assessment from an ordered list of question slots.
///
/// Every referenced question must exist; slot max scores override the
/// questions' own max scores for this assessment only.
pub async fn create_assessment(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateAssessmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if claims.role != "teacher" {
        return Err(AppError::Forbidden(
            "Only teachers can create assessments".to_string(),
        ));
    }

    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let question_ids: Vec<i64> = payload.questions.iter().map(|s| s.question_id).collect();

    let known: Vec<i64> =
        sqlx::query_scalar::<_, i64>("SELECT id FROM questions WHERE id = ANY($1)")
            .bind(&question_ids)
            .fetch_all(&pool)
            .await?;

    if known.len() != question_ids.len() {
        let missing: Vec<i64> = question_ids
            .iter()
            .copied()
            .filter(|id| !known.contains(id))
            .collect();
        return Err(AppError::BadRequest(format!(
            "Unknown question ids: {:?}",
            missing
        )));
    }

    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO assessments (author_id, title, description, kind, slots)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(claims.user_id())
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(payload.kind.as_str())
    .bind(SqlJson(&payload.questions))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create assessment: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

/// Retrieves one assessment with its questions in slot order.
///
/// Learners get the public view with answer keys stripped; the authoring
/// teacher additionally receives the full question documents.
pub async fn get_assessment(
    State(service): State<SubmissionService>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let assessment = service
        .assessment(id)
        .await?
        .ok_or(AppError::NotFound("Assessment not found".to_string()))?;

    let questions = service.questions(&assessment.question_ids()).await?;

    let mut views = Vec::with_capacity(assessment.slots.len());
    let mut total_max = 0.0;
    for slot in &assessment.slots {
        let Some(question) = questions.get(&slot.question_id) else {
            tracing::warn!(
                question_id = slot.question_id,
                assessment_id = assessment.id,
                "assessment references a missing question"
            );
            continue;
        };
        let max_score = slot.max_score.unwrap_or(question.max_score);
        match PublicQuestion::from_question(question, max_score) {
            Ok(view) => {
                total_max += max_score;
                views.push(view);
            }
            Err(e) => {
                tracing::warn!(question_id = question.id, "skipping unrenderable question: {}", e);
            }
        }
    }

    let is_author = claims.role == "teacher" && claims.user_id() == assessment.author_id;

    let mut body = serde_json::json!({
        "id": assessment.id,
        "title": assessment.title,
        "description": assessment.description,
        "kind": assessment.kind,
        "total_max": total_max,
        "questions": views,
    });

    if is_author {
        // Authors see the stored definitions, answer keys included.
        let full: Vec<_> = assessment
            .slots
            .iter()
            .filter_map(|slot| questions.get(&slot.question_id))
            .collect();
        body["answer_key"] = serde_json::to_value(full)?;
    }

    Ok(Json(body))
}
