// src/handlers/analytics.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    response::IntoResponse,
};

use crate::{error::AppError, services::submission::SubmissionService, utils::jwt::Claims};

/// Dashboard statistics for one assessment, computed on demand from its
/// finalized submissions. Restricted to the authoring teacher.
pub async fn assessment_analytics(
    State(service): State<SubmissionService>,
    Extension(claims): Extension<Claims>,
    Path(assessment_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let assessment = service
        .assessment(assessment_id)
        .await?
        .ok_or(AppError::NotFound("Assessment not found".to_string()))?;

    if claims.role != "teacher" || claims.user_id() != assessment.author_id {
        return Err(AppError::Forbidden(
            "Analytics are only visible to the assessment's author".to_string(),
        ));
    }

    let analytics = service.assessment_analytics(assessment_id).await?;

    Ok(Json(analytics))
}
