// src/handlers/question.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    correction::QuestionKind,
    error::AppError,
    models::question::{CreateQuestionRequest, Question, UpdateQuestionRequest},
    utils::{html::clean_html, jwt::Claims},
};

/// Lists the authenticated teacher's questions, newest first.
pub async fn list_questions(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, author_id, statement, image_url, definition, max_score, created_at
        FROM questions
        WHERE author_id = $1
        ORDER BY id DESC
        "#,
    )
    .bind(claims.user_id())
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list questions: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(questions))
}

/// Creates a new question owned by the authenticated teacher.
///
/// The definition document is parsed up front so malformed or unsupported
/// types are rejected before anything is stored.
pub async fn create_question(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    QuestionKind::parse(&payload.definition)?;

    let statement = clean_html(&payload.statement);

    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO questions (author_id, statement, image_url, definition, max_score)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(claims.user_id())
    .bind(&statement)
    .bind(&payload.image_url)
    .bind(&payload.definition)
    .bind(payload.max_score)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

/// Retrieves a single question by ID. Authors only see their own.
pub async fn get_question(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let question = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, author_id, statement, image_url, definition, max_score, created_at
        FROM questions
        WHERE id = $1 AND author_id = $2
        "#,
    )
    .bind(id)
    .bind(claims.user_id())
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Question not found".to_string()))?;

    Ok(Json(question))
}

/// Updates a question by ID. Fields are optional; author-scoped.
pub async fn update_question(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if payload.statement.is_none()
        && payload.image_url.is_none()
        && payload.definition.is_none()
        && payload.max_score.is_none()
    {
        return Ok(StatusCode::OK);
    }

    if let Some(definition) = &payload.definition {
        QuestionKind::parse(definition)?;
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE questions SET ");
    let mut separated = builder.separated(", ");

    if let Some(statement) = payload.statement {
        separated.push("statement = ");
        separated.push_bind_unseparated(clean_html(&statement));
    }

    if let Some(image_url) = payload.image_url {
        separated.push("image_url = ");
        separated.push_bind_unseparated(image_url);
    }

    if let Some(definition) = payload.definition {
        separated.push("definition = ");
        separated.push_bind_unseparated(definition);
    }

    if let Some(max_score) = payload.max_score {
        separated.push("max_score = ");
        separated.push_bind_unseparated(max_score);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" AND author_id = ");
    builder.push_bind(claims.user_id());

    let result = builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deletes a question by ID. Author-scoped.
pub async fn delete_question(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM questions WHERE id = $1 AND author_id = $2")
        .bind(id)
        .bind(claims.user_id())
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete question: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
