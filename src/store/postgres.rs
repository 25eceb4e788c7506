// src/store/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, types::Json};
use std::collections::BTreeMap;
use std::str::FromStr;

use super::{AssessmentStore, QuestionStore, StoreError, SubmissionStore};
use crate::models::assessment::{Assessment, AssessmentKind, QuestionSlot};
use crate::models::question::Question;
use crate::models::submission::{GradedAnswer, Submission, SubmissionStatus};

// Queries are runtime-checked (`sqlx::query_as` + bind) rather than
// macro-checked, so the crate builds without a reachable database.

#[derive(FromRow)]
struct AssessmentRow {
    id: i64,
    author_id: i64,
    title: String,
    description: Option<String>,
    kind: String,
    slots: Json<Vec<QuestionSlot>>,
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<AssessmentRow> for Assessment {
    type Error = StoreError;

    fn try_from(row: AssessmentRow) -> Result<Self, Self::Error> {
        let kind = AssessmentKind::from_str(&row.kind).map_err(StoreError::Corrupt)?;
        Ok(Assessment {
            id: row.id,
            author_id: row.author_id,
            title: row.title,
            description: row.description,
            kind,
            slots: row.slots.0,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct SubmissionRow {
    learner_id: i64,
    assessment_id: i64,
    kind: String,
    status: String,
    started_at: DateTime<Utc>,
    finalized_at: Option<DateTime<Utc>>,
    total_earned: f64,
    total_max: f64,
    answers: Json<BTreeMap<i64, GradedAnswer>>,
}

impl TryFrom<SubmissionRow> for Submission {
    type Error = StoreError;

    fn try_from(row: SubmissionRow) -> Result<Self, Self::Error> {
        let kind = AssessmentKind::from_str(&row.kind).map_err(StoreError::Corrupt)?;
        let status = SubmissionStatus::from_str(&row.status).map_err(StoreError::Corrupt)?;
        Ok(Submission {
            learner_id: row.learner_id,
            assessment_id: row.assessment_id,
            kind,
            status,
            started_at: row.started_at,
            finalized_at: row.finalized_at,
            total_earned: row.total_earned,
            total_max: row.total_max,
            answers: row.answers.0,
        })
    }
}

#[derive(Clone)]
pub struct PgQuestionStore {
    pool: PgPool,
}

impl PgQuestionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuestionStore for PgQuestionStore {
    async fn get(&self, id: i64) -> Result<Option<Question>, StoreError> {
        let question = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, author_id, statement, image_url, definition, max_score, created_at
            FROM questions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(question)
    }

    async fn get_many(&self, ids: &[i64]) -> Result<Vec<Question>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let questions = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, author_id, statement, image_url, definition, max_score, created_at
            FROM questions
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(questions)
    }
}

#[derive(Clone)]
pub struct PgAssessmentStore {
    pool: PgPool,
}

impl PgAssessmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssessmentStore for PgAssessmentStore {
    async fn get(&self, id: i64) -> Result<Option<Assessment>, StoreError> {
        let row = sqlx::query_as::<_, AssessmentRow>(
            r#"
            SELECT id, author_id, title, description, kind, slots, created_at
            FROM assessments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Assessment::try_from).transpose()
    }
}

#[derive(Clone)]
pub struct PgSubmissionStore {
    pool: PgPool,
}

impl PgSubmissionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionStore for PgSubmissionStore {
    async fn get(
        &self,
        learner_id: i64,
        assessment_id: i64,
    ) -> Result<Option<Submission>, StoreError> {
        let row = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT learner_id, assessment_id, kind, status, started_at, finalized_at,
                   total_earned, total_max, answers
            FROM submissions
            WHERE learner_id = $1 AND assessment_id = $2
            "#,
        )
        .bind(learner_id)
        .bind(assessment_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Submission::try_from).transpose()
    }

    async fn upsert(&self, submission: &Submission) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO submissions
                (learner_id, assessment_id, kind, status, started_at, finalized_at,
                 total_earned, total_max, answers)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (learner_id, assessment_id) DO UPDATE SET
                status = EXCLUDED.status,
                finalized_at = EXCLUDED.finalized_at,
                total_earned = EXCLUDED.total_earned,
                total_max = EXCLUDED.total_max,
                answers = EXCLUDED.answers
            "#,
        )
        .bind(submission.learner_id)
        .bind(submission.assessment_id)
        .bind(submission.kind.as_str())
        .bind(submission.status.as_str())
        .bind(submission.started_at)
        .bind(submission.finalized_at)
        .bind(submission.total_earned)
        .bind(submission.total_max)
        .bind(Json(&submission.answers))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_finalized(&self, assessment_id: i64) -> Result<Vec<Submission>, StoreError> {
        let rows = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT learner_id, assessment_id, kind, status, started_at, finalized_at,
                   total_earned, total_max, answers
            FROM submissions
            WHERE assessment_id = $1 AND status = 'FINALIZED'
            "#,
        )
        .bind(assessment_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Submission::try_from).collect()
    }
}
