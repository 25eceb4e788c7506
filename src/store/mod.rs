// src/store/mod.rs

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::fmt;

use crate::models::assessment::Assessment;
use crate::models::question::Question;
use crate::models::submission::Submission;

/// Storage failures surfaced to the service layer. The service performs no
/// automatic retry; callers retry the whole operation.
#[derive(Debug)]
pub enum StoreError {
    /// The backing store could not be reached or rejected the operation.
    Unavailable(String),
    /// A stored document failed to decode into its domain type.
    Corrupt(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "store unavailable: {}", msg),
            StoreError::Corrupt(msg) => write!(f, "corrupt record: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// Question lookup used by grading. Narrow on purpose: authoring goes
/// through its own handlers, the grading path only ever reads.
#[async_trait]
pub trait QuestionStore: Send + Sync {
    async fn get(&self, id: i64) -> Result<Option<Question>, StoreError>;
    async fn get_many(&self, ids: &[i64]) -> Result<Vec<Question>, StoreError>;
}

#[async_trait]
pub trait AssessmentStore: Send + Sync {
    async fn get(&self, id: i64) -> Result<Option<Assessment>, StoreError>;
}

/// Submission persistence. One record per (learner, assessment) pair;
/// `upsert` replaces the whole record.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn get(
        &self,
        learner_id: i64,
        assessment_id: i64,
    ) -> Result<Option<Submission>, StoreError>;

    async fn upsert(&self, submission: &Submission) -> Result<(), StoreError>;

    /// All finalized submissions for an assessment, in no particular order.
    async fn list_finalized(&self, assessment_id: i64) -> Result<Vec<Submission>, StoreError>;
}
