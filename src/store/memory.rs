// src/store/memory.rs

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{AssessmentStore, QuestionStore, StoreError, SubmissionStore};
use crate::models::assessment::Assessment;
use crate::models::question::Question;
use crate::models::submission::Submission;

/// In-memory implementation of the storage traits so the submission service
/// can be exercised in isolation (tests, local experiments).
#[derive(Clone, Default)]
pub struct MemoryStore {
    questions: Arc<RwLock<HashMap<i64, Question>>>,
    assessments: Arc<RwLock<HashMap<i64, Assessment>>>,
    submissions: Arc<RwLock<HashMap<(i64, i64), Submission>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_question(&self, question: Question) {
        self.questions
            .write()
            .expect("question lock poisoned")
            .insert(question.id, question);
    }

    pub fn insert_assessment(&self, assessment: Assessment) {
        self.assessments
            .write()
            .expect("assessment lock poisoned")
            .insert(assessment.id, assessment);
    }
}

#[async_trait]
impl QuestionStore for MemoryStore {
    async fn get(&self, id: i64) -> Result<Option<Question>, StoreError> {
        Ok(self
            .questions
            .read()
            .expect("question lock poisoned")
            .get(&id)
            .cloned())
    }

    async fn get_many(&self, ids: &[i64]) -> Result<Vec<Question>, StoreError> {
        let questions = self.questions.read().expect("question lock poisoned");
        Ok(ids.iter().filter_map(|id| questions.get(id).cloned()).collect())
    }
}

#[async_trait]
impl AssessmentStore for MemoryStore {
    async fn get(&self, id: i64) -> Result<Option<Assessment>, StoreError> {
        Ok(self
            .assessments
            .read()
            .expect("assessment lock poisoned")
            .get(&id)
            .cloned())
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn get(
        &self,
        learner_id: i64,
        assessment_id: i64,
    ) -> Result<Option<Submission>, StoreError> {
        Ok(self
            .submissions
            .read()
            .expect("submission lock poisoned")
            .get(&(learner_id, assessment_id))
            .cloned())
    }

    async fn upsert(&self, submission: &Submission) -> Result<(), StoreError> {
        self.submissions
            .write()
            .expect("submission lock poisoned")
            .insert(
                (submission.learner_id, submission.assessment_id),
                submission.clone(),
            );
        Ok(())
    }

    async fn list_finalized(&self, assessment_id: i64) -> Result<Vec<Submission>, StoreError> {
        Ok(self
            .submissions
            .read()
            .expect("submission lock poisoned")
            .values()
            .filter(|s| s.assessment_id == assessment_id && s.is_finalized())
            .cloned()
            .collect())
    }
}
