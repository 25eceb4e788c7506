// src/services/submission.rs

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::correction::{self, CorrectionError};
use crate::error::AppError;
use crate::models::assessment::{Assessment, AssessmentKind};
use crate::models::question::Question;
use crate::models::submission::{GradedAnswer, Submission, SubmissionError};
use crate::services::analytics::{self, AssessmentAnalytics};
use crate::store::{AssessmentStore, QuestionStore, SubmissionStore};

/// One answer in a batch submit request.
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerInput {
    pub question_id: i64,
    pub answer: Value,
}

/// Per-item outcome of a batch grading pass. One bad item never aborts the
/// batch; it is reported here and the remaining items proceed.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchItem {
    Graded {
        question_id: i64,
        is_correct: bool,
        score_earned: f64,
        score_max: f64,
    },
    Skipped {
        question_id: i64,
        error: String,
    },
}

/// Result of one batch submit: the updated submission plus per-item
/// outcomes and saved/skipped counts.
#[derive(Debug)]
pub struct BatchOutcome {
    pub submission: Submission,
    pub items: Vec<BatchItem>,
    pub saved: usize,
    pub skipped: usize,
}

/// Coordinates grading, submission state, and analytics over injected
/// storage collaborators. Handlers construct it once at startup and clone
/// it per request (all fields are shared handles).
///
/// Record and finalize calls for the same (learner, assessment) pair
/// serialize on a per-pair mutex, so a late answer write cannot interleave
/// with a finalize. Analytics reads take no lock and tolerate in-flight
/// finalizations.
#[derive(Clone)]
pub struct SubmissionService {
    questions: Arc<dyn QuestionStore>,
    assessments: Arc<dyn AssessmentStore>,
    submissions: Arc<dyn SubmissionStore>,
    locks: Arc<Mutex<HashMap<(i64, i64), Arc<tokio::sync::Mutex<()>>>>>,
}

impl SubmissionService {
    pub fn new(
        questions: Arc<dyn QuestionStore>,
        assessments: Arc<dyn AssessmentStore>,
        submissions: Arc<dyn SubmissionStore>,
    ) -> Self {
        Self {
            questions,
            assessments,
            submissions,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn lock_for(&self, learner_id: i64, assessment_id: i64) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().expect("submission lock table poisoned");
        locks
            .entry((learner_id, assessment_id))
            .or_default()
            .clone()
    }

    pub async fn assessment(&self, id: i64) -> Result<Option<Assessment>, AppError> {
        Ok(self.assessments.get(id).await?)
    }

    pub async fn questions(&self, ids: &[i64]) -> Result<HashMap<i64, Question>, AppError> {
        let questions = self.questions.get_many(ids).await?;
        Ok(questions.into_iter().map(|q| (q.id, q)).collect())
    }

    pub async fn submission(
        &self,
        learner_id: i64,
        assessment_id: i64,
    ) -> Result<Option<Submission>, AppError> {
        Ok(self.submissions.get(learner_id, assessment_id).await?)
    }

    /// Idempotent: an existing submission for the pair is returned as-is
    /// (same `started_at`); otherwise a fresh IN_PROGRESS one is created.
    pub async fn start_submission(
        &self,
        learner_id: i64,
        assessment_id: i64,
        kind: AssessmentKind,
    ) -> Result<Submission, AppError> {
        if let Some(existing) = self.submissions.get(learner_id, assessment_id).await? {
            return Ok(existing);
        }

        let submission = Submission::new(learner_id, assessment_id, kind, Utc::now());
        self.submissions.upsert(&submission).await?;
        Ok(submission)
    }

    /// Grades and records a batch of answers for one learner/assessment.
    ///
    /// The finalized check happens at this boundary before any answer is
    /// accepted; a finalized submission rejects the whole request. Within
    /// the batch, items that fail to resolve or grade are skipped and
    /// counted while the rest proceed. With `finalize` set, the submission
    /// is closed in the same pass after the answers are recorded.
    pub async fn submit_answers(
        &self,
        learner_id: i64,
        assessment_id: i64,
        answers: Vec<AnswerInput>,
        finalize: bool,
    ) -> Result<BatchOutcome, AppError> {
        let assessment = self
            .assessments
            .get(assessment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Assessment not found".to_string()))?;

        let lock = self.lock_for(learner_id, assessment_id);
        let _guard = lock.lock().await;

        let mut submission = match self.submissions.get(learner_id, assessment_id).await? {
            Some(existing) => {
                if existing.is_finalized() {
                    return Err(SubmissionError::Finalized.into());
                }
                existing
            }
            None => Submission::new(learner_id, assessment_id, assessment.kind, Utc::now()),
        };

        let question_set: HashSet<i64> = assessment.question_ids().into_iter().collect();
        let overrides = assessment.score_overrides();

        let requested: Vec<i64> = answers
            .iter()
            .map(|a| a.question_id)
            .filter(|id| question_set.contains(id))
            .collect();
        let questions = self.questions.get_many(&requested).await?;
        let question_map: HashMap<i64, &Question> =
            questions.iter().map(|q| (q.id, q)).collect();

        let now = Utc::now();
        let mut items = Vec::with_capacity(answers.len());
        let mut saved = 0;
        let mut skipped = 0;

        for input in &answers {
            let graded = grade_item(input, &question_set, &question_map, &overrides, now);
            match graded {
                Ok(answer) => {
                    items.push(BatchItem::Graded {
                        question_id: answer.question_id,
                        is_correct: answer.is_correct,
                        score_earned: answer.score_earned,
                        score_max: answer.score_max,
                    });
                    submission.record_answer(answer)?;
                    saved += 1;
                }
                Err(err) => {
                    tracing::warn!(
                        question_id = input.question_id,
                        "skipping answer: {}",
                        err
                    );
                    items.push(BatchItem::Skipped {
                        question_id: input.question_id,
                        error: err.to_string(),
                    });
                    skipped += 1;
                }
            }
        }

        if finalize {
            submission.finalize(Utc::now())?;
        }

        self.submissions.upsert(&submission).await?;

        Ok(BatchOutcome {
            submission,
            items,
            saved,
            skipped,
        })
    }

    /// Closes the submission. A second finalize is a hard error, as is
    /// finalizing before any answer was ever posted.
    pub async fn finalize_submission(
        &self,
        learner_id: i64,
        assessment_id: i64,
    ) -> Result<Submission, AppError> {
        let lock = self.lock_for(learner_id, assessment_id);
        let _guard = lock.lock().await;

        let mut submission = self
            .submissions
            .get(learner_id, assessment_id)
            .await?
            .ok_or(SubmissionError::NotFound)?;

        // Checked here at the ingestion boundary, mirroring the check that
        // guards answer recording.
        if submission.is_finalized() {
            return Err(SubmissionError::AlreadyFinalized.into());
        }

        submission.finalize(Utc::now())?;
        self.submissions.upsert(&submission).await?;
        Ok(submission)
    }

    /// Dashboard statistics over the assessment's finalized submissions.
    pub async fn assessment_analytics(
        &self,
        assessment_id: i64,
    ) -> Result<AssessmentAnalytics, AppError> {
        let assessment = self
            .assessments
            .get(assessment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Assessment not found".to_string()))?;

        let questions = self.questions(&assessment.question_ids()).await?;
        let submissions = self.submissions.list_finalized(assessment_id).await?;

        Ok(analytics::compute(&assessment, &questions, &submissions))
    }
}

/// Grades one batch item against the assessment's question set. Failures
/// here are per-item: the caller records them and moves on.
fn grade_item(
    input: &AnswerInput,
    question_set: &HashSet<i64>,
    questions: &HashMap<i64, &Question>,
    overrides: &HashMap<i64, f64>,
    now: chrono::DateTime<Utc>,
) -> Result<GradedAnswer, CorrectionError> {
    if !question_set.contains(&input.question_id) {
        return Err(CorrectionError::QuestionNotFound(input.question_id));
    }
    let question = questions
        .get(&input.question_id)
        .ok_or(CorrectionError::QuestionNotFound(input.question_id))?;

    let result = correction::grade_document(
        &question.definition,
        question.max_score,
        Some(&input.answer),
        overrides.get(&input.question_id).copied(),
    )?;

    Ok(GradedAnswer {
        question_id: input.question_id,
        answer: input.answer.clone(),
        is_correct: result.is_correct,
        score_earned: result.score_earned,
        score_max: result.score_max,
        graded_at: now,
    })
}
