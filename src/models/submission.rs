// src/models/submission.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::assessment::AssessmentKind;

/// Submission lifecycle: `IN_PROGRESS --(finalize)--> FINALIZED`.
/// FINALIZED is terminal; there is no delete or cancel transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionStatus {
    #[serde(rename = "IN_PROGRESS")]
    InProgress,
    #[serde(rename = "FINALIZED")]
    Finalized,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::InProgress => "IN_PROGRESS",
            SubmissionStatus::Finalized => "FINALIZED",
        }
    }
}

impl FromStr for SubmissionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IN_PROGRESS" => Ok(SubmissionStatus::InProgress),
            "FINALIZED" => Ok(SubmissionStatus::Finalized),
            other => Err(format!("unknown submission status '{}'", other)),
        }
    }
}

/// State-machine violations on a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionError {
    /// Attempt to record an answer on a finalized submission.
    Finalized,
    /// Attempt to finalize a submission twice.
    AlreadyFinalized,
    /// No submission exists for the (learner, assessment) pair.
    NotFound,
}

impl fmt::Display for SubmissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionError::Finalized => {
                write!(f, "Submission has already been finalized and can no longer be modified")
            }
            SubmissionError::AlreadyFinalized => {
                write!(f, "Submission has already been finalized")
            }
            SubmissionError::NotFound => write!(f, "Submission not found"),
        }
    }
}

impl std::error::Error for SubmissionError {}

/// One graded answer inside a submission. Immutable once created; replaced
/// wholesale when the learner re-submits the question before finalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradedAnswer {
    pub question_id: i64,
    /// The raw answer exactly as submitted (letter, boolean array, number,
    /// or free text).
    pub answer: Value,
    pub is_correct: bool,
    pub score_earned: f64,
    pub score_max: f64,
    pub graded_at: DateTime<Utc>,
}

/// One learner's answer sheet for one assessment.
///
/// Unique per (learner, assessment). The cached totals always equal the
/// sums recomputed from `answers`; every mutation goes through
/// `record_answer`/`finalize`, which maintain that invariant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub learner_id: i64,
    pub assessment_id: i64,
    pub kind: AssessmentKind,
    pub status: SubmissionStatus,
    pub started_at: DateTime<Utc>,
    pub finalized_at: Option<DateTime<Utc>>,
    pub total_earned: f64,
    pub total_max: f64,
    /// Graded answers keyed by question id; one entry per question.
    pub answers: BTreeMap<i64, GradedAnswer>,
}

impl Submission {
    pub fn new(
        learner_id: i64,
        assessment_id: i64,
        kind: AssessmentKind,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            learner_id,
            assessment_id,
            kind,
            status: SubmissionStatus::InProgress,
            started_at: now,
            finalized_at: None,
            total_earned: 0.0,
            total_max: 0.0,
            answers: BTreeMap::new(),
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.status == SubmissionStatus::Finalized
    }

    /// Upserts one graded answer, keyed by question id, and refreshes the
    /// cached totals. Rejected once the submission is finalized.
    pub fn record_answer(&mut self, answer: GradedAnswer) -> Result<(), SubmissionError> {
        if self.is_finalized() {
            return Err(SubmissionError::Finalized);
        }
        self.answers.insert(answer.question_id, answer);
        self.recompute_totals();
        Ok(())
    }

    /// Transitions to FINALIZED, stamping `finalized_at` exactly once.
    pub fn finalize(&mut self, now: DateTime<Utc>) -> Result<(), SubmissionError> {
        if self.is_finalized() {
            return Err(SubmissionError::AlreadyFinalized);
        }
        self.recompute_totals();
        self.status = SubmissionStatus::Finalized;
        self.finalized_at = Some(now);
        Ok(())
    }

    pub fn recompute_totals(&mut self) {
        self.total_earned = self.answers.values().map(|a| a.score_earned).sum();
        self.total_max = self.answers.values().map(|a| a.score_max).sum();
    }

    /// Total score rescaled to 0-10 for display and class statistics.
    /// Guards the empty/zero-max case so it never divides by zero.
    pub fn normalized_score(&self) -> f64 {
        if self.total_max <= 0.0 {
            0.0
        } else {
            self.total_earned / self.total_max * 10.0
        }
    }
}
