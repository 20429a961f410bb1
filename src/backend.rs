//! Contracts with the hosted backend
//!
//! A quiz attempt consumes exactly two services: a [`QuestionStore`] that
//! hands out the ordered questions of a quiz, and a [`ResultSink`] that
//! persists the final answers. Transport and storage details live behind
//! these traits. [`MemoryBackend`] implements both in memory.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, PoisonError},
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    error::{StoreError, SubmissionError},
    quiz::{
        AttemptId, QuestionId, QuizId, UserId,
        answers::{AnswerMap, OptionLabel},
        options::RawQuestion,
        question::Question,
    },
};

/// Supplies the ordered questions of a quiz
#[async_trait]
pub trait QuestionStore {
    /// Fetches the questions of `quiz_id` in presentation order
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the quiz has no questions, or
    /// another [`StoreError`] when the backend fails.
    async fn fetch_questions(&self, quiz_id: &QuizId) -> Result<Vec<Question>, StoreError>;
}

/// Persists the answers of a finished attempt
#[async_trait]
pub trait ResultSink {
    /// Stores `submission`, returning the backend's receipt
    ///
    /// # Errors
    ///
    /// Returns a [`SubmissionError`] if the answers were not persisted.
    async fn submit_answers(&self, submission: &Submission) -> Result<Receipt, SubmissionError>;
}

/// The answers of one attempt, as sent to a [`ResultSink`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// The attempt these answers belong to
    pub attempt_id: AttemptId,
    /// The quiz that was taken
    pub quiz_id: QuizId,
    /// The student who took it
    pub user_id: UserId,
    /// Selected option per question
    pub answers: AnswerMap,
}

/// Acknowledgement of a stored submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Whether the backend accepted the answers
    pub accepted: bool,
    /// Number of correct answers, `None` while scoring is deferred
    pub score: Option<u32>,
    /// Number of questions in the quiz
    pub total: u32,
}

#[derive(Debug, Default)]
struct MemoryData {
    banks: HashMap<QuizId, Vec<Question>>,
    answer_keys: HashMap<QuizId, HashMap<QuestionId, OptionLabel>>,
    submissions: Vec<Submission>,
    submitted: HashSet<(QuizId, UserId)>,
    failing: bool,
}

/// An in-memory question store and result sink
///
/// Scores submissions against the answer key when every question of the
/// quiz has one, and reports a deferred score otherwise. A second submission
/// by the same user for the same quiz is rejected.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    data: Arc<Mutex<MemoryData>>,
}

impl MemoryBackend {
    fn with_data<R>(&self, f: impl FnOnce(&mut MemoryData) -> R) -> R {
        let mut data = self.data.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut data)
    }

    /// Adds a question bank for `quiz_id`, replacing any previous one
    ///
    /// Answer keys recorded for an earlier bank of the same quiz are dropped.
    pub fn insert_quiz(&self, quiz_id: QuizId, questions: Vec<Question>) {
        self.with_data(|data| {
            data.answer_keys.remove(&quiz_id);
            data.banks.insert(quiz_id, questions);
        });
    }

    /// Adds a question bank from stored rows, recording their answer keys
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Malformed`] if any row cannot be normalized; no
    /// question of the bank is stored in that case.
    pub fn insert_raw_quiz(
        &self,
        quiz_id: QuizId,
        rows: Vec<RawQuestion>,
    ) -> Result<(), StoreError> {
        let mut keys = HashMap::new();
        let mut questions = Vec::with_capacity(rows.len());
        for mut row in rows {
            let key = row.correct_answer.take();
            let question = row.into_question()?;
            if let Some(label) = key.and_then(|k| k.parse::<OptionLabel>().ok()) {
                keys.insert(question.id().clone(), label);
            }
            questions.push(question);
        }
        self.with_data(|data| {
            data.answer_keys.insert(quiz_id.clone(), keys);
            data.banks.insert(quiz_id, questions);
        });
        Ok(())
    }

    /// Records the correct option of a question of `quiz_id`
    pub fn set_answer_key(&self, quiz_id: QuizId, question_id: QuestionId, label: OptionLabel) {
        self.with_data(|data| {
            data.answer_keys
                .entry(quiz_id)
                .or_default()
                .insert(question_id, label);
        });
    }

    /// Makes every following submission fail with a backend error
    pub fn set_failing(&self, failing: bool) {
        self.with_data(|data| data.failing = failing);
    }

    /// All submissions accepted so far, in arrival order
    pub fn submissions(&self) -> Vec<Submission> {
        self.with_data(|data| data.submissions.clone())
    }

    /// Whether `user_id` already submitted `quiz_id`
    pub fn has_submitted(&self, quiz_id: &QuizId, user_id: &UserId) -> bool {
        self.with_data(|data| data.submitted.contains(&(quiz_id.clone(), user_id.clone())))
    }
}

#[async_trait]
impl QuestionStore for MemoryBackend {
    async fn fetch_questions(&self, quiz_id: &QuizId) -> Result<Vec<Question>, StoreError> {
        self.with_data(|data| match data.banks.get(quiz_id) {
            Some(questions) if !questions.is_empty() => Ok(questions.clone()),
            _ => Err(StoreError::NotFound),
        })
    }
}

#[async_trait]
impl ResultSink for MemoryBackend {
    async fn submit_answers(&self, submission: &Submission) -> Result<Receipt, SubmissionError> {
        self.with_data(|data| {
            if data.failing {
                return Err(SubmissionError::Backend("backend unavailable".to_string()));
            }
            let questions = data.banks.get(&submission.quiz_id).ok_or_else(|| {
                SubmissionError::Rejected(format!("unknown quiz {}", submission.quiz_id))
            })?;
            let keys = data.answer_keys.get(&submission.quiz_id);
            if !data
                .submitted
                .insert((submission.quiz_id.clone(), submission.user_id.clone()))
            {
                return Err(SubmissionError::Duplicate);
            }

            let total = u32::try_from(questions.len()).unwrap_or(u32::MAX);
            let score = questions
                .iter()
                .map(|question| {
                    keys.and_then(|keys| keys.get(question.id()))
                        .map(|key| submission.answers.get(question.id()) == Some(*key))
                })
                .collect::<Option<Vec<bool>>>()
                .map(|marks| marks.into_iter().filter(|correct| *correct).count() as u32);

            data.submissions.push(submission.clone());
            Ok(Receipt {
                accepted: true,
                score,
                total,
            })
        })
    }
}
