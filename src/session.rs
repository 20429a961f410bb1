//! The timed quiz attempt state machine
//!
//! A [`QuizSession`] is one student's single attempt at one quiz. It loads
//! the questions, tracks the cursor and the chosen answers, counts down the
//! remaining time and performs exactly one submission, whether that is
//! requested by the student or triggered by the countdown reaching zero.
//!
//! The session is single-use: once it has left [`Phase::Loading`] it cannot
//! be loaded again, and once it has left [`Phase::InProgress`] nothing but
//! the phase itself changes.

use enum_map::{Enum, EnumMap};
use garde::Validate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    backend::{QuestionStore, Receipt, ResultSink, Submission},
    constants::{quiz::MAX_QUESTION_COUNT, timer::SECONDS_PER_MINUTE},
    error::{SessionError, StoreError},
    quiz::{
        AttemptId, QuestionId, QuizId, UserId,
        answers::{AnswerMap, OptionLabel},
        question::Question,
    },
};

/// Lifecycle phase of a quiz session
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Phase {
    /// Waiting for the questions to be fetched
    #[default]
    Loading,
    /// Questions are shown and the countdown is running
    InProgress,
    /// The answers are being persisted
    Submitting,
    /// The answers were persisted
    Complete,
    /// Loading or submitting failed
    Error,
}

/// Whether a question has been answered yet
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Enum, Serialize, Deserialize)]
pub enum QuestionStatus {
    /// An option has been chosen
    Answered,
    /// No option has been chosen
    Unanswered,
}

/// One cell of the question navigator grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigatorEntry {
    /// Position of the question
    pub index: usize,
    /// 1-based number shown to the student
    pub number: usize,
    /// Whether the question has been answered
    pub status: QuestionStatus,
    /// Whether the cursor is on this question
    pub current: bool,
}

/// Result of a call to [`QuizSession::submit`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The session was not in progress, nothing was sent
    Ignored,
    /// The answers were persisted
    Completed(Receipt),
    /// Persisting the answers failed and the session is in [`Phase::Error`]
    Failed(String),
}

/// Result of a call to [`QuizSession::tick`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The session is not counting down
    Idle,
    /// One second was removed, this many remain
    Running(u64),
    /// The countdown reached zero and the answers were submitted
    Expired(SubmitOutcome),
}

/// Read-only view of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// The quiz being taken, once loading has started
    pub quiz_id: Option<QuizId>,
    /// Current phase
    pub phase: Phase,
    /// Index of the question being shown
    pub cursor: usize,
    /// The questions of the quiz
    pub questions: Vec<Question>,
    /// The chosen options so far
    pub answers: AnswerMap,
    /// Seconds left on the countdown
    pub remaining_seconds: u64,
    /// Receipt of a completed submission
    pub receipt: Option<Receipt>,
    /// Message describing why the session is in [`Phase::Error`]
    pub error: Option<String>,
}

/// A single timed attempt at a quiz
#[derive(Debug, Clone)]
pub struct QuizSession {
    attempt_id: AttemptId,
    user_id: UserId,
    quiz_id: Option<QuizId>,
    questions: Vec<Question>,
    cursor: usize,
    answers: AnswerMap,
    remaining_seconds: u64,
    phase: Phase,
    receipt: Option<Receipt>,
    error: Option<String>,
}

impl QuizSession {
    /// Creates a fresh session in [`Phase::Loading`] for `user_id`
    pub fn new(user_id: UserId) -> Self {
        Self {
            attempt_id: AttemptId::new(),
            user_id,
            quiz_id: None,
            questions: Vec::new(),
            cursor: 0,
            answers: AnswerMap::default(),
            remaining_seconds: 0,
            phase: Phase::Loading,
            receipt: None,
            error: None,
        }
    }

    /// Fetches the questions of `quiz_id` and starts the countdown
    ///
    /// On success the session is [`Phase::InProgress`] with the cursor on
    /// the first question, no answers, and `time_limit_minutes * 60`
    /// seconds on the clock. On failure it moves to [`Phase::Error`].
    ///
    /// # Errors
    ///
    /// * [`SessionError::AlreadyStarted`] if the session has left
    ///   [`Phase::Loading`]; the session is left untouched.
    /// * [`SessionError::NotFound`] if the quiz has no questions.
    /// * [`SessionError::InvalidTimeLimit`] if the time limit is zero.
    /// * [`SessionError::Store`] with [`StoreError::Malformed`] if the bank
    ///   is too large, repeats a question id or holds an invalid question.
    /// * [`SessionError::Store`] if the store fails otherwise.
    pub async fn load<S: QuestionStore + Sync + ?Sized>(
        &mut self,
        store: &S,
        quiz_id: QuizId,
        time_limit_minutes: u64,
    ) -> Result<(), SessionError> {
        if self.phase != Phase::Loading {
            return Err(SessionError::AlreadyStarted(self.phase));
        }

        self.quiz_id = Some(quiz_id.clone());
        self.questions.clear();
        self.cursor = 0;
        self.answers = AnswerMap::default();
        self.remaining_seconds = 0;
        self.receipt = None;
        self.error = None;

        if time_limit_minutes == 0 {
            return Err(self.fail_load(SessionError::InvalidTimeLimit(time_limit_minutes)));
        }

        let questions = match store.fetch_questions(&quiz_id).await {
            Ok(questions) if questions.is_empty() => {
                return Err(self.fail_load(SessionError::NotFound(quiz_id)));
            }
            Ok(questions) => questions,
            Err(StoreError::NotFound) => {
                return Err(self.fail_load(SessionError::NotFound(quiz_id)));
            }
            Err(e) => return Err(self.fail_load(e.into())),
        };

        if let Err(error) = check_bank(&questions) {
            return Err(self.fail_load(error.into()));
        }

        log::info!(
            "attempt {} started quiz {quiz_id} with {} questions and {time_limit_minutes} minutes",
            self.attempt_id,
            questions.len()
        );
        self.questions = questions;
        self.remaining_seconds = time_limit_minutes.saturating_mul(SECONDS_PER_MINUTE);
        self.phase = Phase::InProgress;
        Ok(())
    }

    fn fail_load(&mut self, error: SessionError) -> SessionError {
        log::warn!("attempt {} could not load: {error}", self.attempt_id);
        self.phase = Phase::Error;
        self.error = Some(error.to_string());
        error
    }

    /// Moves the cursor to `index`
    ///
    /// Returns `false` and leaves the cursor unchanged when the session is
    /// not in progress or `index` is out of range.
    pub fn set_cursor(&mut self, index: usize) -> bool {
        if self.phase != Phase::InProgress || index >= self.questions.len() {
            return false;
        }
        self.cursor = index;
        true
    }

    /// Moves to the following question, if there is one
    pub fn next(&mut self) -> bool {
        self.set_cursor(self.cursor + 1)
    }

    /// Moves to the preceding question, if there is one
    pub fn previous(&mut self) -> bool {
        match self.cursor.checked_sub(1) {
            Some(index) => self.set_cursor(index),
            None => false,
        }
    }

    /// Records `label` as the answer to `question_id`, replacing any earlier choice
    ///
    /// The label is not checked against the question's option count.
    /// Returns `false` when the session is not in progress.
    pub fn set_answer(&mut self, question_id: QuestionId, label: OptionLabel) -> bool {
        if self.phase != Phase::InProgress {
            return false;
        }
        self.answers.insert(question_id, label);
        true
    }

    /// Records `label` as the answer to the question under the cursor
    pub fn answer_current(&mut self, label: OptionLabel) -> bool {
        match self.current_question() {
            Some(question) => {
                let id = question.id().clone();
                self.set_answer(id, label)
            }
            None => false,
        }
    }

    /// Removes one second from the clock
    ///
    /// Does nothing unless the session is in progress with time left. When
    /// the clock reaches zero the answers are submitted in the same call.
    pub async fn tick<R: ResultSink + Sync + ?Sized>(&mut self, sink: &R) -> TickOutcome {
        if self.phase != Phase::InProgress || self.remaining_seconds == 0 {
            return TickOutcome::Idle;
        }

        self.remaining_seconds -= 1;
        if self.remaining_seconds > 0 {
            return TickOutcome::Running(self.remaining_seconds);
        }

        log::info!("attempt {} ran out of time", self.attempt_id);
        TickOutcome::Expired(self.submit(sink).await)
    }

    /// Persists the answers, at most once per session
    ///
    /// Calls outside [`Phase::InProgress`] are ignored, so a manual submit
    /// racing the countdown's automatic submit sends the answers only once.
    pub async fn submit<R: ResultSink + Sync + ?Sized>(&mut self, sink: &R) -> SubmitOutcome {
        let Some(submission) = self.begin_submission() else {
            return SubmitOutcome::Ignored;
        };
        let result = sink.submit_answers(&submission).await;

        match result {
            Ok(receipt) if receipt.accepted => {
                log::info!(
                    "attempt {} submitted {} answers",
                    self.attempt_id,
                    submission.answers.len()
                );
                self.phase = Phase::Complete;
                self.receipt = Some(receipt);
                SubmitOutcome::Completed(receipt)
            }
            Ok(_) => self.fail_submission("the answers were not accepted".to_string()),
            Err(e) => self.fail_submission(e.to_string()),
        }
    }

    fn begin_submission(&mut self) -> Option<Submission> {
        if self.phase != Phase::InProgress {
            return None;
        }
        let quiz_id = self.quiz_id.clone()?;
        self.phase = Phase::Submitting;
        Some(Submission {
            attempt_id: self.attempt_id,
            quiz_id,
            user_id: self.user_id.clone(),
            answers: self.answers.clone(),
        })
    }

    fn fail_submission(&mut self, message: String) -> SubmitOutcome {
        log::error!("attempt {} failed to submit: {message}", self.attempt_id);
        self.phase = Phase::Error;
        self.error = Some(message.clone());
        SubmitOutcome::Failed(message)
    }

    /// Number of questions without an answer
    pub fn unanswered_count(&self) -> usize {
        self.questions
            .iter()
            .filter(|question| !self.answers.contains(question.id()))
            .count()
    }

    /// Status of a question
    pub fn status(&self, question: &Question) -> QuestionStatus {
        if self.answers.contains(question.id()) {
            QuestionStatus::Answered
        } else {
            QuestionStatus::Unanswered
        }
    }

    /// Number of questions in each status
    pub fn status_counts(&self) -> EnumMap<QuestionStatus, usize> {
        let mut counts = EnumMap::default();
        for question in &self.questions {
            counts[self.status(question)] += 1;
        }
        counts
    }

    /// Entries of the question navigator, one per question
    pub fn navigator(&self) -> Vec<NavigatorEntry> {
        self.questions
            .iter()
            .enumerate()
            .map(|(index, question)| NavigatorEntry {
                index,
                number: index + 1,
                status: self.status(question),
                current: index == self.cursor,
            })
            .collect_vec()
    }

    /// Warning to show before a manual submit, if questions are unanswered
    ///
    /// The warning is informational; it never blocks [`Self::submit`].
    pub fn submit_warning(&self) -> Option<String> {
        match self.unanswered_count() {
            0 => None,
            count => Some(format!(
                "You have {count} unanswered {}. Are you sure you want to submit?",
                pluralizer::pluralize("question", count as isize, false)
            )),
        }
    }

    /// The question under the cursor
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.cursor)
    }

    /// Whether the cursor is on the final question
    pub fn is_last_question(&self) -> bool {
        self.cursor + 1 == self.questions.len()
    }

    /// Copies the observable state of the session
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            quiz_id: self.quiz_id.clone(),
            phase: self.phase,
            cursor: self.cursor,
            questions: self.questions.clone(),
            answers: self.answers.clone(),
            remaining_seconds: self.remaining_seconds,
            receipt: self.receipt,
            error: self.error.clone(),
        }
    }

    /// Identifier of this attempt
    pub fn attempt_id(&self) -> AttemptId {
        self.attempt_id
    }

    /// The student taking the quiz
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// The quiz being taken, once loading has started
    pub fn quiz_id(&self) -> Option<&QuizId> {
        self.quiz_id.as_ref()
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Index of the question being shown
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The questions of the quiz
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// The chosen options so far
    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    /// Seconds left on the countdown
    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    /// Receipt of a completed submission
    pub fn receipt(&self) -> Option<Receipt> {
        self.receipt
    }

    /// Message describing why the session is in [`Phase::Error`]
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Rejects question banks a session cannot present
fn check_bank(questions: &[Question]) -> Result<(), StoreError> {
    if questions.len() > MAX_QUESTION_COUNT {
        return Err(StoreError::Malformed(format!(
            "{} questions exceed the limit of {MAX_QUESTION_COUNT}",
            questions.len()
        )));
    }
    if !questions.iter().map(Question::id).all_unique() {
        return Err(StoreError::Malformed("duplicate question ids".to_string()));
    }
    for question in questions {
        question.validate().map_err(|report| {
            StoreError::Malformed(format!("question {:?}: {report}", question.id().as_str()))
        })?;
    }
    Ok(())
}

/// Formats a number of seconds as `MM:SS`
///
/// Minutes are not wrapped into hours, so 90 minutes read `90:00`.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
