//! Error types surfaced by the quiz attempt engine

use thiserror::Error;

use crate::{quiz::QuizId, session::Phase};

/// Errors reported by a [`QuestionStore`](crate::backend::QuestionStore)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// No questions exist for the requested quiz
    #[error("no questions found for quiz")]
    NotFound,
    /// The stored question bank could not be turned into questions
    #[error("malformed question bank: {0}")]
    Malformed(String),
    /// The backend could not be reached or failed
    #[error("question store failure: {0}")]
    Backend(String),
}

/// Errors reported by a [`ResultSink`](crate::backend::ResultSink)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SubmissionError {
    /// The backend refused the submission
    #[error("submission rejected: {0}")]
    Rejected(String),
    /// The same user already submitted this quiz
    #[error("answers for this quiz were already submitted")]
    Duplicate,
    /// The backend could not be reached or failed
    #[error("result sink failure: {0}")]
    Backend(String),
}

/// Errors returned by [`QuizSession`](crate::session::QuizSession) operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SessionError {
    /// The quiz has no questions
    #[error("quiz {0} has no questions")]
    NotFound(QuizId),
    /// The quiz was given no time to answer
    #[error("time limit of {0} minutes is not allowed")]
    InvalidTimeLimit(u64),
    /// The session already left the loading phase and cannot be reused
    #[error("session is single-use and is already {0:?}")]
    AlreadyStarted(Phase),
    /// Fetching the questions failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Reasons a student may not start a quiz
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// The quiz belongs to another semester
    #[error("this quiz is not available for your semester")]
    WrongSemester,
    /// The student has already taken the quiz
    #[error("you have already taken this quiz")]
    AlreadyCompleted,
    /// The quiz window has not opened yet
    #[error("this quiz has not started yet")]
    NotStarted,
    /// The quiz window has closed
    #[error("this quiz has ended")]
    Ended,
}

/// Error produced when parsing an [`OptionLabel`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionLabelError {
    /// The input was not a single letter
    #[error("option label must be a single letter, got {0:?}")]
    Invalid(String),
    /// The option index cannot be represented by a letter
    #[error("option index {0} has no letter label")]
    OutOfRange(usize),
}

/// Error produced when normalizing stored answer options
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    /// Fewer than two usable options remained after normalization
    #[error("expected at least two options, found {0}")]
    TooFew(usize),
    /// An option value was not text
    #[error("option {0} is not text")]
    NotText(String),
}
