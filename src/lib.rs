//! # Examhall Quiz Attempt Library
//!
//! This library provides the core logic of a timed multiple choice quiz
//! attempt: loading a quiz's questions from a hosted backend, tracking the
//! student's position and answers, counting down the time limit, and
//! submitting the answers exactly once, either on request or when time runs
//! out.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::doc_markdown)]
use serde::Serialize;

pub mod backend;
pub mod config;
pub mod constants;
pub mod countdown;
pub mod error;
pub mod quiz;
pub mod session;
pub mod tunnel;

use backend::Receipt;
use quiz::{QuestionId, answers::OptionLabel};
use session::{NavigatorEntry, Phase, QuizSession, Snapshot, format_clock};

/// Messages describing a single change to an attempt
///
/// Update messages are sent to the view while the attempt runs, so it can
/// adjust what it shows without redrawing everything.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub enum UpdateMessage {
    /// The countdown moved
    Clock {
        /// Seconds left
        remaining_seconds: u64,
        /// Seconds left formatted as `MM:SS`
        display: String,
        /// Whether little time is left
        expiring: bool,
    },
    /// The cursor moved to another question
    Cursor {
        /// Index of the question now shown
        index: usize,
        /// Total number of questions
        count: usize,
    },
    /// An answer was recorded
    Answer {
        /// The answered question
        question_id: QuestionId,
        /// The chosen option
        label: OptionLabel,
        /// Questions still without an answer
        unanswered: usize,
    },
    /// Information to confirm before submitting
    SubmitReview {
        /// Questions still without an answer
        unanswered: usize,
        /// Warning text, if questions are unanswered
        warning: Option<String>,
    },
    /// The time limit was reached and the answers are submitted automatically
    TimeUp,
    /// The answers were stored
    Completed(Receipt),
    /// The attempt failed
    Failed {
        /// What went wrong
        message: String,
    },
    /// The attempt was left without submitting
    Abandoned,
}

impl UpdateMessage {
    /// Converts the update message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// Messages carrying the complete state of an attempt
///
/// Sync messages let a view redraw from scratch, typically when the
/// attempt starts or changes phase.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub enum SyncMessage {
    /// The questions are being fetched
    Loading,
    /// The quiz is being answered or submitted
    Quiz {
        /// The full session state
        snapshot: Box<Snapshot>,
        /// Seconds left formatted as `MM:SS`
        clock: String,
        /// The question navigator grid
        navigator: Vec<NavigatorEntry>,
    },
    /// The answers were stored
    Complete {
        /// Receipt returned by the backend
        receipt: Option<Receipt>,
    },
    /// Loading or submitting failed
    Error {
        /// What went wrong
        message: String,
    },
}

impl SyncMessage {
    /// Converts the sync message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

impl From<&QuizSession> for SyncMessage {
    fn from(session: &QuizSession) -> Self {
        match session.phase() {
            Phase::Loading => Self::Loading,
            Phase::InProgress | Phase::Submitting => Self::Quiz {
                snapshot: Box::new(session.snapshot()),
                clock: format_clock(session.remaining_seconds()),
                navigator: session.navigator(),
            },
            Phase::Complete => Self::Complete {
                receipt: session.receipt(),
            },
            Phase::Error => Self::Error {
                message: session
                    .error_message()
                    .unwrap_or("the quiz could not be completed")
                    .to_owned(),
            },
        }
    }
}
