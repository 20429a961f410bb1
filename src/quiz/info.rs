//! Quiz metadata and the checks run before an attempt starts

use garde::Validate;
use serde::{Deserialize, Serialize};
use web_time::SystemTime;

use super::QuizId;
use crate::{constants::quiz, error::AccessError};

/// Validates the time limit of a quiz in minutes
fn validate_time_limit(val: &u64, _ctx: &()) -> garde::Result {
    if (quiz::MIN_TIME_LIMIT_MINUTES..=quiz::MAX_TIME_LIMIT_MINUTES).contains(val) {
        Ok(())
    } else {
        Err(garde::Error::new(format!(
            "outside of bounds [{},{}]",
            quiz::MIN_TIME_LIMIT_MINUTES,
            quiz::MAX_TIME_LIMIT_MINUTES
        )))
    }
}

/// Validates that the availability window is not inverted
fn validate_window(end_time: &SystemTime, start_time: &SystemTime) -> garde::Result {
    if end_time < start_time {
        Err(garde::Error::new("end time is before start time"))
    } else {
        Ok(())
    }
}

/// A scheduled quiz as published by a teacher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct QuizInfo {
    /// Identifier used to fetch the quiz's questions
    #[garde(skip)]
    pub id: QuizId,
    /// Display name
    #[garde(length(chars, min = 1, max = quiz::MAX_NAME_LENGTH))]
    pub name: String,
    /// Semester the quiz is published for
    #[garde(skip)]
    pub semester: String,
    /// Time allowed for one attempt, in minutes
    #[garde(custom(validate_time_limit))]
    pub time_limit_minutes: u64,
    /// Opening of the availability window
    #[garde(skip)]
    pub start_time: SystemTime,
    /// Closing of the availability window
    #[garde(custom(|v, _| validate_window(v, &self.start_time)))]
    pub end_time: SystemTime,
    /// Free-form instructions shown before starting
    #[garde(skip)]
    #[serde(default)]
    pub instructions: Option<String>,
}

impl QuizInfo {
    /// Decides whether a student may start this quiz at `now`
    ///
    /// Checks run in order: semester, previous completion, then the
    /// availability window. Both ends of the window are inclusive.
    ///
    /// # Errors
    ///
    /// Returns the first [`AccessError`] that applies.
    pub fn check_access(
        &self,
        student_semester: &str,
        already_completed: bool,
        now: SystemTime,
    ) -> Result<(), AccessError> {
        if self.semester != student_semester {
            return Err(AccessError::WrongSemester);
        }
        if already_completed {
            return Err(AccessError::AlreadyCompleted);
        }
        if now < self.start_time {
            return Err(AccessError::NotStarted);
        }
        if now > self.end_time {
            return Err(AccessError::Ended);
        }
        Ok(())
    }
}
