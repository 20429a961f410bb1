//! Question bank content and identifiers
//!
//! This module contains the data a quiz attempt works on: the identifiers
//! handed out by the backend, the immutable [`question::Question`], the
//! normalization of stored answer options, answer labels and the
//! per-attempt answer map, and the quiz metadata used to decide whether a
//! student may start a quiz.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use uuid::Uuid;

pub mod answers;
pub mod info;
pub mod options;
pub mod question;

/// Identifier of a quiz as assigned by the backend
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, derive_more::From,
)]
#[serde(transparent)]
pub struct QuizId(String);

/// Identifier of a question, unique within a quiz
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, derive_more::From,
)]
#[serde(transparent)]
pub struct QuestionId(String);

/// Identifier of the student taking a quiz
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, derive_more::From,
)]
#[serde(transparent)]
pub struct UserId(String);

macro_rules! string_id_impls {
    ($($name:ident),*) => {$(
        impl $name {
            /// The identifier as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    )*};
}

string_id_impls!(QuizId, QuestionId, UserId);

/// A unique identifier for one attempt at a quiz
///
/// Every session gets a fresh attempt id so that submissions from
/// different attempts can be told apart by the backend.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay,
)]
pub struct AttemptId(Uuid);

impl AttemptId {
    /// Creates a new random attempt ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AttemptId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for AttemptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for AttemptId {
    type Err = uuid::Error;

    /// Parses an attempt ID from a UUID string
    ///
    /// # Errors
    ///
    /// Returns a `uuid::Error` if the string is not a valid UUID.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_string_ids_serialize_transparently() {
        let id = QuizId::from("quiz1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"quiz1\"");
        assert_eq!(id.to_string(), "quiz1");
        assert_eq!(id.as_str(), "quiz1");

        let parsed: QuestionId = serde_json::from_str("\"q7\"").unwrap();
        assert_eq!(parsed, QuestionId::from(String::from("q7")));
    }

    #[test]
    fn test_attempt_ids_are_unique() {
        assert_ne!(AttemptId::new(), AttemptId::new());
    }

    #[test]
    fn test_attempt_id_round_trip_through_string() {
        let id = AttemptId::new();
        let parsed = AttemptId::from_str(&id.to_string()).unwrap();
        assert_eq!(parsed, id);
        assert!(AttemptId::from_str("not-a-uuid").is_err());
    }
}
