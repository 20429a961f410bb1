//! Multiple choice questions as seen by a quiz attempt
//!
//! A [`Question`] is immutable once it has been loaded into a session. Its
//! options are always an ordered list of strings; any other stored shape is
//! normalized before a question is built (see [`super::options`]).

use garde::Validate;
use serde::{Deserialize, Serialize};

use super::{QuestionId, answers::OptionLabel};
use crate::constants::question::{
    MAX_OPTION_COUNT, MAX_OPTION_LENGTH, MAX_PROMPT_LENGTH, MIN_OPTION_COUNT, MIN_PROMPT_LENGTH,
};

/// Ensures a question id is not blank
fn validate_id(val: &QuestionId, _ctx: &()) -> garde::Result {
    if val.as_str().trim().is_empty() {
        Err(garde::Error::new("question id must not be empty"))
    } else {
        Ok(())
    }
}

/// A single multiple choice question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Question {
    /// Identifier unique within the quiz
    #[garde(custom(validate_id))]
    id: QuestionId,
    /// The question text shown to the student
    #[garde(length(chars, min = MIN_PROMPT_LENGTH, max = MAX_PROMPT_LENGTH))]
    prompt: String,
    /// Answer options in display order
    #[garde(
        length(min = MIN_OPTION_COUNT, max = MAX_OPTION_COUNT),
        inner(length(chars, max = MAX_OPTION_LENGTH))
    )]
    options: Vec<String>,
}

impl Question {
    /// Creates a question without validating it
    pub fn new(
        id: impl Into<QuestionId>,
        prompt: impl Into<String>,
        options: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    /// Identifier of the question
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    /// The question text
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Answer options in display order
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Answer options paired with their letter labels
    pub fn labeled_options(&self) -> impl Iterator<Item = (OptionLabel, &str)> {
        self.options
            .iter()
            .enumerate()
            .filter_map(|(index, option)| {
                OptionLabel::from_index(index)
                    .ok()
                    .map(|label| (label, option.as_str()))
            })
    }

    /// The option text for `label`, if the question has that many options
    pub fn option(&self, label: OptionLabel) -> Option<&str> {
        self.options.get(label.index()).map(String::as_str)
    }
}
