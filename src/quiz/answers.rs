//! Option labels and the per-attempt answer map

use std::{collections::HashMap, fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};

use super::QuestionId;
use crate::{constants, error::OptionLabelError};

/// The letter naming an answer option by its position
///
/// The first option is `A`, the second `B` and so on. Labels are serialized
/// as their letter.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay,
)]
pub struct OptionLabel(u8);

impl OptionLabel {
    /// Returns the label of the option at `index`
    ///
    /// # Errors
    ///
    /// Returns [`OptionLabelError::OutOfRange`] if there is no letter for the index.
    pub fn from_index(index: usize) -> Result<Self, OptionLabelError> {
        if index < constants::question::MAX_OPTION_COUNT {
            Ok(Self(index as u8))
        } else {
            Err(OptionLabelError::OutOfRange(index))
        }
    }

    /// Position of the option this label refers to
    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    /// The label as an upper-case letter
    pub fn letter(self) -> char {
        char::from(b'A' + self.0)
    }
}

impl Display for OptionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl FromStr for OptionLabel {
    type Err = OptionLabelError;

    /// Parses a single letter, ignoring case and surrounding whitespace
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => {
                Self::from_index(usize::from(c.to_ascii_uppercase() as u8 - b'A'))
            }
            _ => Err(OptionLabelError::Invalid(s.to_owned())),
        }
    }
}

/// Selected option per question
///
/// Lookups are by question id; insertion order is irrelevant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerMap(HashMap<QuestionId, OptionLabel>);

impl AnswerMap {
    /// Records `label` for `question_id`, replacing any earlier choice
    ///
    /// Returns the previous label if there was one.
    pub fn insert(&mut self, question_id: QuestionId, label: OptionLabel) -> Option<OptionLabel> {
        self.0.insert(question_id, label)
    }

    /// The label chosen for `question_id`
    pub fn get(&self, question_id: &QuestionId) -> Option<OptionLabel> {
        self.0.get(question_id).copied()
    }

    /// Whether `question_id` has been answered
    pub fn contains(&self, question_id: &QuestionId) -> bool {
        self.0.contains_key(question_id)
    }

    /// Number of answered questions
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no question has been answered
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the recorded answers in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&QuestionId, OptionLabel)> {
        self.0.iter().map(|(id, label)| (id, *label))
    }
}

impl FromIterator<(QuestionId, OptionLabel)> for AnswerMap {
    fn from_iter<I: IntoIterator<Item = (QuestionId, OptionLabel)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_label_from_index() {
        assert_eq!(OptionLabel::from_index(0).unwrap().letter(), 'A');
        assert_eq!(OptionLabel::from_index(3).unwrap().letter(), 'D');
        assert_eq!(OptionLabel::from_index(25).unwrap().letter(), 'Z');
        assert_eq!(
            OptionLabel::from_index(26),
            Err(OptionLabelError::OutOfRange(26))
        );
    }

    #[test]
    fn test_label_from_str() {
        assert_eq!("B".parse::<OptionLabel>().unwrap().index(), 1);
        assert_eq!(" c ".parse::<OptionLabel>().unwrap().index(), 2);
        assert!("".parse::<OptionLabel>().is_err());
        assert!("AB".parse::<OptionLabel>().is_err());
        assert!("1".parse::<OptionLabel>().is_err());
    }

    #[test]
    fn test_label_serializes_as_letter() {
        let label = OptionLabel::from_index(2).unwrap();
        assert_eq!(serde_json::to_string(&label).unwrap(), "\"C\"");

        let parsed: OptionLabel = serde_json::from_str("\"d\"").unwrap();
        assert_eq!(parsed.letter(), 'D');
    }

    #[test]
    fn test_answer_map_overwrite() {
        let mut answers = AnswerMap::default();
        let a = OptionLabel::from_index(0).unwrap();
        let b = OptionLabel::from_index(1).unwrap();

        assert_eq!(answers.insert(QuestionId::from("q1"), a), None);
        assert_eq!(answers.insert(QuestionId::from("q1"), b), Some(a));
        assert_eq!(answers.len(), 1);
        assert_eq!(answers.get(&QuestionId::from("q1")), Some(b));
    }

    #[test]
    fn test_answer_map_insert_is_idempotent() {
        let b = OptionLabel::from_index(1).unwrap();
        let mut once = AnswerMap::default();
        once.insert(QuestionId::from("q"), b);

        let mut twice = once.clone();
        twice.insert(QuestionId::from("q"), b);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_answer_map_json_shape() {
        let answers: AnswerMap = [(QuestionId::from("q1"), OptionLabel::from_index(0).unwrap())]
            .into_iter()
            .collect();
        assert_eq!(serde_json::to_string(&answers).unwrap(), r#"{"q1":"A"}"#);
    }
}
