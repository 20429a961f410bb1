//! Normalization of stored answer options
//!
//! Question banks are stored by the hosted backend as loosely typed JSON,
//! and the `options` column has been seen as a list of strings, as a single
//! string (either a JSON encoded list or a comma separated list), and as an
//! object keyed by label. Everything is turned into an ordered list of
//! strings here, at the store boundary, so the session never has to look at
//! the raw shape.

use std::collections::BTreeMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::question::Question;
use crate::{
    constants::question::MIN_OPTION_COUNT,
    error::{OptionsError, StoreError},
};

/// Answer options in any of the shapes found in storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawOptions {
    /// A list of option values
    List(Vec<Value>),
    /// A single string holding a JSON list or comma separated options
    Text(String),
    /// An object whose values are the options, ordered by key
    Keyed(BTreeMap<String, Value>),
}

/// Turns a scalar JSON value into option text
fn value_text(value: Value) -> Result<String, OptionsError> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(OptionsError::NotText(other.to_string())),
    }
}

impl RawOptions {
    /// Produces the ordered option strings
    ///
    /// Options are trimmed and blank entries are dropped. Keyed options are
    /// ordered by key length first so that `"10"` sorts after `"9"`.
    ///
    /// # Errors
    ///
    /// Returns [`OptionsError::NotText`] for nested values and
    /// [`OptionsError::TooFew`] when fewer than two options remain.
    pub fn normalize(self) -> Result<Vec<String>, OptionsError> {
        let values: Vec<String> = match self {
            Self::List(values) => values.into_iter().map(value_text).collect::<Result<_, _>>()?,
            Self::Text(text) => match serde_json::from_str::<Vec<Value>>(text.trim()) {
                Ok(values) => values.into_iter().map(value_text).collect::<Result<_, _>>()?,
                Err(_) => text.split(',').map(str::to_owned).collect(),
            },
            Self::Keyed(map) => map
                .into_iter()
                .sorted_by(|(a, _), (b, _)| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
                .map(|(_, value)| value_text(value))
                .collect::<Result<_, _>>()?,
        };

        let options = values
            .into_iter()
            .map(|option| option.trim().to_owned())
            .filter(|option| !option.is_empty())
            .collect_vec();

        if options.len() < MIN_OPTION_COUNT {
            return Err(OptionsError::TooFew(options.len()));
        }
        Ok(options)
    }
}

/// A question row as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawQuestion {
    /// Row identifier
    #[serde(alias = "_id")]
    pub id: String,
    /// Question text
    pub question: String,
    /// Options in their stored shape
    pub options: RawOptions,
    /// Letter of the correct option, if the row carries one
    #[serde(default)]
    pub correct_answer: Option<String>,
}

impl RawQuestion {
    /// Normalizes the row into a validated [`Question`]
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Malformed`] if the options cannot be normalized
    /// or the resulting question fails validation.
    pub fn into_question(self) -> Result<Question, StoreError> {
        use garde::Validate;

        let id = self.id;
        let options = self
            .options
            .normalize()
            .map_err(|e| StoreError::Malformed(format!("question {id}: {e}")))?;
        let question = Question::new(id.as_str(), self.question.trim(), options);
        question
            .validate()
            .map_err(|e| StoreError::Malformed(format!("question {id}: {e}")))?;
        Ok(question)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn parse(json: &str) -> RawOptions {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_list_options() {
        let options = parse(r#"["O(1)", " O(log n) ", "O(n)", ""]"#).normalize().unwrap();
        assert_eq!(options, vec!["O(1)", "O(log n)", "O(n)"]);
    }

    #[test]
    fn test_json_encoded_string_options() {
        let options = parse(r#""[\"SELECT\", \"MODIFY\", \"UPDATE\"]""#)
            .normalize()
            .unwrap();
        assert_eq!(options, vec!["SELECT", "MODIFY", "UPDATE"]);
    }

    #[test]
    fn test_comma_separated_string_options() {
        let options = parse(r#""Queue, Stack,Linked List""#).normalize().unwrap();
        assert_eq!(options, vec!["Queue", "Stack", "Linked List"]);
    }

    #[test]
    fn test_keyed_options_ordered_by_key() {
        let options = parse(r#"{"B": "London", "A": "Paris", "C": "Berlin"}"#)
            .normalize()
            .unwrap();
        assert_eq!(options, vec!["Paris", "London", "Berlin"]);
    }

    #[test]
    fn test_keyed_numeric_options_ordered_naturally() {
        let options = parse(
            r#"{"1":"a","2":"b","3":"c","4":"d","5":"e","6":"f","7":"g","8":"h","9":"i","10":"j"}"#,
        )
        .normalize()
        .unwrap();
        assert_eq!(options.last().map(String::as_str), Some("j"));
        assert_eq!(options[8], "i");
    }

    #[test]
    fn test_numbers_become_text() {
        let options = parse("[1, 2.5, true]").normalize().unwrap();
        assert_eq!(options, vec!["1", "2.5", "true"]);
    }

    #[test]
    fn test_nested_values_rejected() {
        let result = parse(r#"[["nested"], "b"]"#).normalize();
        assert!(matches!(result, Err(OptionsError::NotText(_))));
    }

    #[test]
    fn test_too_few_options() {
        assert_eq!(parse(r#"["only"]"#).normalize(), Err(OptionsError::TooFew(1)));
        assert_eq!(parse(r#"" , ""#).normalize(), Err(OptionsError::TooFew(0)));
    }

    #[test]
    fn test_raw_question_into_question() {
        let raw: RawQuestion = serde_json::from_str(
            r#"{"_id": "q1", "question": " What is 2+2? ", "options": "3,4,5", "correct_answer": "B"}"#,
        )
        .unwrap();
        assert_eq!(raw.correct_answer.as_deref(), Some("B"));

        let question = raw.into_question().unwrap();
        assert_eq!(question.id().as_str(), "q1");
        assert_eq!(question.prompt(), "What is 2+2?");
        assert_eq!(question.options(), ["3", "4", "5"]);
    }

    #[test]
    fn test_raw_question_with_bad_options() {
        let raw = RawQuestion {
            id: "q9".to_string(),
            question: "Prompt".to_string(),
            options: RawOptions::List(vec![]),
            correct_answer: None,
        };
        assert!(matches!(raw.into_question(), Err(StoreError::Malformed(m)) if m.contains("q9")));
    }

    #[test]
    fn test_raw_question_with_empty_prompt() {
        let raw = RawQuestion {
            id: "q2".to_string(),
            question: "   ".to_string(),
            options: RawOptions::Text("a,b".to_string()),
            correct_answer: None,
        };
        assert!(matches!(raw.into_question(), Err(StoreError::Malformed(_))));
    }
}
