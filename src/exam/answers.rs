// src/exam/answers.rs

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// A submitted (or correct) answer.
///
/// Serialized untagged: a JSON string is a single answer, a JSON array is a
/// multi answer with set semantics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Single(String),
    Multi(BTreeSet<String>),
}

static EMPTY_ANSWER: Answer = Answer::Single(String::new());

impl Answer {
    pub fn single(value: impl Into<String>) -> Self {
        Answer::Single(value.into())
    }

    pub fn multi<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Answer::Multi(values.into_iter().map(Into::into).collect())
    }

    /// True when both answers are the same variant.
    pub fn same_shape(&self, other: &Answer) -> bool {
        matches!(
            (self, other),
            (Answer::Single(_), Answer::Single(_)) | (Answer::Multi(_), Answer::Multi(_))
        )
    }

    /// Exact match for single answers, set equality for multi answers.
    /// Mismatched shapes never match.
    pub fn matches(&self, submitted: &Answer) -> bool {
        match (self, submitted) {
            (Answer::Single(expected), Answer::Single(given)) => expected == given,
            (Answer::Multi(expected), Answer::Multi(given)) => expected == given,
            _ => false,
        }
    }
}

impl Default for Answer {
    fn default() -> Self {
        Answer::Single(String::new())
    }
}

/// Mapping from question id to the respondent's answer.
///
/// Keys are added or overwritten, never removed. Shape validation is left to
/// the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AnswerStore {
    answers: BTreeMap<String, Answer>,
}

impl AnswerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_answer(&mut self, question_id: impl Into<String>, value: Answer) {
        self.answers.insert(question_id.into(), value);
    }

    /// Returns the stored answer, or an empty single answer when absent.
    pub fn get_answer(&self, question_id: &str) -> &Answer {
        self.answers.get(question_id).unwrap_or(&EMPTY_ANSWER)
    }

    pub fn is_answered(&self, question_id: &str) -> bool {
        self.answers.contains_key(question_id)
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    pub fn answered_ids(&self) -> impl Iterator<Item = &str> {
        self.answers.keys().map(String::as_str)
    }

    /// Raw answers as stored in the result record.
    pub fn snapshot(&self) -> BTreeMap<String, Answer> {
        self.answers.clone()
    }
}
