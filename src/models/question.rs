// src/models/question.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::exam::answers::Answer;

/// IELTS exam category (one test section, or the full mock).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamCategory {
    Listening,
    Reading,
    Writing,
    Speaking,
    Full,
}

impl ExamCategory {
    pub const ALL: [ExamCategory; 5] = [
        ExamCategory::Listening,
        ExamCategory::Reading,
        ExamCategory::Writing,
        ExamCategory::Speaking,
        ExamCategory::Full,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExamCategory::Listening => "listening",
            ExamCategory::Reading => "reading",
            ExamCategory::Writing => "writing",
            ExamCategory::Speaking => "speaking",
            ExamCategory::Full => "full",
        }
    }
}

impl fmt::Display for ExamCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExamCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExamCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown exam type '{}'", s))
    }
}

/// Question type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    /// One option out of `options`.
    SingleChoice,
    /// Free text (fill in the blank, essay prompt).
    FreeText,
    TrueFalse,
    /// Several options, scored as a set.
    Matching,
}

/// One exam question. Immutable once loaded; owned by the question source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Unique within a session.
    pub id: String,

    /// Serialized as `type` since it is a reserved keyword in Rust.
    #[serde(rename = "type")]
    pub kind: QuestionKind,

    pub prompt: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,

    /// A JSON string for single-answer questions, an array for multi-answer ones.
    pub correct_answer: Answer,

    /// Reading passage shown next to the prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passage: Option<String>,

    /// Audio reference for listening questions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
}

/// DTO for sending a question to the client (excludes the correct answer).
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    /// Whether the client should send an array answer.
    pub multi_answer: bool,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        PublicQuestion {
            id: q.id.clone(),
            kind: q.kind,
            prompt: q.prompt.clone(),
            options: q.options.clone(),
            passage: q.passage.clone(),
            audio: q.audio.clone(),
            multi_answer: matches!(q.correct_answer, Answer::Multi(_)),
        }
    }
}
