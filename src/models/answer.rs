//! Enrollment answer model

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Kind of free-text answer a user gives on a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnswerType {
    /// First impression, written before reading the content
    PictureQuestion,
    /// Closing reflection, written after reading the content
    Reflection,
}

impl AnswerType {
    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerType::PictureQuestion => "PICTURE_QUESTION",
            AnswerType::Reflection => "REFLECTION",
        }
    }
}

impl std::fmt::Display for AnswerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Answer stored for an (enrollment, step) pair
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub id: i64,
    pub enrollment_id: i64,
    pub step_id: i64,
    #[serde(rename = "type")]
    pub answer_type: AnswerType,
    pub answer_text: String,
    pub created_at: NaiveDateTime,
}

/// Body of an append-answer request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddAnswerInput {
    #[serde(rename = "type")]
    pub answer_type: AnswerType,
    pub answer_text: String,
}

impl AddAnswerInput {
    pub fn new(answer_type: AnswerType, answer_text: impl Into<String>) -> Self {
        Self {
            answer_type,
            answer_text: answer_text.into(),
        }
    }
}
