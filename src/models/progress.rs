//! Step progress model
//!
//! Progress is tracked per (enrollment, step) by the remote service. The
//! client only reads it and requests transitions.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Server-side status of one step within an enrollment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl ProgressStatus {
    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::NotStarted => "NOT_STARTED",
            ProgressStatus::InProgress => "IN_PROGRESS",
            ProgressStatus::Completed => "COMPLETED",
        }
    }

    /// Parse the wire representation (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "NOT_STARTED" => Some(ProgressStatus::NotStarted),
            "IN_PROGRESS" => Some(ProgressStatus::InProgress),
            "COMPLETED" => Some(ProgressStatus::Completed),
            _ => None,
        }
    }

    /// True once the user has engaged with the step
    pub fn is_started(&self) -> bool {
        matches!(self, ProgressStatus::InProgress | ProgressStatus::Completed)
    }
}

impl std::fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Progress record for one (enrollment, step) pair
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StepProgress {
    pub id: i64,
    pub enrollment_id: i64,
    pub step_id: i64,
    pub status: ProgressStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Body of a progress transition request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProgressInput {
    pub status: ProgressStatus,
}
