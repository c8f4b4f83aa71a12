//! Enrollment model
//!
//! An enrollment is one user's attempt at a learning-flow template for a
//! content section.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Enrollment entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    /// Unique identifier
    pub id: i64,
    /// Enrolled user
    pub user_id: i64,
    /// Template being worked through
    pub template_id: i64,
    /// Content section the template belongs to
    pub section_id: i64,
    /// When the enrollment was started
    pub started_at: NaiveDateTime,
    /// Set once the whole flow has been completed
    #[serde(default)]
    pub completed_at: Option<NaiveDateTime>,
}

impl Enrollment {
    /// Check if the flow has been marked complete
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Input for starting a new enrollment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartEnrollmentInput {
    pub user_id: i64,
    pub template_id: i64,
    pub section_id: i64,
}
