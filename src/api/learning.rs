//! Learning-flow endpoints
//!
//! Templates, steps, enrollments, per-step progress and answers under
//! `/api/v2/learning`.

use std::sync::Arc;

use async_trait::async_trait;

use super::{ApiClient, ApiError};
use crate::models::{
    AddAnswerInput, Answer, CreateTemplateInput, Enrollment, StartEnrollmentInput, Step, StepProgress,
    Template, UpdateProgressInput,
};

/// Remote learning-flow operations
///
/// Implemented over HTTP by [`HttpLearningApi`]; services depend on the
/// trait so they can run against in-memory implementations.
#[async_trait]
pub trait LearningApi: Send + Sync {
    async fn get_all_templates(&self) -> Result<Vec<Template>, ApiError>;

    async fn create_template(&self, input: &CreateTemplateInput) -> Result<Template, ApiError>;

    async fn get_templates_for_section(&self, section_id: i64) -> Result<Vec<Template>, ApiError>;

    async fn delete_template(&self, template_id: i64) -> Result<(), ApiError>;

    async fn get_steps_for_template(&self, template_id: i64) -> Result<Vec<Step>, ApiError>;

    async fn start_enrollment(&self, input: &StartEnrollmentInput) -> Result<Enrollment, ApiError>;

    async fn get_enrollment(&self, enrollment_id: i64) -> Result<Enrollment, ApiError>;

    async fn get_enrollments_for_user(&self, user_id: i64) -> Result<Vec<Enrollment>, ApiError>;

    async fn complete_enrollment(&self, enrollment_id: i64) -> Result<(), ApiError>;

    /// Progress records for every step of an enrollment
    async fn get_progress_for_enrollment(&self, enrollment_id: i64) -> Result<Vec<StepProgress>, ApiError>;

    /// Progress for one step; `None` when the step has never been started
    async fn get_progress_for_step(
        &self,
        enrollment_id: i64,
        step_id: i64,
    ) -> Result<Option<StepProgress>, ApiError>;

    async fn update_progress(
        &self,
        enrollment_id: i64,
        step_id: i64,
        input: &UpdateProgressInput,
    ) -> Result<StepProgress, ApiError>;

    async fn get_answers(&self, enrollment_id: i64, step_id: i64) -> Result<Vec<Answer>, ApiError>;

    async fn add_answer(
        &self,
        enrollment_id: i64,
        step_id: i64,
        input: &AddAnswerInput,
    ) -> Result<Answer, ApiError>;
}

/// [`LearningApi`] backed by the platform's REST endpoints
pub struct HttpLearningApi {
    client: Arc<ApiClient>,
}

impl HttpLearningApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LearningApi for HttpLearningApi {
    async fn get_all_templates(&self) -> Result<Vec<Template>, ApiError> {
        self.client.get("/learning/templates").await
    }

    async fn create_template(&self, input: &CreateTemplateInput) -> Result<Template, ApiError> {
        self.client.post("/learning/templates", input).await
    }

    async fn get_templates_for_section(&self, section_id: i64) -> Result<Vec<Template>, ApiError> {
        self.client
            .get(&format!("/learning/templates/section/{}", section_id))
            .await
    }

    async fn delete_template(&self, template_id: i64) -> Result<(), ApiError> {
        self.client
            .delete(&format!("/learning/templates/{}", template_id))
            .await
    }

    async fn get_steps_for_template(&self, template_id: i64) -> Result<Vec<Step>, ApiError> {
        self.client
            .get(&format!("/learning/templates/{}/steps", template_id))
            .await
    }

    async fn start_enrollment(&self, input: &StartEnrollmentInput) -> Result<Enrollment, ApiError> {
        self.client.post("/learning/enrollments", input).await
    }

    async fn get_enrollment(&self, enrollment_id: i64) -> Result<Enrollment, ApiError> {
        self.client
            .get(&format!("/learning/enrollments/{}", enrollment_id))
            .await
    }

    async fn get_enrollments_for_user(&self, user_id: i64) -> Result<Vec<Enrollment>, ApiError> {
        self.client
            .get(&format!("/learning/enrollments/user/{}", user_id))
            .await
    }

    async fn complete_enrollment(&self, enrollment_id: i64) -> Result<(), ApiError> {
        self.client
            .post_unit(
                &format!("/learning/enrollments/{}/complete", enrollment_id),
                &serde_json::json!({}),
            )
            .await
    }

    async fn get_progress_for_enrollment(&self, enrollment_id: i64) -> Result<Vec<StepProgress>, ApiError> {
        self.client
            .get(&format!("/learning/enrollments/{}/progress", enrollment_id))
            .await
    }

    async fn get_progress_for_step(
        &self,
        enrollment_id: i64,
        step_id: i64,
    ) -> Result<Option<StepProgress>, ApiError> {
        self.client
            .get_optional(&format!(
                "/learning/enrollments/{}/steps/{}/progress",
                enrollment_id, step_id
            ))
            .await
    }

    async fn update_progress(
        &self,
        enrollment_id: i64,
        step_id: i64,
        input: &UpdateProgressInput,
    ) -> Result<StepProgress, ApiError> {
        self.client
            .post(
                &format!("/learning/enrollments/{}/steps/{}/progress", enrollment_id, step_id),
                input,
            )
            .await
    }

    async fn get_answers(&self, enrollment_id: i64, step_id: i64) -> Result<Vec<Answer>, ApiError> {
        self.client
            .get(&format!(
                "/learning/enrollments/{}/steps/{}/answers",
                enrollment_id, step_id
            ))
            .await
    }

    async fn add_answer(
        &self,
        enrollment_id: i64,
        step_id: i64,
        input: &AddAnswerInput,
    ) -> Result<Answer, ApiError> {
        self.client
            .post(
                &format!("/learning/enrollments/{}/steps/{}/answers", enrollment_id, step_id),
                input,
            )
            .await
    }
}
