//! Learning service
//!
//! Wraps [`LearningApi`] with the query cache:
//! - Template lists, template steps and per-user enrollment lists are cached
//! - Writes invalidate the keys they affect
//! - Enrollments, progress and answers are always read from the server so
//!   the flow controller sees its own writes

use std::sync::Arc;
use std::time::Duration;

use crate::api::{ApiError, LearningApi};
use crate::cache::Cache;
use crate::models::{
    sort_steps, AddAnswerInput, Answer, AnswerType, CreateTemplateInput, Enrollment, ProgressStatus,
    StartEnrollmentInput, Step, StepProgress, Template, UpdateProgressInput,
};

/// Steps never change once a template is published
const STEP_CACHE_TTL_SECS: u64 = 3600;

const TEMPLATE_LIST_CACHE_TTL_SECS: u64 = 600;

const ENROLLMENT_LIST_CACHE_TTL_SECS: u64 = 60;

/// Cache key prefixes
const CACHE_KEY_TEMPLATES_ALL: &str = "templates:all";
const CACHE_KEY_TEMPLATES_BY_SECTION: &str = "templates:section:";
const CACHE_KEY_STEPS_BY_TEMPLATE: &str = "steps:template:";
const CACHE_KEY_ENROLLMENTS_BY_USER: &str = "enrollments:user:";

/// Learning-flow operations with caching
pub struct LearningService {
    api: Arc<dyn LearningApi>,
    cache: Arc<Cache>,
}

impl LearningService {
    /// Create a new learning service
    ///
    /// # Arguments
    /// * `api` - Remote learning endpoints
    /// * `cache` - Query cache shared with the other services
    pub fn new(api: Arc<dyn LearningApi>, cache: Arc<Cache>) -> Self {
        Self { api, cache }
    }

    // ------------------------------------------------------------------
    // Templates
    // ------------------------------------------------------------------

    pub async fn all_templates(&self) -> Result<Vec<Template>, ApiError> {
        self.cache
            .get_or_load(
                CACHE_KEY_TEMPLATES_ALL,
                Duration::from_secs(TEMPLATE_LIST_CACHE_TTL_SECS),
                || self.api.get_all_templates(),
            )
            .await
    }

    pub async fn templates_for_section(&self, section_id: i64) -> Result<Vec<Template>, ApiError> {
        let key = format!("{}{}", CACHE_KEY_TEMPLATES_BY_SECTION, section_id);
        self.cache
            .get_or_load(&key, Duration::from_secs(TEMPLATE_LIST_CACHE_TTL_SECS), || {
                self.api.get_templates_for_section(section_id)
            })
            .await
    }

    pub async fn create_template(&self, input: &CreateTemplateInput) -> Result<Template, ApiError> {
        let template = self.api.create_template(input).await?;
        tracing::info!(template_id = template.id, section_id = template.section_id, "template created");

        self.cache.invalidate("templates:*").await;
        Ok(template)
    }

    pub async fn delete_template(&self, template_id: i64) -> Result<(), ApiError> {
        self.api.delete_template(template_id).await?;
        tracing::info!(template_id, "template deleted");

        self.cache.invalidate("templates:*").await;
        self.cache
            .invalidate(&format!("{}{}", CACHE_KEY_STEPS_BY_TEMPLATE, template_id))
            .await;
        Ok(())
    }

    /// Steps of a template in flow order
    pub async fn steps_for_template(&self, template_id: i64) -> Result<Vec<Step>, ApiError> {
        let key = format!("{}{}", CACHE_KEY_STEPS_BY_TEMPLATE, template_id);
        let mut steps = self
            .cache
            .get_or_load(&key, Duration::from_secs(STEP_CACHE_TTL_SECS), || {
                self.api.get_steps_for_template(template_id)
            })
            .await?;

        sort_steps(&mut steps);
        Ok(steps)
    }

    // ------------------------------------------------------------------
    // Enrollments
    // ------------------------------------------------------------------

    pub async fn start_enrollment(&self, input: &StartEnrollmentInput) -> Result<Enrollment, ApiError> {
        let enrollment = self.api.start_enrollment(input).await?;
        tracing::info!(
            enrollment_id = enrollment.id,
            user_id = enrollment.user_id,
            template_id = enrollment.template_id,
            "enrollment started"
        );

        self.cache
            .invalidate(&format!("{}{}", CACHE_KEY_ENROLLMENTS_BY_USER, input.user_id))
            .await;
        Ok(enrollment)
    }

    pub async fn enrollment(&self, enrollment_id: i64) -> Result<Enrollment, ApiError> {
        self.api.get_enrollment(enrollment_id).await
    }

    pub async fn enrollments_for_user(&self, user_id: i64) -> Result<Vec<Enrollment>, ApiError> {
        let key = format!("{}{}", CACHE_KEY_ENROLLMENTS_BY_USER, user_id);
        self.cache
            .get_or_load(&key, Duration::from_secs(ENROLLMENT_LIST_CACHE_TTL_SECS), || {
                self.api.get_enrollments_for_user(user_id)
            })
            .await
    }

    pub async fn complete_enrollment(&self, enrollment_id: i64) -> Result<(), ApiError> {
        self.api.complete_enrollment(enrollment_id).await?;
        tracing::info!(enrollment_id, "enrollment completed");

        // The owning user is not known here
        self.cache
            .invalidate(&format!("{}*", CACHE_KEY_ENROLLMENTS_BY_USER))
            .await;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Progress and answers
    // ------------------------------------------------------------------

    pub async fn progress_for_enrollment(&self, enrollment_id: i64) -> Result<Vec<StepProgress>, ApiError> {
        self.api.get_progress_for_enrollment(enrollment_id).await
    }

    pub async fn progress_for_step(
        &self,
        enrollment_id: i64,
        step_id: i64,
    ) -> Result<Option<StepProgress>, ApiError> {
        self.api.get_progress_for_step(enrollment_id, step_id).await
    }

    pub async fn update_progress(
        &self,
        enrollment_id: i64,
        step_id: i64,
        status: ProgressStatus,
    ) -> Result<StepProgress, ApiError> {
        let progress = self
            .api
            .update_progress(enrollment_id, step_id, &UpdateProgressInput { status })
            .await?;
        tracing::debug!(enrollment_id, step_id, status = %progress.status, "step progress updated");
        Ok(progress)
    }

    pub async fn answers(&self, enrollment_id: i64, step_id: i64) -> Result<Vec<Answer>, ApiError> {
        self.api.get_answers(enrollment_id, step_id).await
    }

    pub async fn add_answer(
        &self,
        enrollment_id: i64,
        step_id: i64,
        answer_type: AnswerType,
        text: &str,
    ) -> Result<Answer, ApiError> {
        let answer = self
            .api
            .add_answer(enrollment_id, step_id, &AddAnswerInput::new(answer_type, text))
            .await?;
        tracing::debug!(enrollment_id, step_id, answer_type = %answer_type, "answer saved");
        Ok(answer)
    }
}
