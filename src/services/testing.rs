//! In-memory implementations of the endpoint traits for service tests

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::api::{ApiError, ContentApi, LearningApi};
use crate::models::{
    AddAnswerInput, Answer, Book, Category, Chapter, CreateTemplateInput, Enrollment, ParagraphVersion,
    ProgressStatus, Section, StartEnrollmentInput, Step, StepProgress, Template, UpdateProgressInput,
};

pub fn ts(minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 1)
        .unwrap()
        .and_hms_opt(9, minute, 0)
        .unwrap()
}

pub fn server_error(path: &str) -> ApiError {
    ApiError::Status {
        method: "GET".to_string(),
        url: format!("http://fake/api/v2{}", path),
        status: 500,
        message: "Internal server error".to_string(),
    }
}

pub fn session_expired() -> ApiError {
    ApiError::SessionExpired {
        login_route: "/login".to_string(),
    }
}

fn not_found(path: &str) -> ApiError {
    ApiError::Status {
        method: "GET".to_string(),
        url: format!("http://fake/api/v2{}", path),
        status: 404,
        message: "Not found".to_string(),
    }
}

#[derive(Default)]
struct LearningState {
    templates: Vec<Template>,
    steps: Vec<Step>,
    enrollments: HashMap<i64, Enrollment>,
    progress: Vec<StepProgress>,
    answers: Vec<Answer>,
    next_id: i64,
}

/// Learning backend held in memory
#[derive(Default)]
pub struct FakeLearningApi {
    state: Mutex<LearningState>,
    calls: Mutex<HashMap<&'static str, usize>>,
    failing_answers: Mutex<HashSet<i64>>,
    expired_answers: Mutex<HashSet<i64>>,
    failing: Mutex<HashSet<&'static str>>,
    steps_delay: Mutex<Option<Duration>>,
}

impl FakeLearningApi {
    pub fn new() -> Self {
        let fake = Self::default();
        fake.state.lock().unwrap().next_id = 1000;
        fake
    }

    /// Enrollment `enrollment_id` on template 1 / section `section_id` with `n` steps
    ///
    /// Step ids are 10, 11, ...; order indices 0, 1, ...; paragraph ids 100, 101, ...
    /// Steps are stored in reverse order to exercise sorting.
    pub fn with_flow(self, enrollment_id: i64, section_id: i64, n: usize) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.templates.push(Template {
                id: 1,
                name: "Patience".to_string(),
                description: None,
                section_id,
                created_at: ts(0),
                created_by: Some(1),
            });
            for i in (0..n).rev() {
                state.steps.push(Step {
                    id: 10 + i as i64,
                    template_id: 1,
                    paragraph_id: 100 + i as i64,
                    order_index: i as i32,
                    question_text: Some(format!("Question {}", i + 1)),
                });
            }
            state.enrollments.insert(
                enrollment_id,
                Enrollment {
                    id: enrollment_id,
                    user_id: 1,
                    template_id: 1,
                    section_id,
                    started_at: ts(0),
                    completed_at: None,
                },
            );
        }
        self
    }

    pub fn with_progress(self, enrollment_id: i64, step_id: i64, status: ProgressStatus) -> Self {
        self.put_progress(enrollment_id, step_id, status);
        self
    }

    pub fn with_answer(self, enrollment_id: i64, step_id: i64, input: AddAnswerInput) -> Self {
        self.push_answer(enrollment_id, step_id, &input);
        self
    }

    /// Make answer lookups for `step_id` fail
    pub fn fail_answers_for(self, step_id: i64) -> Self {
        self.failing_answers.lock().unwrap().insert(step_id);
        self
    }

    /// Make answer lookups for `step_id` fail as if the session ran out
    pub fn expire_session_on_answers_for(self, step_id: i64) -> Self {
        self.expired_answers.lock().unwrap().insert(step_id);
        self
    }

    /// Make every call to `operation` fail with a server error
    pub fn fail(&self, operation: &'static str) {
        self.failing.lock().unwrap().insert(operation);
    }

    pub fn recover(&self, operation: &'static str) {
        self.failing.lock().unwrap().remove(operation);
    }

    pub fn delay_steps(self, delay: Duration) -> Self {
        *self.steps_delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.calls.lock().unwrap().get(operation).copied().unwrap_or(0)
    }

    pub fn enrollment(&self, id: i64) -> Option<Enrollment> {
        self.state.lock().unwrap().enrollments.get(&id).cloned()
    }

    fn record(&self, operation: &'static str) -> Result<(), ApiError> {
        *self.calls.lock().unwrap().entry(operation).or_default() += 1;
        if self.failing.lock().unwrap().contains(operation) {
            return Err(server_error(&format!("/{}", operation)));
        }
        Ok(())
    }

    fn put_progress(&self, enrollment_id: i64, step_id: i64, status: ProgressStatus) -> StepProgress {
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state
            .progress
            .iter_mut()
            .find(|p| p.enrollment_id == enrollment_id && p.step_id == step_id)
        {
            existing.status = status;
            existing.updated_at = ts(30);
            return existing.clone();
        }

        state.next_id += 1;
        let record = StepProgress {
            id: state.next_id,
            enrollment_id,
            step_id,
            status,
            created_at: ts(10),
            updated_at: ts(10),
        };
        state.progress.push(record.clone());
        record
    }

    fn push_answer(&self, enrollment_id: i64, step_id: i64, input: &AddAnswerInput) -> Answer {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let answer = Answer {
            id: state.next_id,
            enrollment_id,
            step_id,
            answer_type: input.answer_type,
            answer_text: input.answer_text.clone(),
            created_at: ts((state.answers.len() as u32 + 1).min(59)),
        };
        state.answers.push(answer.clone());
        answer
    }
}

#[async_trait]
impl LearningApi for FakeLearningApi {
    async fn get_all_templates(&self) -> Result<Vec<Template>, ApiError> {
        self.record("get_all_templates")?;
        Ok(self.state.lock().unwrap().templates.clone())
    }

    async fn create_template(&self, input: &CreateTemplateInput) -> Result<Template, ApiError> {
        self.record("create_template")?;
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let template = Template {
            id: state.next_id,
            name: input.name.clone(),
            description: input.description.clone(),
            section_id: input.section_id,
            created_at: ts(5),
            created_by: Some(input.created_by),
        };
        state.templates.push(template.clone());
        Ok(template)
    }

    async fn get_templates_for_section(&self, section_id: i64) -> Result<Vec<Template>, ApiError> {
        self.record("get_templates_for_section")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .templates
            .iter()
            .filter(|t| t.section_id == section_id)
            .cloned()
            .collect())
    }

    async fn delete_template(&self, template_id: i64) -> Result<(), ApiError> {
        self.record("delete_template")?;
        let mut state = self.state.lock().unwrap();
        state.templates.retain(|t| t.id != template_id);
        state.steps.retain(|s| s.template_id != template_id);
        Ok(())
    }

    async fn get_steps_for_template(&self, template_id: i64) -> Result<Vec<Step>, ApiError> {
        self.record("get_steps_for_template")?;
        let delay = *self.steps_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let state = self.state.lock().unwrap();
        Ok(state
            .steps
            .iter()
            .filter(|s| s.template_id == template_id)
            .cloned()
            .collect())
    }

    async fn start_enrollment(&self, input: &StartEnrollmentInput) -> Result<Enrollment, ApiError> {
        self.record("start_enrollment")?;
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let enrollment = Enrollment {
            id: state.next_id,
            user_id: input.user_id,
            template_id: input.template_id,
            section_id: input.section_id,
            started_at: ts(20),
            completed_at: None,
        };
        state.enrollments.insert(enrollment.id, enrollment.clone());
        Ok(enrollment)
    }

    async fn get_enrollment(&self, enrollment_id: i64) -> Result<Enrollment, ApiError> {
        self.record("get_enrollment")?;
        self.state
            .lock()
            .unwrap()
            .enrollments
            .get(&enrollment_id)
            .cloned()
            .ok_or_else(|| not_found(&format!("/learning/enrollments/{}", enrollment_id)))
    }

    async fn get_enrollments_for_user(&self, user_id: i64) -> Result<Vec<Enrollment>, ApiError> {
        self.record("get_enrollments_for_user")?;
        let state = self.state.lock().unwrap();
        let mut enrollments: Vec<Enrollment> = state
            .enrollments
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        enrollments.sort_by_key(|e| e.id);
        Ok(enrollments)
    }

    async fn complete_enrollment(&self, enrollment_id: i64) -> Result<(), ApiError> {
        self.record("complete_enrollment")?;
        let mut state = self.state.lock().unwrap();
        match state.enrollments.get_mut(&enrollment_id) {
            Some(enrollment) => {
                enrollment.completed_at = Some(ts(59));
                Ok(())
            }
            None => Err(not_found(&format!("/learning/enrollments/{}/complete", enrollment_id))),
        }
    }

    async fn get_progress_for_enrollment(&self, enrollment_id: i64) -> Result<Vec<StepProgress>, ApiError> {
        self.record("get_progress_for_enrollment")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .progress
            .iter()
            .filter(|p| p.enrollment_id == enrollment_id)
            .cloned()
            .collect())
    }

    async fn get_progress_for_step(
        &self,
        enrollment_id: i64,
        step_id: i64,
    ) -> Result<Option<StepProgress>, ApiError> {
        self.record("get_progress_for_step")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .progress
            .iter()
            .find(|p| p.enrollment_id == enrollment_id && p.step_id == step_id)
            .cloned())
    }

    async fn update_progress(
        &self,
        enrollment_id: i64,
        step_id: i64,
        input: &UpdateProgressInput,
    ) -> Result<StepProgress, ApiError> {
        self.record("update_progress")?;
        Ok(self.put_progress(enrollment_id, step_id, input.status))
    }

    async fn get_answers(&self, enrollment_id: i64, step_id: i64) -> Result<Vec<Answer>, ApiError> {
        self.record("get_answers")?;
        if self.failing_answers.lock().unwrap().contains(&step_id) {
            return Err(server_error(&format!(
                "/learning/enrollments/{}/steps/{}/answers",
                enrollment_id, step_id
            )));
        }
        if self.expired_answers.lock().unwrap().contains(&step_id) {
            return Err(session_expired());
        }
        let state = self.state.lock().unwrap();
        Ok(state
            .answers
            .iter()
            .filter(|a| a.enrollment_id == enrollment_id && a.step_id == step_id)
            .cloned()
            .collect())
    }

    async fn add_answer(
        &self,
        enrollment_id: i64,
        step_id: i64,
        input: &AddAnswerInput,
    ) -> Result<Answer, ApiError> {
        self.record("add_answer")?;
        let answer = self.push_answer(enrollment_id, step_id, input);
        // Saving an answer starts the step, as the platform does
        let started = self.state.lock().unwrap().progress.iter().any(|p| {
            p.enrollment_id == enrollment_id && p.step_id == step_id && p.status.is_started()
        });
        if !started {
            self.put_progress(enrollment_id, step_id, ProgressStatus::InProgress);
        }
        Ok(answer)
    }
}

/// Content backend held in memory: one category → one book → chapters → sections
#[derive(Default)]
pub struct FakeContentApi {
    chapters: Vec<Chapter>,
    sections: Vec<Section>,
    paragraphs: HashMap<i64, ParagraphVersion>,
    direct_lookup_broken: bool,
    session_expired: bool,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl FakeContentApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_section(mut self, chapter_id: i64, section_id: i64) -> Self {
        if !self.chapters.iter().any(|c| c.id == chapter_id) {
            self.chapters.push(Chapter {
                id: chapter_id,
                book_id: 1,
                chapter_number: Some(chapter_id as i32),
                position: self.chapters.len() as i32,
            });
        }
        self.sections.push(Section {
            id: section_id,
            chapter_id,
            order_index: 0,
        });
        self
    }

    pub fn with_paragraph(mut self, paragraph_id: i64, title_en: &str) -> Self {
        self.paragraphs.insert(
            paragraph_id,
            ParagraphVersion {
                id: paragraph_id * 10,
                paragraph_id,
                version_number: 1,
                title_en: Some(title_en.to_string()),
                title_nl: None,
                content_en: Some(format!("{} text", title_en)),
                content_nl: None,
                created_by: None,
                created_at: None,
            },
        );
        self
    }

    /// Make `GET /content/sections/{id}` fail so resolution has to walk
    pub fn without_direct_lookup(mut self) -> Self {
        self.direct_lookup_broken = true;
        self
    }

    /// Make `GET /content/sections/{id}` fail as if the session ran out
    pub fn with_expired_session(mut self) -> Self {
        self.session_expired = true;
        self
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.calls.lock().unwrap().get(operation).copied().unwrap_or(0)
    }

    fn record(&self, operation: &'static str) {
        *self.calls.lock().unwrap().entry(operation).or_default() += 1;
    }
}

#[async_trait]
impl ContentApi for FakeContentApi {
    async fn get_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.record("get_categories");
        Ok(vec![Category {
            id: 1,
            category_number: Some(1),
            wheel_id: None,
            title_nl: Some("Geduld".to_string()),
            title_en: Some("Patience".to_string()),
            created_at: None,
        }])
    }

    async fn get_books_for_category(&self, category_id: i64) -> Result<Vec<Book>, ApiError> {
        self.record("get_books_for_category");
        Ok(vec![Book {
            id: 1,
            category_id,
            book_number: Some(1),
        }])
    }

    async fn get_chapters_for_book(&self, book_id: i64) -> Result<Vec<Chapter>, ApiError> {
        self.record("get_chapters_for_book");
        Ok(self.chapters.iter().filter(|c| c.book_id == book_id).cloned().collect())
    }

    async fn get_sections_for_chapter(&self, chapter_id: i64) -> Result<Vec<Section>, ApiError> {
        self.record("get_sections_for_chapter");
        Ok(self
            .sections
            .iter()
            .filter(|s| s.chapter_id == chapter_id)
            .cloned()
            .collect())
    }

    async fn get_section(&self, section_id: i64) -> Result<Option<Section>, ApiError> {
        self.record("get_section");
        if self.session_expired {
            return Err(session_expired());
        }
        if self.direct_lookup_broken {
            return Err(server_error(&format!("/content/sections/{}", section_id)));
        }
        Ok(self.sections.iter().find(|s| s.id == section_id).cloned())
    }

    async fn get_paragraph_published_version(
        &self,
        paragraph_id: i64,
    ) -> Result<Option<ParagraphVersion>, ApiError> {
        self.record("get_paragraph_published_version");
        Ok(self.paragraphs.get(&paragraph_id).cloned())
    }
}
