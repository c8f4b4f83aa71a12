//! Enrollment flow controller
//!
//! Drives one user's walk through a learning-flow enrollment. Each step is
//! worked in three substeps: write a first impression, read the paragraph,
//! write a reflection. The server owns all progress; the controller only
//! requests transitions and replaces its local view with what the server
//! returns afterwards.
//!
//! # Usage
//!
//! ```rust,ignore
//! let mut flow = EnrollmentFlow::new(learning, content, &config);
//! flow.load(enrollment_id, &CancellationToken::new()).await?;
//! flow.load_step_content().await?;
//! flow.save_impression("A calm lake").await?;
//! flow.complete_step().await?;
//! let target = flow.complete_flow().await?;
//! ```

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::content::ContentService;
use super::learning::LearningService;
use super::progress::{self, AnswersByStep, ProgressByOrder, Substep};
use crate::api::ApiError;
use crate::config::{AnswerSelection, Config};
use crate::models::{Answer, AnswerType, Chapter, Enrollment, ParagraphVersion, ProgressStatus, Step};

/// Errors from flow operations
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// An operation needs a loaded enrollment
    #[error("No enrollment is loaded")]
    NotLoaded,

    #[error("Step index {index} is out of range for a flow of {len} steps")]
    StepOutOfRange { index: usize, len: usize },

    /// The load was aborted through its cancellation token
    #[error("Loading the enrollment was cancelled")]
    Cancelled,

    /// The write was stored but re-reading the step afterwards failed;
    /// retrying the write would store it twice
    #[error("Saved, but reloading the step failed: {source}")]
    RefreshAfterWrite {
        #[source]
        source: ApiError,
    },

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl FlowError {
    /// The API error behind this failure, if any
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            FlowError::Api(e) | FlowError::RefreshAfterWrite { source: e } => Some(e),
            _ => None,
        }
    }

    /// True when the caller must sign in again
    pub fn is_auth_failure(&self) -> bool {
        self.api_error().is_some_and(ApiError::is_auth_failure)
    }
}

/// Where to go after the flow is completed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnTarget {
    /// Overview of the chapter containing the enrollment's section
    Chapter(i64),
    /// Fallback when the chapter could not be resolved
    Home(String),
}

impl ReturnTarget {
    pub fn route(&self) -> String {
        match self {
            ReturnTarget::Chapter(id) => Chapter::overview_route(*id),
            ReturnTarget::Home(route) => route.clone(),
        }
    }
}

/// Everything known about a loaded enrollment
#[derive(Debug)]
struct FlowState {
    enrollment: Enrollment,
    /// Sorted by order index
    steps: Vec<Step>,
    progress: ProgressByOrder,
    answers: AnswersByStep,
    chapter_id: Option<i64>,
    current: usize,
    substep: Substep,
    paragraph: Option<ParagraphVersion>,
    impression_draft: String,
    reflection_draft: String,
}

/// Controller for a single enrollment
pub struct EnrollmentFlow {
    learning: Arc<LearningService>,
    content: Arc<ContentService>,
    answer_selection: AnswerSelection,
    home_route: String,
    state: Option<FlowState>,
}

impl EnrollmentFlow {
    pub fn new(learning: Arc<LearningService>, content: Arc<ContentService>, config: &Config) -> Self {
        Self {
            learning,
            content,
            answer_selection: config.flow.answer_selection,
            home_route: config.auth.home_route.clone(),
            state: None,
        }
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Load an enrollment with its steps, progress and answers
    ///
    /// Fails as a whole if the enrollment, its steps or its progress cannot
    /// be fetched. A step whose answers cannot be fetched gets an empty
    /// answer list, and an unresolvable chapter leaves the return target at
    /// home, unless the session expired, which fails the load. Cancelling
    /// `cancel` aborts the load; in every failure case the controller is left
    /// unloaded.
    pub async fn load(&mut self, enrollment_id: i64, cancel: &CancellationToken) -> Result<(), FlowError> {
        self.state = None;

        let enrollment = race(cancel, self.learning.enrollment(enrollment_id)).await??;
        let steps = race(cancel, self.learning.steps_for_template(enrollment.template_id)).await??;
        let records = race(cancel, self.learning.progress_for_enrollment(enrollment_id)).await??;
        let progress = progress::progress_by_order_index(&steps, records);

        let mut answers = AnswersByStep::with_capacity(steps.len());
        for step in &steps {
            let list = match race(cancel, self.learning.answers(enrollment_id, step.id)).await? {
                Ok(list) => list,
                Err(e) if e.is_auth_failure() => return Err(e.into()),
                Err(e) => {
                    tracing::warn!(enrollment_id, step_id = step.id, error = %e, "failed to load answers for step");
                    Vec::new()
                }
            };
            answers.insert(step.id, list);
        }

        let chapter_id = match race(cancel, self.content.chapter_for_section(enrollment.section_id)).await? {
            Ok(chapter) => chapter,
            Err(e) if e.is_auth_failure() => return Err(e.into()),
            Err(e) => {
                tracing::warn!(section_id = enrollment.section_id, error = %e, "failed to resolve chapter");
                None
            }
        };

        let current = progress::initial_step_index(&steps, &progress);
        tracing::info!(
            enrollment_id,
            steps = steps.len(),
            current_step = current,
            chapter_id = ?chapter_id,
            "enrollment loaded"
        );

        let mut state = FlowState {
            enrollment,
            steps,
            progress,
            answers,
            chapter_id,
            current,
            substep: Substep::Impression,
            paragraph: None,
            impression_draft: String::new(),
            reflection_draft: String::new(),
        };
        state.seed_drafts(self.answer_selection);
        self.state = Some(state);
        Ok(())
    }

    /// Load like [`load`](Self::load), giving up once `interrupt` resolves
    ///
    /// `interrupt` is only watched for the duration of the load. If it
    /// resolves with an error (no signal handler could be installed) the load
    /// carries on uninterrupted.
    pub async fn load_until<S>(&mut self, enrollment_id: i64, interrupt: S) -> Result<(), FlowError>
    where
        S: Future<Output = std::io::Result<()>>,
    {
        self.state = None;
        let cancel = CancellationToken::new();
        tokio::select! {
            result = self.load(enrollment_id, &cancel) => result,
            Ok(()) = interrupt => {
                tracing::info!(enrollment_id, "load interrupted");
                Err(FlowError::Cancelled)
            }
        }
    }

    /// Fetch the current step's paragraph and open the matching substep
    pub async fn load_step_content(&mut self) -> Result<Option<&ParagraphVersion>, FlowError> {
        let paragraph_id = self.current_step_ref()?.paragraph_id;
        let paragraph = self.content.paragraph_published_version(paragraph_id).await?;
        if paragraph.is_none() {
            tracing::debug!(paragraph_id, "paragraph has no published version");
        }

        let selection = self.answer_selection;
        let state = self.state_mut()?;
        state.substep = progress::initial_substep(paragraph.as_ref());
        state.paragraph = paragraph;
        state.seed_drafts(selection);
        Ok(state.paragraph.as_ref())
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Make `index` the current step; any loaded step may be selected
    pub fn select_step(&mut self, index: usize) -> Result<(), FlowError> {
        let selection = self.answer_selection;
        let state = self.state_mut()?;
        if index >= state.steps.len() {
            return Err(FlowError::StepOutOfRange {
                index,
                len: state.steps.len(),
            });
        }

        if state.current != index {
            state.current = index;
            state.substep = Substep::Impression;
            state.paragraph = None;
        }
        state.seed_drafts(selection);
        Ok(())
    }

    /// Move to the next step, staying on the last one
    pub fn next_step(&mut self) -> Result<usize, FlowError> {
        let state = self.state()?;
        let next = (state.current + 1).min(state.steps.len().saturating_sub(1));
        self.select_step(next)?;
        Ok(next)
    }

    /// Move to the previous step, staying on the first one
    pub fn previous_step(&mut self) -> Result<usize, FlowError> {
        let previous = self.state()?.current.saturating_sub(1);
        self.select_step(previous)?;
        Ok(previous)
    }

    pub fn set_substep(&mut self, substep: Substep) -> Result<(), FlowError> {
        self.state_mut()?.substep = substep;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Save a first impression for the current step
    ///
    /// Returns `Ok(false)` without contacting the server when `text` is blank.
    /// [`FlowError::RefreshAfterWrite`] means the answer was stored and only
    /// the local view is stale.
    pub async fn save_impression(&mut self, text: &str) -> Result<bool, FlowError> {
        self.save_answer(AnswerType::PictureQuestion, text).await
    }

    /// Save a reflection for the current step
    ///
    /// Same contract as [`save_impression`](Self::save_impression).
    pub async fn save_reflection(&mut self, text: &str) -> Result<bool, FlowError> {
        self.save_answer(AnswerType::Reflection, text).await
    }

    async fn save_answer(&mut self, kind: AnswerType, text: &str) -> Result<bool, FlowError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(false);
        }

        let enrollment_id = self.state()?.enrollment.id;
        let step = self.current_step_ref()?.clone();

        self.learning.add_answer(enrollment_id, step.id, kind, text).await?;
        self.refresh_step(&step).await.map_err(|e| match e {
            FlowError::Api(source) => {
                tracing::warn!(enrollment_id, step_id = step.id, error = %source, "answer saved but step reload failed");
                FlowError::RefreshAfterWrite { source }
            }
            other => other,
        })?;
        Ok(true)
    }

    /// Mark the current step COMPLETED
    ///
    /// Does not check [`can_complete_step`](Self::can_complete_step); callers
    /// decide whether to require both answers first.
    pub async fn complete_step(&mut self) -> Result<(), FlowError> {
        let enrollment_id = self.state()?.enrollment.id;
        let step = self.current_step_ref()?.clone();

        let updated = self
            .learning
            .update_progress(enrollment_id, step.id, ProgressStatus::Completed)
            .await?;
        let record = self
            .learning
            .progress_for_step(enrollment_id, step.id)
            .await?
            .unwrap_or(updated);

        tracing::info!(enrollment_id, step_id = step.id, status = %record.status, "step completed");
        self.state_mut()?.progress.insert(step.order_index, record);
        Ok(())
    }

    /// Complete the enrollment and return where to navigate next
    pub async fn complete_flow(&mut self) -> Result<ReturnTarget, FlowError> {
        let enrollment_id = self.state()?.enrollment.id;
        self.learning.complete_enrollment(enrollment_id).await?;
        Ok(self.return_target())
    }

    /// Re-read a step's answers and progress and replace the local copies
    async fn refresh_step(&mut self, step: &Step) -> Result<(), FlowError> {
        let enrollment_id = self.state()?.enrollment.id;
        let answers = self.learning.answers(enrollment_id, step.id).await?;
        let record = self.learning.progress_for_step(enrollment_id, step.id).await?;

        let selection = self.answer_selection;
        let state = self.state_mut()?;
        state.answers.insert(step.id, answers);
        match record {
            Some(record) => {
                state.progress.insert(step.order_index, record);
            }
            None => {
                state.progress.remove(&step.order_index);
            }
        }
        state.seed_drafts(selection);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Derived state
    // ------------------------------------------------------------------

    pub fn is_loaded(&self) -> bool {
        self.state.is_some()
    }

    pub fn enrollment(&self) -> Option<&Enrollment> {
        self.state.as_ref().map(|s| &s.enrollment)
    }

    /// Steps in flow order; empty when nothing is loaded
    pub fn steps(&self) -> &[Step] {
        self.state.as_ref().map(|s| s.steps.as_slice()).unwrap_or_default()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.state.as_ref().map(|s| s.current)
    }

    pub fn current_step(&self) -> Option<&Step> {
        self.state.as_ref().and_then(|s| s.steps.get(s.current))
    }

    pub fn substep(&self) -> Option<Substep> {
        self.state.as_ref().map(|s| s.substep)
    }

    /// Paragraph fetched by the last [`load_step_content`](Self::load_step_content)
    pub fn paragraph(&self) -> Option<&ParagraphVersion> {
        self.state.as_ref().and_then(|s| s.paragraph.as_ref())
    }

    pub fn impression_draft(&self) -> &str {
        self.state.as_ref().map(|s| s.impression_draft.as_str()).unwrap_or_default()
    }

    pub fn reflection_draft(&self) -> &str {
        self.state.as_ref().map(|s| s.reflection_draft.as_str()).unwrap_or_default()
    }

    pub fn status_of(&self, index: usize) -> Option<ProgressStatus> {
        let state = self.state.as_ref()?;
        state
            .steps
            .get(index)
            .map(|step| progress::step_status(step, &state.progress))
    }

    /// All answers stored for a step, in server order
    pub fn answers_for(&self, step_id: i64) -> &[Answer] {
        self.state
            .as_ref()
            .and_then(|s| s.answers.get(&step_id))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The answer of `kind` that counts for the current step
    pub fn current_answer(&self, kind: AnswerType) -> Option<&Answer> {
        let step = self.current_step()?;
        progress::select_current_answer(self.answers_for(step.id), kind, self.answer_selection)
    }

    pub fn completed_substeps(&self) -> usize {
        self.state
            .as_ref()
            .map(|s| progress::completed_substeps(&s.steps, &s.progress, &s.answers))
            .unwrap_or(0)
    }

    pub fn total_substeps(&self) -> usize {
        progress::total_substeps(self.steps())
    }

    pub fn progress_percentage(&self) -> f64 {
        self.state
            .as_ref()
            .map(|s| progress::progress_percentage(&s.steps, &s.progress, &s.answers))
            .unwrap_or(0.0)
    }

    pub fn all_steps_completed(&self) -> bool {
        self.state
            .as_ref()
            .is_some_and(|s| progress::all_steps_completed(&s.steps, &s.progress))
    }

    /// Both an impression and a reflection exist for the current step
    pub fn can_complete_step(&self) -> bool {
        self.current_answer(AnswerType::PictureQuestion).is_some()
            && self.current_answer(AnswerType::Reflection).is_some()
    }

    pub fn can_complete_flow(&self) -> bool {
        self.all_steps_completed()
    }

    pub fn chapter_id(&self) -> Option<i64> {
        self.state.as_ref().and_then(|s| s.chapter_id)
    }

    pub fn return_target(&self) -> ReturnTarget {
        match self.chapter_id() {
            Some(id) => ReturnTarget::Chapter(id),
            None => ReturnTarget::Home(self.home_route.clone()),
        }
    }

    fn state(&self) -> Result<&FlowState, FlowError> {
        self.state.as_ref().ok_or(FlowError::NotLoaded)
    }

    fn state_mut(&mut self) -> Result<&mut FlowState, FlowError> {
        self.state.as_mut().ok_or(FlowError::NotLoaded)
    }

    fn current_step_ref(&self) -> Result<&Step, FlowError> {
        let state = self.state()?;
        state.steps.get(state.current).ok_or(FlowError::StepOutOfRange {
            index: state.current,
            len: state.steps.len(),
        })
    }
}

impl FlowState {
    /// Prefill the answer drafts of the current step from stored answers
    fn seed_drafts(&mut self, selection: AnswerSelection) {
        let answers = self
            .steps
            .get(self.current)
            .and_then(|step| self.answers.get(&step.id))
            .map(Vec::as_slice)
            .unwrap_or_default();

        let text_of = |kind| {
            progress::select_current_answer(answers, kind, selection)
                .map(|a| a.answer_text.clone())
                .unwrap_or_default()
        };
        self.impression_draft = text_of(AnswerType::PictureQuestion);
        self.reflection_draft = text_of(AnswerType::Reflection);
    }
}

/// Run `fut` unless `cancel` fires first
async fn race<F: Future>(cancel: &CancellationToken, fut: F) -> Result<F::Output, FlowError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(FlowError::Cancelled),
        output = fut => Ok(output),
    }
}
