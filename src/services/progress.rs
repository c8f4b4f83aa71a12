//! Derived enrollment progress
//!
//! Pure functions over the state the flow controller holds: sorted steps,
//! progress keyed by step order index, and answers keyed by step id. Every
//! step has three substeps (impression, content, reflection) and each one
//! counts as done when:
//! - impression: a PICTURE_QUESTION answer exists
//! - content: the step's status is IN_PROGRESS or COMPLETED
//! - reflection: a REFLECTION answer exists

use std::collections::HashMap;

use crate::config::AnswerSelection;
use crate::models::{Answer, AnswerType, ParagraphVersion, ProgressStatus, Step, StepProgress};

/// Number of substeps in every step
pub const SUBSTEPS_PER_STEP: usize = 3;

/// Progress records keyed by the order index of their step
pub type ProgressByOrder = HashMap<i32, StepProgress>;

/// Answers keyed by step id
pub type AnswersByStep = HashMap<i64, Vec<Answer>>;

/// Part of a step the user is working on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Substep {
    Impression = 1,
    Content = 2,
    Reflection = 3,
}

impl Substep {
    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Substep::Impression),
            2 => Some(Substep::Content),
            3 => Some(Substep::Reflection),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Substep::Impression => "impression",
            Substep::Content => "content",
            Substep::Reflection => "reflection",
        }
    }
}

/// Key progress records by the order index of the step they belong to
///
/// Records for steps that are not part of `steps` are dropped.
pub fn progress_by_order_index(steps: &[Step], records: Vec<StepProgress>) -> ProgressByOrder {
    let order_of: HashMap<i64, i32> = steps.iter().map(|s| (s.id, s.order_index)).collect();

    records
        .into_iter()
        .filter_map(|record| order_of.get(&record.step_id).map(|order| (*order, record)))
        .collect()
}

/// Status of a step; steps without a record are NOT_STARTED
pub fn step_status(step: &Step, progress: &ProgressByOrder) -> ProgressStatus {
    progress
        .get(&step.order_index)
        .map(|p| p.status)
        .unwrap_or_default()
}

pub fn has_answer(answers: &AnswersByStep, step_id: i64, kind: AnswerType) -> bool {
    answers
        .get(&step_id)
        .is_some_and(|list| list.iter().any(|a| a.answer_type == kind))
}

/// Number of completed substeps of a single step (0..=3)
pub fn completed_substeps_for_step(step: &Step, progress: &ProgressByOrder, answers: &AnswersByStep) -> usize {
    let impression = has_answer(answers, step.id, AnswerType::PictureQuestion);
    let content = step_status(step, progress).is_started();
    let reflection = has_answer(answers, step.id, AnswerType::Reflection);

    [impression, content, reflection].into_iter().filter(|done| *done).count()
}

pub fn completed_substeps(steps: &[Step], progress: &ProgressByOrder, answers: &AnswersByStep) -> usize {
    steps
        .iter()
        .map(|step| completed_substeps_for_step(step, progress, answers))
        .sum()
}

pub fn total_substeps(steps: &[Step]) -> usize {
    steps.len() * SUBSTEPS_PER_STEP
}

/// Completed substeps as a percentage of all substeps; 0 for an empty flow
pub fn progress_percentage(steps: &[Step], progress: &ProgressByOrder, answers: &AnswersByStep) -> f64 {
    let total = total_substeps(steps);
    if total == 0 {
        return 0.0;
    }
    completed_substeps(steps, progress, answers) as f64 / total as f64 * 100.0
}

/// True when every step is COMPLETED; false for an empty flow
pub fn all_steps_completed(steps: &[Step], progress: &ProgressByOrder) -> bool {
    !steps.is_empty()
        && steps
            .iter()
            .all(|step| step_status(step, progress) == ProgressStatus::Completed)
}

/// Index of the first step that is not COMPLETED, or 0
pub fn initial_step_index(steps: &[Step], progress: &ProgressByOrder) -> usize {
    steps
        .iter()
        .position(|step| step_status(step, progress) != ProgressStatus::Completed)
        .unwrap_or(0)
}

/// Substep to open a step on
///
/// Introduction and conclusion paragraphs have nothing to react to, so they
/// open directly on the content. Recognised by title only.
pub fn initial_substep(paragraph: Option<&ParagraphVersion>) -> Substep {
    let title = paragraph
        .and_then(|p| p.title())
        .map(str::to_lowercase)
        .unwrap_or_default();

    if title.contains("introduction") || title.contains("conclusion") {
        Substep::Content
    } else {
        Substep::Impression
    }
}

/// The answer of `kind` that counts as the current one
pub fn select_current_answer(answers: &[Answer], kind: AnswerType, policy: AnswerSelection) -> Option<&Answer> {
    let mut matching = answers.iter().filter(|a| a.answer_type == kind);
    match policy {
        AnswerSelection::First => matching.next(),
        AnswerSelection::Latest => matching.max_by_key(|a| (a.created_at, a.id)),
    }
}
