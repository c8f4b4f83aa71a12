//! Learning-flow template and step models

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A named, ordered sequence of reflective steps for one section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub section_id: i64,
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub created_by: Option<i64>,
}

/// Input for creating a template
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplateInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub section_id: i64,
    pub created_by: i64,
}

/// One step of a template, pointing at a paragraph of content
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub id: i64,
    pub template_id: i64,
    pub paragraph_id: i64,
    /// Position in the flow; steps are presented in ascending order
    pub order_index: i32,
    /// Reflection prompt shown on the third substep
    #[serde(default)]
    pub question_text: Option<String>,
}

/// Sort steps into flow order
pub fn sort_steps(steps: &mut [Step]) {
    steps.sort_by_key(|s| s.order_index);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(id: i64, order_index: i32) -> Step {
        Step {
            id,
            template_id: 1,
            paragraph_id: id * 10,
            order_index,
            question_text: None,
        }
    }

    #[test]
    fn test_sort_steps_by_order_index() {
        let mut steps = vec![step(1, 3), step(2, 1), step(3, 2)];
        sort_steps(&mut steps);

        let ids: Vec<i64> = steps.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_step_question_text_optional() {
        let json = r#"{"id":1,"templateId":2,"paragraphId":3,"orderIndex":1}"#;
        let step: Step = serde_json::from_str(json).unwrap();
        assert_eq!(step.question_text, None);
    }
}
