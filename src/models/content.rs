//! Content hierarchy models
//!
//! Content is organised as categories → books → chapters → sections →
//! paragraphs. Titles and bodies are bilingual (English and Dutch); the
//! versioned text lives in separate version records.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Top-level content category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    #[serde(default)]
    pub category_number: Option<i32>,
    #[serde(default)]
    pub wheel_id: Option<i64>,
    #[serde(default)]
    pub title_nl: Option<String>,
    #[serde(default)]
    pub title_en: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

/// Book within a category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i64,
    pub category_id: i64,
    #[serde(default)]
    pub book_number: Option<i32>,
}

/// Chapter within a book
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: i64,
    pub book_id: i64,
    #[serde(default)]
    pub chapter_number: Option<i32>,
    /// 0 for the centre of the circular menu, 1-10 around it
    #[serde(default)]
    pub position: i32,
}

impl Chapter {
    /// Route of the chapter overview page
    pub fn overview_route(chapter_id: i64) -> String {
        format!("/chapter/{}/overview", chapter_id)
    }
}

/// Section within a chapter; learning-flow templates attach here
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: i64,
    pub chapter_id: i64,
    #[serde(default)]
    pub order_index: i32,
}

/// Published text of a paragraph
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphVersion {
    pub id: i64,
    pub paragraph_id: i64,
    pub version_number: i32,
    #[serde(default)]
    pub title_en: Option<String>,
    #[serde(default)]
    pub title_nl: Option<String>,
    #[serde(default)]
    pub content_en: Option<String>,
    #[serde(default)]
    pub content_nl: Option<String>,
    #[serde(default)]
    pub created_by: Option<i64>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

impl ParagraphVersion {
    /// English title, falling back to Dutch; empty strings count as missing
    pub fn title(&self) -> Option<&str> {
        first_non_empty(&self.title_en, &self.title_nl)
    }

    /// English body, falling back to Dutch
    pub fn content(&self) -> Option<&str> {
        first_non_empty(&self.content_en, &self.content_nl)
    }
}

fn first_non_empty<'a>(preferred: &'a Option<String>, fallback: &'a Option<String>) -> Option<&'a str> {
    preferred
        .as_deref()
        .filter(|s| !s.is_empty())
        .or_else(|| fallback.as_deref().filter(|s| !s.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(title_en: Option<&str>, title_nl: Option<&str>) -> ParagraphVersion {
        ParagraphVersion {
            id: 1,
            paragraph_id: 1,
            version_number: 1,
            title_en: title_en.map(String::from),
            title_nl: title_nl.map(String::from),
            content_en: None,
            content_nl: Some("Inhoud".to_string()),
            created_by: None,
            created_at: None,
        }
    }

    #[test]
    fn test_title_prefers_english() {
        assert_eq!(paragraph(Some("Patience"), Some("Geduld")).title(), Some("Patience"));
    }

    #[test]
    fn test_title_falls_back_to_dutch_when_english_empty() {
        assert_eq!(paragraph(Some(""), Some("Geduld")).title(), Some("Geduld"));
        assert_eq!(paragraph(None, None).title(), None);
    }

    #[test]
    fn test_content_fallback() {
        assert_eq!(paragraph(None, None).content(), Some("Inhoud"));
    }

    #[test]
    fn test_section_deserialize() {
        let json = r#"{"id":5,"chapterId":2,"orderIndex":1,"workingStatusSectionVersionId":null}"#;
        let section: Section = serde_json::from_str(json).unwrap();
        assert_eq!(section.chapter_id, 2);
    }

    #[test]
    fn test_overview_route() {
        assert_eq!(Chapter::overview_route(8), "/chapter/8/overview");
    }
}
