//! Content service
//!
//! Cached lookups over the content hierarchy, plus resolution of the
//! chapter a section belongs to. Chapter resolution asks the section
//! endpoint directly and only walks categories → books → chapters →
//! sections when that fails; either way the answer is memoized.

use std::sync::Arc;
use std::time::Duration;

use crate::api::{ApiError, ContentApi};
use crate::cache::Cache;
use crate::models::{Book, Category, Chapter, ParagraphVersion, Section};

const CONTENT_CACHE_TTL_SECS: u64 = 600;

/// Section → chapter links only change when content is restructured
const CHAPTER_LOOKUP_CACHE_TTL_SECS: u64 = 3600;

/// Cache key prefixes
const CACHE_KEY_CATEGORIES: &str = "content:categories";
const CACHE_KEY_BOOKS_BY_CATEGORY: &str = "content:books:category:";
const CACHE_KEY_CHAPTERS_BY_BOOK: &str = "content:chapters:book:";
const CACHE_KEY_SECTIONS_BY_CHAPTER: &str = "content:sections:chapter:";
const CACHE_KEY_PARAGRAPH_PUBLISHED: &str = "content:paragraph:published:";
const CACHE_KEY_CHAPTER_BY_SECTION: &str = "content:chapter:section:";

/// Read-only content lookups with caching
pub struct ContentService {
    api: Arc<dyn ContentApi>,
    cache: Arc<Cache>,
}

impl ContentService {
    pub fn new(api: Arc<dyn ContentApi>, cache: Arc<Cache>) -> Self {
        Self { api, cache }
    }

    fn ttl() -> Duration {
        Duration::from_secs(CONTENT_CACHE_TTL_SECS)
    }

    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        self.cache
            .get_or_load(CACHE_KEY_CATEGORIES, Self::ttl(), || self.api.get_categories())
            .await
    }

    pub async fn books_for_category(&self, category_id: i64) -> Result<Vec<Book>, ApiError> {
        let key = format!("{}{}", CACHE_KEY_BOOKS_BY_CATEGORY, category_id);
        self.cache
            .get_or_load(&key, Self::ttl(), || self.api.get_books_for_category(category_id))
            .await
    }

    pub async fn chapters_for_book(&self, book_id: i64) -> Result<Vec<Chapter>, ApiError> {
        let key = format!("{}{}", CACHE_KEY_CHAPTERS_BY_BOOK, book_id);
        self.cache
            .get_or_load(&key, Self::ttl(), || self.api.get_chapters_for_book(book_id))
            .await
    }

    pub async fn sections_for_chapter(&self, chapter_id: i64) -> Result<Vec<Section>, ApiError> {
        let key = format!("{}{}", CACHE_KEY_SECTIONS_BY_CHAPTER, chapter_id);
        self.cache
            .get_or_load(&key, Self::ttl(), || self.api.get_sections_for_chapter(chapter_id))
            .await
    }

    /// Published text of a paragraph; `None` while nothing is published
    pub async fn paragraph_published_version(
        &self,
        paragraph_id: i64,
    ) -> Result<Option<ParagraphVersion>, ApiError> {
        let key = format!("{}{}", CACHE_KEY_PARAGRAPH_PUBLISHED, paragraph_id);
        self.cache
            .get_or_load(&key, Self::ttl(), || {
                self.api.get_paragraph_published_version(paragraph_id)
            })
            .await
    }

    /// Id of the chapter containing `section_id`, or `None` if no chapter does
    pub async fn chapter_for_section(&self, section_id: i64) -> Result<Option<i64>, ApiError> {
        let key = format!("{}{}", CACHE_KEY_CHAPTER_BY_SECTION, section_id);
        self.cache
            .get_or_load(
                &key,
                Duration::from_secs(CHAPTER_LOOKUP_CACHE_TTL_SECS),
                || self.resolve_chapter(section_id),
            )
            .await
    }

    async fn resolve_chapter(&self, section_id: i64) -> Result<Option<i64>, ApiError> {
        match self.api.get_section(section_id).await {
            Ok(Some(section)) => return Ok(Some(section.chapter_id)),
            Ok(None) => {
                tracing::debug!(section_id, "section lookup returned nothing, walking content tree");
            }
            Err(e) if e.is_auth_failure() => return Err(e),
            Err(e) => {
                tracing::warn!(section_id, error = %e, "section lookup failed, walking content tree");
            }
        }

        let chapter = self.walk_for_chapter(section_id).await?;
        if chapter.is_none() {
            tracing::warn!(section_id, "section not found in any chapter");
        }
        Ok(chapter)
    }

    async fn walk_for_chapter(&self, section_id: i64) -> Result<Option<i64>, ApiError> {
        for category in self.categories().await? {
            for book in self.books_for_category(category.id).await? {
                for chapter in self.chapters_for_book(book.id).await? {
                    let sections = self.sections_for_chapter(chapter.id).await?;
                    if sections.iter().any(|s| s.id == section_id) {
                        return Ok(Some(chapter.id));
                    }
                }
            }
        }
        Ok(None)
    }
}
