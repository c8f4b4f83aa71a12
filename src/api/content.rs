//! Content endpoints
//!
//! Read-only access to the category → book → chapter → section hierarchy
//! and to published paragraph text.

use std::sync::Arc;

use async_trait::async_trait;

use super::{ApiClient, ApiError};
use crate::models::{Book, Category, Chapter, ParagraphVersion, Section};

/// Remote content lookups
#[async_trait]
pub trait ContentApi: Send + Sync {
    async fn get_categories(&self) -> Result<Vec<Category>, ApiError>;

    async fn get_books_for_category(&self, category_id: i64) -> Result<Vec<Book>, ApiError>;

    async fn get_chapters_for_book(&self, book_id: i64) -> Result<Vec<Chapter>, ApiError>;

    async fn get_sections_for_chapter(&self, chapter_id: i64) -> Result<Vec<Section>, ApiError>;

    /// Single section; `None` if it does not exist
    async fn get_section(&self, section_id: i64) -> Result<Option<Section>, ApiError>;

    /// Published version of a paragraph; `None` if nothing is published yet
    async fn get_paragraph_published_version(
        &self,
        paragraph_id: i64,
    ) -> Result<Option<ParagraphVersion>, ApiError>;
}

/// [`ContentApi`] backed by the platform's REST endpoints
pub struct HttpContentApi {
    client: Arc<ApiClient>,
}

impl HttpContentApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ContentApi for HttpContentApi {
    async fn get_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.client.get("/content/categories").await
    }

    async fn get_books_for_category(&self, category_id: i64) -> Result<Vec<Book>, ApiError> {
        self.client
            .get(&format!("/content/categories/{}/books", category_id))
            .await
    }

    async fn get_chapters_for_book(&self, book_id: i64) -> Result<Vec<Chapter>, ApiError> {
        self.client
            .get(&format!("/content/books/{}/chapters", book_id))
            .await
    }

    async fn get_sections_for_chapter(&self, chapter_id: i64) -> Result<Vec<Section>, ApiError> {
        self.client
            .get(&format!("/content/chapters/{}/sections", chapter_id))
            .await
    }

    async fn get_section(&self, section_id: i64) -> Result<Option<Section>, ApiError> {
        self.client
            .get_optional(&format!("/content/sections/{}", section_id))
            .await
    }

    async fn get_paragraph_published_version(
        &self,
        paragraph_id: i64,
    ) -> Result<Option<ParagraphVersion>, ApiError> {
        self.client
            .get_optional(&format!("/content/paragraphs/{}/versions/published", paragraph_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, AuthConfig};
    use crate::services::Session;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn api_for(server: &MockServer) -> HttpContentApi {
        let config = ApiConfig {
            base_url: server.uri(),
            ..ApiConfig::default()
        };
        let client = ApiClient::new(&config, &AuthConfig::default(), Arc::new(Session::new())).unwrap();
        HttpContentApi::new(Arc::new(client))
    }

    #[tokio::test]
    async fn test_get_section() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/content/sections/12"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 12, "chapterId": 3, "orderIndex": 2
            })))
            .mount(&server)
            .await;

        let section = api_for(&server).await.get_section(12).await.unwrap().unwrap();
        assert_eq!(section.chapter_id, 3);
    }

    #[tokio::test]
    async fn test_unpublished_paragraph_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/content/paragraphs/40/versions/published"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let version = api_for(&server)
            .await
            .get_paragraph_published_version(40)
            .await
            .unwrap();
        assert!(version.is_none());
    }

    #[tokio::test]
    async fn test_get_chapters_for_book() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/content/books/2/chapters"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 5, "bookId": 2, "chapterNumber": 1, "position": 0 },
                { "id": 6, "bookId": 2, "chapterNumber": 2, "position": 1 }
            ])))
            .mount(&server)
            .await;

        let chapters = api_for(&server).await.get_chapters_for_book(2).await.unwrap();
        assert_eq!(chapters.iter().map(|c| c.id).collect::<Vec<_>>(), vec![5, 6]);
    }
}
