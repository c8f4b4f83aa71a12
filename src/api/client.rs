//! HTTP client for the platform REST API
//!
//! Every request goes through [`ApiClient::send`], which:
//! - attaches the session's access token as a bearer token
//! - on a 401, exchanges the refresh token once and replays the request
//! - clears the session and returns [`ApiError::SessionExpired`] when the
//!   refresh token is missing or rejected
//! - logs failed responses, keeping expected 404s out of the error log

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::{error_message, ApiError};
use crate::config::{ApiConfig, AuthConfig};
use crate::models::{AuthTokens, RefreshTokenRequest};
use crate::services::Session;

/// Path prefix of every platform endpoint
pub const API_PREFIX: &str = "/api/v2";

const REFRESH_PATH: &str = "/user/refresh";

/// Authenticated client for a single platform backend
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    login_route: String,
    quiet_not_found: Vec<String>,
    session: Arc<Session>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.session.is_authenticated())
            .finish()
    }
}

impl ApiClient {
    /// Build a client from configuration
    ///
    /// # Errors
    /// `ApiError::Config` if the underlying HTTP client cannot be created
    pub fn new(api: &ApiConfig, auth: &AuthConfig, session: Arc<Session>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(api.timeout_seconds))
            .user_agent(api.user_agent.clone())
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;

        Ok(Self {
            http,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            login_route: auth.login_route.clone(),
            quiet_not_found: api.quiet_not_found.clone(),
            session,
        })
    }

    /// Session whose tokens this client uses
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Route reported with `ApiError::SessionExpired`
    pub fn login_route(&self) -> &str {
        &self.login_route
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        let body = self.send(Method::GET, &url, None).await?;
        decode(&url, &body)
    }

    /// GET that maps a 404 to `None`
    pub async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ApiError> {
        match self.get(path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let payload = encode(&url, body)?;
        let response = self.send(Method::POST, &url, Some(payload)).await?;
        decode(&url, &response)
    }

    /// POST whose response body is ignored
    pub async fn post_unit<B>(&self, path: &str, body: &B) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        let payload = encode(&url, body)?;
        self.send(Method::POST, &url, Some(payload)).await?;
        Ok(())
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let payload = encode(&url, body)?;
        let response = self.send(Method::PUT, &url, Some(payload)).await?;
        decode(&url, &response)
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let url = self.url(path);
        self.send(Method::DELETE, &url, None).await?;
        Ok(())
    }

    /// POST without a bearer token and without refresh handling
    ///
    /// Used for login and registration, where a 401 means bad credentials
    /// rather than an expired session.
    pub async fn post_anonymous<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let payload = encode(&url, body)?;
        let response = self.dispatch(&Method::POST, &url, Some(&payload), None).await?;
        let text = self.read_body(&Method::POST, &url, response).await?;
        decode(&url, &text)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    /// Send a request with the session token, refreshing once on a 401
    async fn send(&self, method: Method, url: &str, body: Option<Vec<u8>>) -> Result<String, ApiError> {
        let token = self.session.access_token();
        let response = self
            .dispatch(&method, url, body.as_deref(), token.as_deref())
            .await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return self.read_body(&method, url, response).await;
        }

        tracing::debug!(%method, url, "access token rejected, refreshing");
        let token = self.refresh().await?;

        let retry = self
            .dispatch(&method, url, body.as_deref(), Some(&token))
            .await?;
        if retry.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!(%method, url, "request rejected after token refresh");
            return Err(self.expire());
        }

        self.read_body(&method, url, retry).await
    }

    /// Exchange the refresh token for a new token pair
    ///
    /// Returns the new access token. A missing or rejected refresh token
    /// tears the session down; transport and server errors leave it intact.
    async fn refresh(&self) -> Result<String, ApiError> {
        let Some(refresh_token) = self.session.refresh_token() else {
            tracing::info!("no refresh token available");
            return Err(self.expire());
        };

        let url = self.url(REFRESH_PATH);
        let payload = encode(&url, &RefreshTokenRequest { refresh_token })?;
        let response = self.dispatch(&Method::POST, &url, Some(&payload), None).await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::BAD_REQUEST {
            tracing::warn!(status = status.as_u16(), "refresh token rejected");
            return Err(self.expire());
        }

        let text = self.read_body(&Method::POST, &url, response).await?;
        let tokens: AuthTokens = decode(&url, &text)?;
        let access = tokens.token.clone();
        self.session.set_tokens(tokens);

        tracing::debug!("access token refreshed");
        Ok(access)
    }

    fn expire(&self) -> ApiError {
        self.session.clear();
        ApiError::SessionExpired {
            login_route: self.login_route.clone(),
        }
    }

    async fn dispatch(
        &self,
        method: &Method,
        url: &str,
        body: Option<&[u8]>,
        token: Option<&str>,
    ) -> Result<reqwest::Response, ApiError> {
        let mut request = self.http.request(method.clone(), url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(body.to_vec());
        }

        request.send().await.map_err(|e| {
            tracing::error!(%method, url, error = %e, "request failed without response");
            ApiError::Request(e)
        })
    }

    /// Read the body of a response, turning non-2xx statuses into errors
    async fn read_body(
        &self,
        method: &Method,
        url: &str,
        response: reqwest::Response,
    ) -> Result<String, ApiError> {
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        let message = error_message(&body);
        if status == StatusCode::NOT_FOUND {
            if self.is_quiet(url) {
                tracing::debug!(%method, url, "resource not found");
            } else {
                tracing::warn!(%method, url, message = %message, "resource not found");
            }
        } else {
            tracing::error!(
                %method,
                url,
                status = status.as_u16(),
                message = %message,
                "API error response"
            );
        }

        Err(ApiError::Status {
            method: method.to_string(),
            url: url.to_string(),
            status: status.as_u16(),
            message,
        })
    }

    fn is_quiet(&self, url: &str) -> bool {
        self.quiet_not_found.iter().any(|fragment| url.contains(fragment.as_str()))
    }
}

fn encode<B: Serialize + ?Sized>(url: &str, body: &B) -> Result<Vec<u8>, ApiError> {
    serde_json::to_vec(body).map_err(|source| ApiError::Encode {
        url: url.to_string(),
        source,
    })
}

fn decode<T: DeserializeOwned>(url: &str, body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|source| ApiError::Decode {
        url: url.to_string(),
        source,
    })
}
