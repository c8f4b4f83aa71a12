//! Platform API client
//!
//! - `client` - authenticated HTTP transport with token refresh
//! - `learning` - learning-flow endpoints
//! - `content` - content hierarchy endpoints
//! - `auth` - login, registration and the current user

pub mod auth;
pub mod client;
pub mod content;
pub mod error;
pub mod learning;

pub use auth::AuthApi;
pub use client::ApiClient;
pub use content::{ContentApi, HttpContentApi};
pub use error::ApiError;
pub use learning::{HttpLearningApi, LearningApi};
