//! User authentication endpoints
//!
//! Login stores the issued tokens in the client's [`Session`]; logout is
//! local only, since the platform issues stateless JWTs.
//!
//! [`Session`]: crate::services::Session

use std::sync::Arc;

use super::{ApiClient, ApiError};
use crate::models::{Credentials, LoginResponse, User};

/// Authentication operations on top of an [`ApiClient`]
pub struct AuthApi {
    client: Arc<ApiClient>,
}

impl AuthApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Sign in and establish the session
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let credentials = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self.client.post_anonymous("/user/login", &credentials).await?;

        self.client.session().establish(&response);
        tracing::info!(user_id = response.user_id, "signed in");
        Ok(response)
    }

    /// Create an account; does not sign in
    pub async fn register(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let credentials = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        let user: User = self.client.post_anonymous("/user/register", &credentials).await?;

        tracing::info!(user_id = user.id, "account registered");
        Ok(user)
    }

    /// Profile of the signed-in user
    ///
    /// # Errors
    /// `ApiError::SessionExpired` if there is no signed-in user
    pub async fn current_user(&self) -> Result<User, ApiError> {
        let Some(user_id) = self.client.session().user_id() else {
            return Err(ApiError::SessionExpired {
                login_route: self.login_route(),
            });
        };
        self.client.get(&format!("/user/{}", user_id)).await
    }

    pub fn logout(&self) {
        self.client.session().clear();
    }

    fn login_route(&self) -> String {
        self.client.login_route().to_string()
    }
}
