//! Session context
//!
//! Holds the signed-in user and the current token pair. A single `Session`
//! is shared (behind `Arc`) by the API client and whoever drives it; the
//! client replaces the tokens after a refresh and clears them when the
//! refresh token is rejected.

use crate::models::{AuthTokens, LoginResponse};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone, Default)]
struct SessionState {
    user_id: Option<i64>,
    tokens: Option<AuthTokens>,
}

/// Authentication context shared by the API client and its callers
#[derive(Debug, Default)]
pub struct Session {
    state: RwLock<SessionState>,
}

impl Session {
    /// Create an empty (signed-out) session
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session from previously issued tokens
    pub fn with_tokens(user_id: Option<i64>, tokens: AuthTokens) -> Self {
        Self {
            state: RwLock::new(SessionState {
                user_id,
                tokens: Some(tokens),
            }),
        }
    }

    /// Store the user and tokens returned by a successful login
    pub fn establish(&self, login: &LoginResponse) {
        let mut state = self.write();
        state.user_id = Some(login.user_id);
        state.tokens = Some(login.tokens());
        tracing::debug!(user_id = login.user_id, "session established");
    }

    /// Replace the token pair, keeping the user
    pub fn set_tokens(&self, tokens: AuthTokens) {
        self.write().tokens = Some(tokens);
    }

    /// Forget the user and tokens
    pub fn clear(&self) {
        let mut state = self.write();
        if state.tokens.is_some() {
            tracing::info!(user_id = ?state.user_id, "session cleared");
        }
        *state = SessionState::default();
    }

    pub fn user_id(&self) -> Option<i64> {
        self.read().user_id
    }

    pub fn access_token(&self) -> Option<String> {
        self.read().tokens.as_ref().map(|t| t.token.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read()
            .tokens
            .as_ref()
            .map(|t| t.refresh_token.clone())
            .filter(|t| !t.is_empty())
    }

    pub fn tokens(&self) -> Option<AuthTokens> {
        self.read().tokens.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().tokens.is_some()
    }

    // Writers replace whole fields, so a poisoned lock still holds valid state
    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(token: &str, refresh: &str) -> AuthTokens {
        AuthTokens {
            token: token.to_string(),
            refresh_token: refresh.to_string(),
            expires_at: None,
        }
    }

    #[test]
    fn test_new_session_is_signed_out() {
        let session = Session::new();
        assert!(!session.is_authenticated());
        assert_eq!(session.access_token(), None);
        assert_eq!(session.user_id(), None);
    }

    #[test]
    fn test_establish_from_login() {
        let session = Session::new();
        session.establish(&LoginResponse {
            user_id: 3,
            email: "a@b.c".to_string(),
            token: "t".to_string(),
            refresh_token: "r".to_string(),
            expires_at: None,
        });

        assert_eq!(session.user_id(), Some(3));
        assert_eq!(session.access_token().as_deref(), Some("t"));
        assert_eq!(session.refresh_token().as_deref(), Some("r"));
    }

    #[test]
    fn test_set_tokens_keeps_user() {
        let session = Session::with_tokens(Some(9), tokens("old", "r1"));
        session.set_tokens(tokens("new", "r2"));

        assert_eq!(session.user_id(), Some(9));
        assert_eq!(session.access_token().as_deref(), Some("new"));
        assert_eq!(session.refresh_token().as_deref(), Some("r2"));
    }

    #[test]
    fn test_clear() {
        let session = Session::with_tokens(Some(9), tokens("t", "r"));
        session.clear();

        assert!(!session.is_authenticated());
        assert_eq!(session.user_id(), None);
        assert_eq!(session.refresh_token(), None);
    }

    #[test]
    fn test_empty_refresh_token_counts_as_missing() {
        let session = Session::with_tokens(None, tokens("t", ""));
        assert_eq!(session.refresh_token(), None);
    }
}
