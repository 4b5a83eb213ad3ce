//! Per-session anti-forgery tokens.
//!
//! Every form that triggers a state-changing request must carry a hidden
//! field named [`CSRF_FIELD_NAME`] whose value comes from [`CsrfGuard::issue`];
//! the rendering layer is responsible for embedding it. Validation runs on
//! every state-changing request and compares in constant time.

use std::sync::Arc;
use subtle::ConstantTimeEq;

use super::session::SessionManager;

/// Name of the hidden form field carrying the token.
pub const CSRF_FIELD_NAME: &str = "_csrf";

/// Issues and validates the per-session anti-forgery token.
#[derive(Clone)]
pub struct CsrfGuard {
    sessions: Arc<SessionManager>,
}

impl CsrfGuard {
    #[must_use]
    pub fn new(sessions: Arc<SessionManager>) -> Self {
        Self { sessions }
    }

    /// The session's current token. Idempotent within a session lifetime;
    /// only `login` replaces the token.
    pub async fn issue(&self, session_id: &str) -> Option<String> {
        self.sessions.csrf_token(session_id).await
    }

    /// Validate a supplied token against the session's stored token.
    ///
    /// An absent session, absent token, or mismatch all yield `false`.
    pub async fn validate(&self, session_id: &str, supplied: Option<&str>) -> bool {
        let Some(expected) = self.sessions.csrf_token(session_id).await else {
            return false;
        };
        supplied.is_some_and(|supplied| tokens_match(&expected, supplied))
    }
}

/// Constant-time token comparison.
pub(crate) fn tokens_match(expected: &str, supplied: &str) -> bool {
    expected.as_bytes().ct_eq(supplied.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::principal::{Principal, Role};
    use std::time::Duration;

    fn guard() -> (CsrfGuard, Arc<SessionManager>) {
        let sessions = Arc::new(SessionManager::new(Duration::from_secs(60)));
        (CsrfGuard::new(sessions.clone()), sessions)
    }

    #[test]
    fn comparison_requires_exact_match() {
        assert!(tokens_match("token-a", "token-a"));
        assert!(!tokens_match("token-a", "token-b"));
        assert!(!tokens_match("token-a", "token-a-longer"));
        assert!(!tokens_match("token-a", ""));
    }

    #[tokio::test]
    async fn issue_is_idempotent_until_login() -> anyhow::Result<()> {
        let (guard, sessions) = guard();
        let session = sessions.resolve(None).await?;

        let first = guard.issue(&session.id).await;
        let second = guard.issue(&session.id).await;
        assert_eq!(first, second);
        assert!(first.is_some());

        sessions
            .login(&session.id, Principal::new("alice", [Role::User]))
            .await?;
        let after_login = guard.issue(&session.id).await;
        assert_ne!(after_login, first);
        Ok(())
    }

    #[tokio::test]
    async fn validate_accepts_only_the_stored_token() -> anyhow::Result<()> {
        let (guard, sessions) = guard();
        let session = sessions.resolve(None).await?;

        assert!(guard.validate(&session.id, Some(&session.csrf_token)).await);
        assert!(!guard.validate(&session.id, Some("garbage")).await);
        assert!(!guard.validate(&session.id, None).await);
        Ok(())
    }

    #[tokio::test]
    async fn validate_fails_for_unknown_session() {
        let (guard, _sessions) = guard();
        assert!(!guard.validate("no-such-session", Some("anything")).await);
    }

    #[tokio::test]
    async fn pre_login_token_is_rejected_after_login() -> anyhow::Result<()> {
        let (guard, sessions) = guard();
        let session = sessions.resolve(None).await?;
        let pre_login = session.csrf_token.clone();

        sessions
            .login(&session.id, Principal::new("alice", [Role::User]))
            .await?;

        assert!(!guard.validate(&session.id, Some(&pre_login)).await);
        Ok(())
    }
}
