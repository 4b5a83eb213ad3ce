//! Shared application state assembled at startup.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{
    audit::RequestAuditLogger,
    csrf::CsrfGuard,
    hash::HashParameters,
    identity::{CredentialStore, IdentityVerifier},
    session::SessionManager,
};
use crate::store::{messages::MessageStore, users::UserStore};

/// Everything the handlers and the guard need, cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub csrf: CsrfGuard,
    pub verifier: Arc<IdentityVerifier>,
    pub users: Arc<dyn UserStore>,
    pub messages: Arc<dyn MessageStore>,
    pub audit: Arc<dyn RequestAuditLogger>,
    /// Current process defaults, used only when generating new hashes.
    pub hash_params: HashParameters,
}

impl AppState {
    /// Wire the state from one store implementing both the credential-lookup
    /// and user-maintenance contracts.
    ///
    /// # Errors
    /// Returns an error if the identity verifier cannot be initialized.
    pub fn new<S>(
        users: Arc<S>,
        messages: Arc<dyn MessageStore>,
        audit: Arc<dyn RequestAuditLogger>,
        hash_params: HashParameters,
        session_ttl: Duration,
    ) -> Result<Self>
    where
        S: CredentialStore + UserStore + 'static,
    {
        let sessions = Arc::new(SessionManager::new(session_ttl));
        let csrf = CsrfGuard::new(sessions.clone());
        let credentials: Arc<dyn CredentialStore> = users.clone();
        let verifier = Arc::new(IdentityVerifier::new(credentials, &hash_params)?);
        let users: Arc<dyn UserStore> = users;

        Ok(Self {
            sessions,
            csrf,
            verifier,
            users,
            messages,
            audit,
            hash_params,
        })
    }
}
