//! In-process session store.
//!
//! Each session is keyed by an opaque random identifier carried in a cookie
//! and holds at most one principal and one CSRF token. Entries are created
//! lazily on first request, expire after an idle TTL, and are removed
//! entirely on logout so a replayed identifier never yields state.

use anyhow::Result;
use axum::http::{HeaderValue, header::InvalidHeaderValue};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::principal::Principal;
use super::utils::{generate_csrf_token, generate_session_id};

pub const SESSION_COOKIE_NAME: &str = "tabulo_session";

struct Entry {
    principal: Option<Principal>,
    csrf_token: String,
    touched_at: Instant,
}

/// Snapshot of one session as seen by a single request.
#[derive(Debug, Clone)]
pub struct ResolvedSession {
    pub id: String,
    pub principal: Option<Principal>,
    pub csrf_token: String,
    /// True when this request created the session and must set the cookie.
    pub created: bool,
}

/// Owns every live session. All mutation goes through the store lock, so
/// concurrent requests on the same session serialize on login/logout while
/// reads stay trivially safe.
pub struct SessionManager {
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry>>,
}

impl SessionManager {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve the session for a request, creating one lazily.
    ///
    /// Unknown and expired identifiers are never revived; the request gets a
    /// fresh identifier instead.
    ///
    /// # Errors
    /// Returns an error only if the system RNG fails while minting tokens.
    pub async fn resolve(&self, cookie_id: Option<&str>) -> Result<ResolvedSession> {
        let mut entries = self.entries.lock().await;
        entries.retain(|_, entry| entry.touched_at.elapsed() < self.ttl);

        if let Some(id) = cookie_id {
            if let Some(entry) = entries.get_mut(id) {
                entry.touched_at = Instant::now();
                return Ok(ResolvedSession {
                    id: id.to_string(),
                    principal: entry.principal.clone(),
                    csrf_token: entry.csrf_token.clone(),
                    created: false,
                });
            }
        }

        let id = generate_session_id()?;
        let csrf_token = generate_csrf_token()?;
        entries.insert(
            id.clone(),
            Entry {
                principal: None,
                csrf_token: csrf_token.clone(),
                touched_at: Instant::now(),
            },
        );
        Ok(ResolvedSession {
            id,
            principal: None,
            csrf_token,
            created: true,
        })
    }

    /// Bind a principal to the session's current identifier.
    ///
    /// The CSRF token is regenerated so a token handed out before
    /// authentication can never authorize a state-changing request afterwards
    /// (session-fixation defense).
    ///
    /// # Errors
    /// Returns an error only if the system RNG fails.
    pub async fn login(&self, id: &str, principal: Principal) -> Result<()> {
        let csrf_token = generate_csrf_token()?;
        let mut entries = self.entries.lock().await;
        let entry = entries.entry(id.to_string()).or_insert_with(|| Entry {
            principal: None,
            csrf_token: csrf_token.clone(),
            touched_at: Instant::now(),
        });
        entry.principal = Some(principal);
        entry.csrf_token = csrf_token;
        entry.touched_at = Instant::now();
        Ok(())
    }

    /// Invalidate the session entirely. Idempotent: logging out an unknown or
    /// already-logged-out identifier is a no-op.
    pub async fn logout(&self, id: &str) {
        let mut entries = self.entries.lock().await;
        entries.remove(id);
    }

    /// Read-only principal lookup.
    pub async fn current_principal(&self, id: &str) -> Option<Principal> {
        let entries = self.entries.lock().await;
        entries.get(id).and_then(|entry| entry.principal.clone())
    }

    /// The session's current CSRF token, if the session exists.
    pub async fn csrf_token(&self, id: &str) -> Option<String> {
        let entries = self.entries.lock().await;
        entries.get(id).map(|entry| entry.csrf_token.clone())
    }
}

/// Build the `Set-Cookie` value for a freshly issued session identifier.
///
/// # Errors
/// Returns an error if the identifier contains bytes invalid in a header.
pub fn session_cookie(id: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE_NAME}={id}; Path=/; HttpOnly; SameSite=Lax"
    ))
}

/// Build the `Set-Cookie` value that clears the session cookie after logout.
///
/// # Errors
/// Returns an error if the value cannot be represented as a header.
pub fn clear_session_cookie() -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"
    ))
}
