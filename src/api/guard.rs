//! Cross-cutting request interception: session resolution, audit logging,
//! role checks, and CSRF verification.
//!
//! One guard wraps every route group, so the deny-recovery protocol applies
//! uniformly no matter which handler the denial happened in front of: an
//! authenticated denial terminates the session and redirects to the original
//! URL with `?error=forbidden`; an anonymous denial goes to the login page.

use axum::{
    Extension,
    body::{Body, to_bytes},
    extract::{ConnectInfo, Request},
    http::{
        Method, StatusCode,
        header::{COOKIE, SET_COOKIE},
    },
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::net::SocketAddr;
use tracing::{error, warn};

use crate::auth::{
    access::{self, Decision, RoleRequirement},
    csrf::CSRF_FIELD_NAME,
    error::{AccessError, CsrfError},
    principal::{Principal, Role},
    session::{ResolvedSession, SESSION_COOKIE_NAME, session_cookie},
};

use super::state::AppState;

/// Form bodies larger than this are rejected before CSRF parsing.
const FORM_BODY_LIMIT: usize = 64 * 1024;

/// Session context the guard attaches to every request it lets through.
#[derive(Clone, Debug)]
pub struct SessionContext {
    pub session_id: String,
    pub principal: Option<Principal>,
    pub csrf_token: String,
}

pub async fn public_routes(state: Extension<AppState>, req: Request, next: Next) -> Response {
    enforce(&state, RoleRequirement::Public, req, next).await
}

pub async fn user_routes(state: Extension<AppState>, req: Request, next: Next) -> Response {
    enforce(&state, RoleRequirement::AnyAuthenticated, req, next).await
}

pub async fn admin_routes(state: Extension<AppState>, req: Request, next: Next) -> Response {
    enforce(&state, RoleRequirement::HasRole(Role::Admin), req, next).await
}

async fn enforce(
    state: &AppState,
    required: RoleRequirement,
    mut req: Request,
    next: Next,
) -> Response {
    let target = req
        .uri()
        .path_and_query()
        .map_or_else(|| req.uri().path().to_string(), |pq| pq.as_str().to_string());
    let addr = client_addr(&req);

    let cookie_id = session_cookie_value(&req);
    let session = match state.sessions.resolve(cookie_id.as_deref()).await {
        Ok(session) => session,
        Err(err) => {
            error!("failed to resolve session: {err:#}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    state.audit.record(
        session.principal.as_ref().map(Principal::username),
        &addr,
        &target,
    );

    if access::authorize(session.principal.as_ref(), required) == Decision::Deny {
        let denied = AccessError::Denied {
            target: target.clone(),
        };
        warn!(
            error = %denied,
            user = session.principal.as_ref().map_or("-", |p| p.username()),
            addr,
            "denying request"
        );
        return deny(state, &session, &target).await;
    }

    // CSRF applies to state-changing requests on protected routes. The login
    // POST lives in the public group: it cannot mutate anything until
    // authentication succeeds, and login regenerates the token anyway.
    if required != RoleRequirement::Public && req.method() == Method::POST {
        let (parts, body) = req.into_parts();
        let bytes = match to_bytes(body, FORM_BODY_LIMIT).await {
            Ok(bytes) => bytes,
            Err(_) => return StatusCode::PAYLOAD_TOO_LARGE.into_response(),
        };
        let supplied = form_field(&bytes, CSRF_FIELD_NAME);
        if !state.csrf.validate(&session.id, supplied.as_deref()).await {
            warn!(
                error = %CsrfError::TokenMismatch,
                user = session.principal.as_ref().map_or("-", |p| p.username()),
                addr,
                target,
                "rejecting state-changing request"
            );
            return deny(state, &session, &target).await;
        }
        // Hand the buffered body back so the handler's form extractor works.
        req = Request::from_parts(parts, Body::from(bytes));
    }

    req.extensions_mut().insert(SessionContext {
        session_id: session.id.clone(),
        principal: session.principal.clone(),
        csrf_token: session.csrf_token.clone(),
    });

    let mut response = next.run(req).await;

    if session.created {
        match session_cookie(&session.id) {
            Ok(cookie) => {
                response.headers_mut().append(SET_COOKIE, cookie);
            }
            Err(err) => error!("failed to build session cookie: {err}"),
        }
    }

    response
}

/// Deny protocol: terminate the session, then either bounce an authenticated
/// caller back to the denied URL with the forbidden marker, or send an
/// anonymous caller to the login page. The session is either fully removed or
/// untouched, never half-cleared.
async fn deny(state: &AppState, session: &ResolvedSession, target: &str) -> Response {
    state.sessions.logout(&session.id).await;
    if session.principal.is_some() {
        access::forbidden_redirect(target)
    } else {
        Redirect::to("/login").into_response()
    }
}

fn session_cookie_value(req: &Request) -> Option<String> {
    let header = req.headers().get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == SESSION_COOKIE_NAME {
            return Some(val.to_string());
        }
    }
    None
}

/// Client address for the audit trail: proxy headers first, then the socket.
fn client_addr(req: &Request) -> String {
    let headers = req.headers();
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if let Some(forwarded) = forwarded {
        return forwarded.to_string();
    }
    if let Some(real_ip) = headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
    {
        return real_ip.to_string();
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| "unknown".to_string(), |ConnectInfo(addr)| addr.to_string())
}

/// Extract a field from a urlencoded form body without consuming it.
fn form_field(bytes: &[u8], name: &str) -> Option<String> {
    url::form_urlencoded::parse(bytes)
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}
