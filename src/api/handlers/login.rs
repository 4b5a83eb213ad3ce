//! Login and logout: the only handlers that touch the identity verifier.

use axum::{
    Extension, Form,
    http::{StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::Deserialize;
use tracing::{debug, error};
use utoipa::ToSchema;

use crate::api::{guard::SessionContext, state::AppState};
use crate::auth::{error::AuthError, session::clear_session_cookie};

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginForm {
    username: String,
    #[schema(format = Password)]
    password: String,
}

#[utoipa::path(
    post,
    path = "/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Authenticated; redirected to the board, or back to the login form with a generic failure indicator"),
        (status = 500, description = "Credential store unavailable")
    ),
    tag = "auth"
)]
pub async fn login(
    state: Extension<AppState>,
    session: Extension<SessionContext>,
    Form(form): Form<LoginForm>,
) -> Response {
    let password = SecretString::from(form.password);

    match state.verifier.authenticate(&form.username, &password).await {
        Ok(principal) => {
            if let Err(err) = state.sessions.login(&session.session_id, principal).await {
                error!("failed to bind principal to session: {err:#}");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
            Redirect::to("/list").into_response()
        }
        Err(AuthError::InvalidCredentials) => {
            // One generic indicator for both unknown user and wrong password.
            debug!("login failed");
            Redirect::to("/login?error=login_failed").into_response()
        }
        Err(AuthError::Store(err)) => {
            error!("credential store failure during login: {err:#}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/logout",
    responses(
        (status = 303, description = "Session invalidated; redirected home")
    ),
    tag = "auth"
)]
pub async fn logout(
    state: Extension<AppState>,
    session: Extension<SessionContext>,
) -> Response {
    state.sessions.logout(&session.session_id).await;

    // Always clear the cookie; the old identifier is already dead.
    let mut response = Redirect::to("/").into_response();
    match clear_session_cookie() {
        Ok(cookie) => {
            response.headers_mut().append(SET_COOKIE, cookie);
        }
        Err(err) => error!("failed to build clearing cookie: {err}"),
    }
    response
}
