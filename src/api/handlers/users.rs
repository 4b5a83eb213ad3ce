//! Administrative user management; the only path that generates new hashes.

use anyhow::{Context, Result};
use axum::{
    Extension, Form, Json,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::api::{guard::SessionContext, state::AppState};
use crate::auth::{hash, principal::Role};
use crate::store::users::{CreateOutcome, UserRow};

use super::{
    CsrfField, valid_password_length, valid_password_pattern, valid_username,
};

/// Payload the view renders into the admin page; the CSRF field goes into
/// every maintenance form.
#[derive(Serialize, Debug, ToSchema)]
pub struct UsersPage {
    pub users: Vec<UserRow>,
    /// The declared role names, for the role selector.
    pub roles: Vec<&'static str>,
    pub csrf: CsrfField,
}

#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "All user accounts", body = UsersPage),
        (status = 303, description = "Insufficient role; see the deny-recovery redirect")
    ),
    tag = "admin"
)]
pub async fn list_users(
    state: Extension<AppState>,
    session: Extension<SessionContext>,
) -> Response {
    match state.users.list().await {
        Ok(users) => Json(UsersPage {
            users,
            roles: crate::auth::all_roles().into_iter().collect(),
            csrf: CsrfField::new(session.csrf_token.clone()),
        })
        .into_response(),
        Err(err) => {
            error!("failed to list users: {err:#}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct UserForm {
    name: String,
    role: String,
    #[schema(format = Password)]
    password: String,
}

#[utoipa::path(
    post,
    path = "/users",
    request_body(content = UserForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirected back to the user list with a result indicator")
    ),
    tag = "admin"
)]
pub async fn create_user(
    state: Extension<AppState>,
    Form(form): Form<UserForm>,
) -> Response {
    if !valid_username(&form.name) {
        return Redirect::to("/users?error=validation").into_response();
    }
    let Some(role) = Role::parse(&form.role) else {
        return Redirect::to("/users?error=validation").into_response();
    };
    // Creation always validates the password; only updates may leave it empty.
    if !valid_password_pattern(&form.password) {
        return Redirect::to("/users?error=password_pattern").into_response();
    }
    if !valid_password_length(&form.password) {
        return Redirect::to("/users?error=password_size").into_response();
    }

    let hashed = match generate_hash(&state, form.password).await {
        Ok(hashed) => hashed,
        Err(err) => {
            error!("failed to hash password: {err:#}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match state.users.create(&form.name, role, &hashed).await {
        Ok(CreateOutcome::Created) => {
            Redirect::to("/users?message=succeed_create").into_response()
        }
        Ok(CreateOutcome::Conflict) => {
            Redirect::to("/users?error=duplicate_user").into_response()
        }
        Err(err) => {
            error!("failed to create user: {err:#}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/user_update",
    request_body(content = UserForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirected back to the user list with a result indicator")
    ),
    tag = "admin"
)]
pub async fn update_user(
    state: Extension<AppState>,
    Form(form): Form<UserForm>,
) -> Response {
    if !valid_username(&form.name) {
        return Redirect::to("/users?error=validation").into_response();
    }
    let Some(role) = Role::parse(&form.role) else {
        return Redirect::to("/users?error=validation").into_response();
    };

    // An empty password keeps the stored hash; a non-empty one must pass the
    // pattern and length checks before any hashing or store mutation happens.
    let hashed = if form.password.is_empty() {
        None
    } else {
        if !valid_password_pattern(&form.password) {
            return Redirect::to("/users?error=password_pattern").into_response();
        }
        if !valid_password_length(&form.password) {
            return Redirect::to("/users?error=password_size").into_response();
        }
        match generate_hash(&state, form.password).await {
            Ok(hashed) => Some(hashed),
            Err(err) => {
                error!("failed to hash password: {err:#}");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        }
    };

    match state.users.update(&form.name, role, hashed.as_deref()).await {
        Ok(()) => Redirect::to("/users?message=succeed_update").into_response(),
        Err(err) => {
            error!("failed to update user: {err:#}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct DeleteForm {
    name: String,
}

#[utoipa::path(
    post,
    path = "/user_delete",
    request_body(content = DeleteForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirected back to the user list")
    ),
    tag = "admin"
)]
pub async fn delete_user(
    state: Extension<AppState>,
    Form(form): Form<DeleteForm>,
) -> Response {
    match state.users.delete(&form.name).await {
        Ok(()) => Redirect::to("/users?message=succeed_delete").into_response(),
        Err(err) => {
            error!("failed to delete user: {err:#}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Generate a hash with the current process-wide parameters, off the async
/// worker threads.
async fn generate_hash(state: &AppState, password: String) -> Result<String> {
    let params = state.hash_params;
    tokio::task::spawn_blocking(move || hash::hash_password(&password, &params))
        .await
        .context("hash task failed")?
}
