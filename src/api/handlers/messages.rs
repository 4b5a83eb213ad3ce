//! Board handlers: list, post, search, and the admin-only clear.

use axum::{
    Extension, Form, Json,
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::api::{guard::SessionContext, state::AppState};
use crate::store::messages::MessageRow;

use super::{CsrfField, valid_message};

/// Payload the view renders into the board page; the CSRF field goes into the
/// post form.
#[derive(Serialize, Debug, ToSchema)]
pub struct BoardPage {
    pub user: String,
    pub messages: Vec<MessageRow>,
    pub csrf: CsrfField,
}

fn board_page(session: &SessionContext, messages: Vec<MessageRow>) -> BoardPage {
    BoardPage {
        user: session
            .principal
            .as_ref()
            .map_or_else(String::new, |p| p.username().to_string()),
        messages,
        csrf: CsrfField::new(session.csrf_token.clone()),
    }
}

#[utoipa::path(
    get,
    path = "/list",
    responses(
        (status = 200, description = "All board messages", body = BoardPage),
        (status = 303, description = "Not authenticated; redirected to login")
    ),
    tag = "board"
)]
pub async fn list(
    state: Extension<AppState>,
    session: Extension<SessionContext>,
) -> Response {
    match state.messages.all().await {
        Ok(messages) => Json(board_page(&session, messages)).into_response(),
        Err(err) => {
            error!("failed to load messages: {err:#}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct MessageForm {
    message: String,
}

#[utoipa::path(
    post,
    path = "/list",
    request_body(content = MessageForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Posted; redirected back to the board")
    ),
    tag = "board"
)]
pub async fn post_message(
    state: Extension<AppState>,
    session: Extension<SessionContext>,
    Form(form): Form<MessageForm>,
) -> Response {
    if !valid_message(&form.message) {
        return Redirect::to("/list?error=validation").into_response();
    }

    // The author is always the session principal, never a form field.
    let Some(principal) = session.principal.as_ref() else {
        return StatusCode::UNAUTHORIZED.into_response();
    };

    match state
        .messages
        .create(principal.username(), &form.message)
        .await
    {
        Ok(()) => Redirect::to("/list").into_response(),
        Err(err) => {
            error!("failed to create message: {err:#}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct SearchQuery {
    keyword: Option<String>,
}

#[utoipa::path(
    get,
    path = "/search",
    params(("keyword" = Option<String>, Query, description = "Substring to match in message text")),
    responses(
        (status = 200, description = "Matching messages", body = BoardPage)
    ),
    tag = "board"
)]
pub async fn search(
    state: Extension<AppState>,
    session: Extension<SessionContext>,
    Query(query): Query<SearchQuery>,
) -> Response {
    let keyword = query.keyword.unwrap_or_default();
    match state.messages.search(&keyword).await {
        Ok(messages) => Json(board_page(&session, messages)).into_response(),
        Err(err) => {
            error!("failed to search messages: {err:#}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/clear",
    responses(
        (status = 303, description = "Board cleared; redirected to the empty list")
    ),
    tag = "admin"
)]
pub async fn clear(state: Extension<AppState>) -> Response {
    match state.messages.delete_all().await {
        Ok(()) => Redirect::to("/list").into_response(),
        Err(err) => {
            error!("failed to clear messages: {err:#}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
