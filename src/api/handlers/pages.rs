//! Public page payloads: home and the login form.

use axum::{Json, extract::Query, response::IntoResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct Home {
    app_name: String,
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Landing page payload", body = Home)
    ),
    tag = "board"
)]
pub async fn home() -> impl IntoResponse {
    Json(Home {
        app_name: "Tabulo".to_string(),
    })
}

#[derive(Deserialize, Debug)]
pub struct LoginPageQuery {
    error: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct LoginPage {
    /// Error indicator echoed from the query string (`login_failed`,
    /// `forbidden`); the view renders the matching banner.
    error: Option<String>,
}

#[utoipa::path(
    get,
    path = "/login",
    responses(
        (status = 200, description = "Login form payload", body = LoginPage)
    ),
    tag = "auth"
)]
pub async fn login_page(Query(query): Query<LoginPageQuery>) -> impl IntoResponse {
    Json(LoginPage { error: query.error })
}
