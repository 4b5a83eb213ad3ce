//! OpenAPI document assembled from the annotated handlers.

use utoipa::OpenApi;

use super::handlers::{self, health, login, messages, pages, users};
use crate::auth::principal::Role;
use crate::store::{messages::MessageRow, users::UserRow};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        pages::home,
        pages::login_page,
        login::login,
        login::logout,
        messages::list,
        messages::post_message,
        messages::search,
        messages::clear,
        users::list_users,
        users::create_user,
        users::update_user,
        users::delete_user,
    ),
    components(schemas(
        health::Health,
        pages::Home,
        pages::LoginPage,
        login::LoginForm,
        messages::BoardPage,
        messages::MessageForm,
        users::UsersPage,
        users::UserForm,
        users::DeleteForm,
        handlers::CsrfField,
        MessageRow,
        UserRow,
        Role,
    )),
    tags(
        (name = "board", description = "Message board"),
        (name = "auth", description = "Login, logout, and session state"),
        (name = "admin", description = "User administration"),
        (name = "health", description = "Service health"),
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = openapi();
        for path in [
            "/", "/login", "/logout", "/list", "/search", "/clear", "/users", "/user_delete",
            "/user_update", "/health",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing path: {path}");
        }
    }
}
