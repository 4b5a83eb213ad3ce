//! HTTP server wiring: router construction, cross-cutting layers, and startup.

use anyhow::{Context, Result};
use axum::{
    Extension, Router,
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    middleware,
    routing::{get, post},
};
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{Span, info, info_span};
use ulid::Ulid;

use crate::auth::{audit::TracingAuditLogger, hash::HashParameters};
use crate::store::{messages::PgMessageStore, users::PgUserStore};

pub(crate) mod guard;
pub(crate) mod handlers;
mod openapi;
mod state;

pub use guard::SessionContext;
pub use openapi::openapi;
pub use state::AppState;

/// Build the application router over the given state.
///
/// Route groups carry their role requirement through the guard layer wrapped
/// around them; `/health` stays outside the guards.
#[must_use]
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/", get(handlers::pages::home))
        .route(
            "/login",
            get(handlers::pages::login_page).post(handlers::login::login),
        )
        .route_layer(middleware::from_fn(guard::public_routes));

    let authenticated = Router::new()
        .route("/logout", get(handlers::login::logout))
        .route(
            "/list",
            get(handlers::messages::list).post(handlers::messages::post_message),
        )
        .route("/search", get(handlers::messages::search))
        .route_layer(middleware::from_fn(guard::user_routes));

    let admin = Router::new()
        .route("/clear", post(handlers::messages::clear))
        .route(
            "/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route("/user_delete", post(handlers::users::delete_user))
        .route("/user_update", post(handlers::users::update_user))
        .route_layer(middleware::from_fn(guard::admin_routes));

    Router::new()
        .merge(public)
        .merge(authenticated)
        .merge(admin)
        .route("/health", get(handlers::health::health))
        .layer(Extension(state))
}

/// Start the server
///
/// # Errors
/// Return error if failed to start the server
pub async fn serve(
    port: u16,
    dsn: String,
    hash_params: HashParameters,
    session_ttl: Duration,
) -> Result<()> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    let users = Arc::new(PgUserStore::new(pool.clone()));
    let messages = Arc::new(PgMessageStore::new(pool.clone()));
    let state = AppState::new(
        users,
        messages,
        Arc::new(TracingAuditLogger),
        hash_params,
        session_ttl,
    )?;

    let app = router(state).layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static("x-request-id"),
                |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                "x-request-id",
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(Extension(pool.clone())),
    );

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Gracefully shutdown");
    })
    .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
