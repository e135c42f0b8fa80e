//! Integration tests for Pharmship.
//!
//! # Running Tests
//!
//! ```bash
//! # Router tests (no database needed)
//! cargo test -p pharmship-integration-tests
//!
//! # Database tests
//! PHARMSHIP_TEST_DATABASE_URL=postgres://localhost/pharmship_test \
//!     cargo test -p pharmship-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `router` - Auth gate, health checks and request IDs over a pool that
//!   never connects
//! - `database` - Login and shipment flows against a migrated database
//!
//! Requests are driven through the real router with
//! `tower::ServiceExt::oneshot`; no server is started.

#![allow(clippy::missing_panics_doc)]

use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response, header};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use pharmship_dashboard::app;
use pharmship_dashboard::config::DashboardConfig;
use pharmship_dashboard::state::AppState;

/// Environment variable naming the database used by ignored tests.
pub const TEST_DATABASE_URL_VAR: &str = "PHARMSHIP_TEST_DATABASE_URL";

/// A database address nothing listens on.
const UNREACHABLE_DATABASE_URL: &str = "postgres://pharmship@127.0.0.1:1/pharmship_test";

/// Dashboard configuration for tests, served over plain HTTP.
#[must_use]
pub fn test_config(database_url: &str) -> DashboardConfig {
    let database_url = database_url.to_owned();
    DashboardConfig::from_lookup(|key| match key {
        "PHARMSHIP_DATABASE_URL" => Some(database_url.clone()),
        "PHARMSHIP_BASE_URL" => Some("http://localhost:3000".to_owned()),
        _ => None,
    })
    .expect("test configuration is valid")
}

/// Router over a lazily-connected pool pointing at a closed port.
///
/// Requests that reach the database fail quickly; everything in front of
/// the database (auth gate, health, request IDs) behaves normally.
#[must_use]
pub fn lazy_app() -> Router {
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(1))
        .connect_lazy(UNREACHABLE_DATABASE_URL)
        .expect("database URL parses");

    app::build(AppState::new(test_config(UNREACHABLE_DATABASE_URL), pool))
}

/// Router and pool for the database named by `PHARMSHIP_TEST_DATABASE_URL`,
/// with migrations applied.
pub async fn database_app() -> (Router, PgPool) {
    let database_url = std::env::var(TEST_DATABASE_URL_VAR)
        .unwrap_or_else(|_| panic!("{TEST_DATABASE_URL_VAR} must be set for database tests"));

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("../dashboard/migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let app = app::build(AppState::new(test_config(&database_url), pool.clone()));
    (app, pool)
}

/// Send one request through the router.
pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone()
        .oneshot(request)
        .await
        .expect("router is infallible")
}

/// A `GET` request, optionally carrying a session cookie.
#[must_use]
pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    with_cookie(Request::get(uri), cookie)
        .body(Body::empty())
        .expect("valid request")
}

/// A `POST` with a JSON body.
#[must_use]
pub fn post_json(uri: &str, body: &serde_json::Value, cookie: Option<&str>) -> Request<Body> {
    with_cookie(Request::post(uri), cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

/// A `POST` with an already-encoded form body.
#[must_use]
pub fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    with_cookie(Request::post(uri), cookie)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_owned()))
        .expect("valid request")
}

fn with_cookie(
    builder: axum::http::request::Builder,
    cookie: Option<&str>,
) -> axum::http::request::Builder {
    match cookie {
        Some(cookie) => builder.header(header::COOKIE, cookie),
        None => builder,
    }
}

/// Read the whole response body as text.
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    String::from_utf8(bytes.to_vec()).expect("response body is UTF-8")
}

/// Read the whole response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    serde_json::from_slice(&bytes).expect("response body is JSON")
}

/// The `name=value` part of the session cookie set by a response.
#[must_use]
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with(pharmship_dashboard::middleware::SESSION_COOKIE_NAME))
        .and_then(|value| value.split(';').next())
        .map(str::to_owned)
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
}
