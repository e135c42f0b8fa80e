//! Router tests that never reach the database.
//!
//! The pool points at a closed port, so these cover everything in front of
//! the repositories: health checks, the authentication gate, request IDs and
//! the public pages.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use pharmship_integration_tests::{
    body_json, body_text, get, lazy_app, location, post_form, post_json, send,
};

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_is_ok() {
    let app = lazy_app();
    let response = send(&app, get("/health", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_fails_without_database() {
    let app = lazy_app();
    let response = send(&app, get("/health/ready", None)).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// =============================================================================
// Authentication Gate
// =============================================================================

#[tokio::test]
async fn test_dashboard_pages_redirect_to_login() {
    let app = lazy_app();

    for path in [
        "/dashboard",
        "/dashboard/shipments",
        "/dashboard/shipments/new",
        "/dashboard/shipments/1",
        "/dashboard/patients",
        "/dashboard/medications",
        "/dashboard/tracking",
    ] {
        let response = send(&app, get(path, None)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&response), Some("/login"), "{path}");
    }
}

#[tokio::test]
async fn test_api_requires_session() {
    let app = lazy_app();

    for path in [
        "/api/shipments",
        "/api/shipments/1",
        "/api/patients",
        "/api/medications",
        "/api/tracking",
        "/api/dashboard/stats",
    ] {
        let response = send(&app, get(path, None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{path}");
        assert_eq!(body_json(response).await, json!({ "error": "Unauthorized" }));
    }
}

#[tokio::test]
async fn test_estimate_requires_session() {
    let app = lazy_app();
    let request = post_json(
        "/api/shipments/estimate",
        &json!({ "shippingMethod": "express", "priority": "urgent" }),
        None,
    );

    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_status_form_requires_session() {
    let app = lazy_app();
    let request = post_form("/dashboard/shipments/1/status", "status=shipped", None);

    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login"));
}

// =============================================================================
// Public Pages
// =============================================================================

#[tokio::test]
async fn test_login_page_renders() {
    let app = lazy_app();
    let response = send(&app, get("/login", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains(r#"action="/login""#));
    assert!(!body.contains("Invalid email or password."));
}

#[tokio::test]
async fn test_login_page_shows_error_code() {
    let app = lazy_app();
    let response = send(&app, get("/login?error=credentials", None)).await;

    let body = body_text(response).await;
    assert!(body.contains("Invalid email or password."));
}

#[tokio::test]
async fn test_home_page_offers_sign_in() {
    let app = lazy_app();
    let response = send(&app, get("/", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains(r#"href="/login""#));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = lazy_app();
    let response = send(&app, get("/no-such-page", None)).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Request IDs
// =============================================================================

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = lazy_app();
    let request = axum::http::Request::get("/health")
        .header("x-request-id", "upstream-1234")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = send(&app, request).await;
    assert_eq!(response.headers()["x-request-id"], "upstream-1234");
}

#[tokio::test]
async fn test_request_id_is_generated() {
    let app = lazy_app();
    let response = send(&app, get("/health", None)).await;

    let id = response.headers()["x-request-id"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok());
}
