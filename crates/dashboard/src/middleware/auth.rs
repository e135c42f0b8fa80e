//! Authentication extractors.
//!
//! Pages under `/dashboard` redirect to `/login` when there is no session;
//! `/api/` routes answer 401 with a JSON error body instead.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use tower_sessions::Session;

use crate::models::{CurrentUser, session_keys};

/// Where unauthenticated page requests are sent.
pub const LOGIN_PATH: &str = "/login";

/// Extractor that requires a logged-in staff user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Rejection for the authentication extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// Redirect to the login page (for page requests).
    RedirectToLogin,
    /// 401 JSON response (for API requests).
    Unauthorized,
    /// Logged in without the required role.
    Forbidden { api: bool },
    /// The session store could not be read.
    SessionUnavailable,
}

impl AuthRejection {
    fn missing_session(parts: &Parts) -> Self {
        if is_api(parts) {
            Self::Unauthorized
        } else {
            Self::RedirectToLogin
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Unauthorized" })),
            )
                .into_response(),
            Self::Forbidden { api: true } => {
                (StatusCode::FORBIDDEN, Json(json!({ "error": "Forbidden" }))).into_response()
            }
            Self::Forbidden { api: false } => (
                StatusCode::FORBIDDEN,
                "Only pharmacists and administrators can manage the catalog",
            )
                .into_response(),
            Self::SessionUnavailable => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response(),
        }
    }
}

fn is_api(parts: &Parts) -> bool {
    parts.uri.path().starts_with("/api/")
}

/// The user stored in the request's session, if any.
///
/// A store failure is logged and reported as `SessionUnavailable` rather
/// than being mistaken for a missing login.
async fn current_user(parts: &Parts) -> Result<Option<CurrentUser>, AuthRejection> {
    let Some(session) = parts.extensions.get::<Session>() else {
        return Ok(None);
    };

    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .map_err(|e| {
            let event_id = sentry::capture_error(&e);
            tracing::error!(error = %e, sentry_event_id = %event_id, "Failed to load session");
            AuthRejection::SessionUnavailable
        })
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_user(parts)
            .await?
            .map(Self)
            .ok_or_else(|| AuthRejection::missing_session(parts))
    }
}

/// Extractor that optionally gets the current user.
///
/// Never rejects; public pages use it to adapt their navigation. A session
/// store failure has already been logged and reads as logged out.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_user(parts).await.ok().flatten()))
    }
}

/// Extractor that requires a user allowed to edit the medication catalog
/// (administrators and pharmacists).
pub struct RequireCatalogManager(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireCatalogManager
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user(parts)
            .await?
            .ok_or_else(|| AuthRejection::missing_session(parts))?;

        if !user.role.can_manage_catalog() {
            tracing::warn!(user_id = %user.id, role = %user.role, "Catalog change refused");
            return Err(AuthRejection::Forbidden { api: is_api(parts) });
        }

        Ok(Self(user))
    }
}

/// Store the logged-in user in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Remove the logged-in user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;
    use axum::http::header::LOCATION;

    use super::*;

    #[tokio::test]
    async fn test_unauthorized_is_json() {
        let response = AuthRejection::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, json!({ "error": "Unauthorized" }));
    }

    #[test]
    fn test_redirect_goes_to_login() {
        let response = AuthRejection::RedirectToLogin.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/login");
    }

    #[tokio::test]
    async fn test_session_store_failure_is_server_error() {
        let response = AuthRejection::SessionUnavailable.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, json!({ "error": "Internal server error" }));
    }

    #[tokio::test]
    async fn test_no_session_layer_reads_as_logged_out() {
        let (mut parts, ()) = axum::http::Request::get("/api/shipments")
            .body(())
            .unwrap()
            .into_parts();

        assert_eq!(current_user(&parts).await, Ok(None));
        assert!(matches!(
            RequireAuth::from_request_parts(&mut parts, &()).await,
            Err(AuthRejection::Unauthorized)
        ));
    }

    #[test]
    fn test_forbidden_status() {
        assert_eq!(
            AuthRejection::Forbidden { api: true }.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthRejection::Forbidden { api: false }.into_response().status(),
            StatusCode::FORBIDDEN
        );
    }
}
