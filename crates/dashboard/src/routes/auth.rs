//! Authentication route handlers.
//!
//! Email and password login for pharmacy staff. The session only ever holds
//! a [`CurrentUser`]; the password hash never leaves the database layer.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::routes::views::Layout;
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/logout", post(logout))
}

// =============================================================================
// Form & Query Types
// =============================================================================

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Query parameters for error/success display.
#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

impl MessageQuery {
    fn error_message(&self) -> Option<&'static str> {
        self.error.as_deref().map(|code| match code {
            "credentials" => "Invalid email or password.",
            "session" => "Could not start your session. Please try again.",
            _ => "Sign in failed. Please try again.",
        })
    }

    fn success_message(&self) -> Option<&'static str> {
        self.success.as_deref().map(|code| match code {
            "logged_out" => "You have been signed out.",
            _ => "Done.",
        })
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub error: Option<&'static str>,
    pub success: Option<&'static str>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the login page. Signed-in users go straight to the dashboard.
///
/// GET /login
async fn login_page(
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> Response {
    if user.is_some() {
        return Redirect::to("/dashboard").into_response();
    }

    LoginTemplate {
        layout: Layout::new(None, "/login"),
        error: query.error_message(),
        success: query.success_message(),
    }
    .into_response()
}

/// Handle the login form.
///
/// POST /login
#[instrument(skip(state, session, form))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let user = match AuthService::new(state.pool())
        .login_with_password(&form.email, &form.password)
        .await
    {
        Ok(user) => user,
        Err(AuthError::InvalidCredentials) => {
            tracing::warn!("Login rejected");
            return Redirect::to("/login?error=credentials").into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "Login failed");
            return Redirect::to("/login?error=session").into_response();
        }
    };

    let current = CurrentUser::from(&user);

    // New session ID on privilege change
    if let Err(e) = session.cycle_id().await {
        tracing::error!("Failed to cycle session id: {}", e);
        return Redirect::to("/login?error=session").into_response();
    }
    if let Err(e) = set_current_user(&session, &current).await {
        tracing::error!("Failed to set session: {}", e);
        return Redirect::to("/login?error=session").into_response();
    }

    set_sentry_user(current.id.as_i32(), Some(current.email.as_str()));
    tracing::info!(user_id = %current.id, role = %current.role, "User logged in");

    Redirect::to("/dashboard").into_response()
}

/// Logout and clear session.
///
/// POST /logout
async fn logout(session: Session) -> impl IntoResponse {
    let _ = clear_current_user(&session).await;
    clear_sentry_user();

    Redirect::to("/login?success=logged_out")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_codes() {
        let query = MessageQuery {
            error: Some("credentials".to_string()),
            success: None,
        };
        assert_eq!(query.error_message(), Some("Invalid email or password."));
        assert_eq!(query.success_message(), None);

        let query = MessageQuery {
            error: None,
            success: Some("logged_out".to_string()),
        };
        assert_eq!(query.success_message(), Some("You have been signed out."));
    }

    #[test]
    fn test_login_page_renders_error() {
        let page = LoginTemplate {
            layout: Layout::new(None, "/login"),
            error: Some("Invalid email or password."),
            success: None,
        };
        let html = page.render().unwrap_or_default();
        assert!(html.contains("Invalid email or password."));
        assert!(html.contains(r#"action="/login""#));
    }
}
