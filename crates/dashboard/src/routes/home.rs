//! Public landing page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Router, routing::get};

use crate::filters;
use crate::middleware::OptionalAuth;
use crate::routes::views::Layout;
use crate::state::AppState;

/// Build the home router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(index))
}

/// Landing page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
}

/// GET /
async fn index(OptionalAuth(user): OptionalAuth) -> HomeTemplate {
    HomeTemplate {
        layout: Layout::new(user.as_ref(), "/"),
    }
}
