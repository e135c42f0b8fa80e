//! Patient directory page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use tracing::instrument;

use pharmship_core::TextQuery;

use crate::db::PatientRepository;
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::routes::api::SearchQuery;
use crate::routes::views::{Layout, PatientView};
use crate::state::AppState;

/// Build the patients page router.
pub fn router() -> Router<AppState> {
    Router::new().route("/dashboard/patients", get(index))
}

/// Patient list template.
#[derive(Template, WebTemplate)]
#[template(path = "patients/index.html")]
pub struct PatientsTemplate {
    pub layout: Layout,
    pub q: String,
    pub patients: Vec<PatientView>,
}

/// GET /dashboard/patients?q=
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn index(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<PatientsTemplate, AppError> {
    let needle = TextQuery::from_param(query.q.as_deref());
    let patients = PatientRepository::new(state.pool()).list_all().await?;

    Ok(PatientsTemplate {
        layout: Layout::new(Some(&user), "/dashboard/patients"),
        q: query.q.unwrap_or_default(),
        patients: patients
            .iter()
            .filter(|patient| patient.matches(&needle))
            .map(PatientView::from)
            .collect(),
    })
}
