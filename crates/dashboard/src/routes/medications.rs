//! Medication catalog page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use tracing::instrument;

use pharmship_core::TextQuery;

use crate::db::MedicationRepository;
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::routes::api::SearchQuery;
use crate::routes::views::{Layout, MedicationView};
use crate::state::AppState;

/// Build the medications page router.
pub fn router() -> Router<AppState> {
    Router::new().route("/dashboard/medications", get(index))
}

/// Medication list template.
#[derive(Template, WebTemplate)]
#[template(path = "medications/index.html")]
pub struct MedicationsTemplate {
    pub layout: Layout,
    pub q: String,
    pub medications: Vec<MedicationView>,
    pub cold_chain_count: usize,
}

/// GET /dashboard/medications?q=
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn index(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<MedicationsTemplate, AppError> {
    let needle = TextQuery::from_param(query.q.as_deref());
    let medications: Vec<MedicationView> = MedicationRepository::new(state.pool())
        .list_all()
        .await?
        .iter()
        .filter(|medication| medication.matches(&needle))
        .map(MedicationView::from)
        .collect();

    Ok(MedicationsTemplate {
        layout: Layout::new(Some(&user), "/dashboard/medications"),
        q: query.q.unwrap_or_default(),
        cold_chain_count: medications.iter().filter(|m| m.cold_chain).count(),
        medications,
    })
}
