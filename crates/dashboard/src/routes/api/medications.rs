//! Medication catalog API handlers.

use axum::{
    Json, Router,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    routing::get,
};
use tracing::instrument;

use pharmship_core::TextQuery;

use super::SearchQuery;
use crate::db::MedicationRepository;
use crate::error::AppError;
use crate::middleware::{RequireAuth, RequireCatalogManager};
use crate::models::{Medication, NewMedication};
use crate::state::AppState;

/// Build the medications API router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/medications", get(list).post(create))
}

/// List the catalog by name, optionally narrowed by `q`.
///
/// GET /api/medications?q=
#[instrument(skip(state, _user))]
async fn list(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<Medication>>, AppError> {
    let Query(query) = query?;
    let needle = TextQuery::from_param(query.q.as_deref());

    let medications = MedicationRepository::new(state.pool())
        .list_all()
        .await?
        .into_iter()
        .filter(|medication| medication.matches(&needle))
        .collect();

    Ok(Json(medications))
}

/// Add a medication to the catalog. Administrators and pharmacists only.
///
/// POST /api/medications
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
async fn create(
    RequireCatalogManager(user): RequireCatalogManager,
    State(state): State<AppState>,
    body: Result<Json<NewMedication>, JsonRejection>,
) -> Result<(StatusCode, Json<Medication>), AppError> {
    let Json(body) = body?;
    let record = body.validate()?;
    let medication = MedicationRepository::new(state.pool())
        .create(&record)
        .await?;

    tracing::info!(medication_id = %medication.id, "Medication added");
    Ok((StatusCode::CREATED, Json(medication)))
}
