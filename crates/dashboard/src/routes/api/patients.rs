//! Patient API handlers.

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
use crate::db::PatientRepository;
use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::{NewPatient, Patient};
use crate::state::AppState;

/// Build the patients API router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/patients", get(list).post(create))
}

/// List patients by name, optionally narrowed by `q`.
///
/// GET /api/patients?q=
#[instrument(skip(state, _user))]
async fn list(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<Patient>>, AppError> {
    let Query(query) = query?;
    let needle = TextQuery::from_param(query.q.as_deref());

    let patients = PatientRepository::new(state.pool())
        .list_all()
        .await?
        .into_iter()
        .filter(|patient| patient.matches(&needle))
        .collect();

    Ok(Json(patients))
}

/// Register a patient.
///
/// POST /api/patients
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
async fn create(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    body: Result<Json<NewPatient>, JsonRejection>,
) -> Result<(StatusCode, Json<Patient>), AppError> {
    let Json(body) = body?;
    let record = body.validate()?;
    let patient = PatientRepository::new(state.pool()).create(&record).await?;

    tracing::info!(patient_id = %patient.id, "Patient registered");
    Ok((StatusCode::CREATED, Json(patient)))
}
