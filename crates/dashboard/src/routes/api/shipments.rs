//! Shipment API handlers.

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use pharmship_core::{CostEstimate, MedicationId, ShipmentId, ShipmentTaskId, ShippingOptions};

use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::{
    DraftSource, NewTask, ShipmentDetails, ShipmentDraft, ShipmentFilter, ShipmentTask,
    StatusChange,
};
use crate::services::ShipmentService;
use crate::state::AppState;

/// Build the shipments API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/shipments", get(list).post(create))
        .route("/api/shipments/estimate", post(estimate))
        .route("/api/shipments/{id}", get(show))
        .route("/api/shipments/{id}/status", post(change_status))
        .route("/api/shipments/{id}/tasks", post(add_task))
        .route(
            "/api/shipments/{id}/tasks/{task_id}/complete",
            post(complete_task),
        )
}

fn service(state: &AppState) -> ShipmentService<'_> {
    ShipmentService::new(state.pool(), &state.config().pharmacy)
}

/// List shipments, newest first.
///
/// GET /api/shipments?q=&status=&priority=
#[instrument(skip(state, _user))]
async fn list(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    filter: Result<Query<ShipmentFilter>, QueryRejection>,
) -> Result<Json<Vec<ShipmentDetails>>, AppError> {
    let Query(filter) = filter?;
    let shipments = service(&state).list(&filter).await?;
    Ok(Json(shipments))
}

/// Create a shipment.
///
/// POST /api/shipments
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
async fn create(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    body: Result<Json<ShipmentDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<ShipmentDetails>), AppError> {
    let Json(draft) = body?;
    let shipment = service(&state)
        .create(&draft, user.id, DraftSource::Api)
        .await?;
    Ok((StatusCode::CREATED, Json(shipment)))
}

/// Get one shipment.
///
/// GET /api/shipments/{id}
#[instrument(skip(state, _user))]
async fn show(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    id: Result<Path<ShipmentId>, PathRejection>,
) -> Result<Json<ShipmentDetails>, AppError> {
    let Path(id) = id?;
    Ok(Json(service(&state).get(id).await?))
}

/// Move a shipment to a new status.
///
/// POST /api/shipments/{id}/status
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
async fn change_status(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    id: Result<Path<ShipmentId>, PathRejection>,
    body: Result<Json<StatusChange>, JsonRejection>,
) -> Result<Json<ShipmentDetails>, AppError> {
    let Path(id) = id?;
    let Json(change) = body?;
    Ok(Json(service(&state).change_status(id, &change).await?))
}

/// Add a checklist task.
///
/// POST /api/shipments/{id}/tasks
#[instrument(skip(state, _user, body))]
async fn add_task(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    id: Result<Path<ShipmentId>, PathRejection>,
    body: Result<Json<NewTask>, JsonRejection>,
) -> Result<(StatusCode, Json<ShipmentTask>), AppError> {
    let Path(id) = id?;
    let Json(task) = body?;
    let task = service(&state).add_task(id, &task).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// Mark a task complete.
///
/// POST /api/shipments/{id}/tasks/{task_id}/complete
#[instrument(skip(state, _user))]
async fn complete_task(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    ids: Result<Path<(ShipmentId, ShipmentTaskId)>, PathRejection>,
) -> Result<Json<ShipmentTask>, AppError> {
    let Path((id, task_id)) = ids?;
    Ok(Json(service(&state).complete_task(id, task_id).await?))
}

/// Request for a cost estimate.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    #[serde(flatten)]
    pub options: ShippingOptions,
    /// Medications to ship; cold-chain stock switches on monitoring.
    #[serde(default)]
    pub medication_ids: Vec<MedicationId>,
}

/// Cost estimate with the options it was computed for.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateResponse {
    pub options: ShippingOptions,
    #[serde(flatten)]
    pub estimate: CostEstimate,
}

/// Price a shipment without creating it.
///
/// POST /api/shipments/estimate
#[instrument(skip(state, _user, body))]
async fn estimate(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    body: Result<Json<EstimateRequest>, JsonRejection>,
) -> Result<Json<EstimateResponse>, AppError> {
    let Json(request) = body?;
    let (options, estimate) = service(&state)
        .quote(request.options, &request.medication_ids)
        .await?;
    Ok(Json(EstimateResponse { options, estimate }))
}
