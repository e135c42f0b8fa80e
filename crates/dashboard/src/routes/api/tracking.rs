//! Tracking map API handler.

use axum::{Json, Router, extract::State, routing::get};
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::services::{DashboardService, TrackingMap};
use crate::state::AppState;

/// Build the tracking API router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/tracking", get(map))
}

/// Origin-to-destination routes for every geocoded shipment.
///
/// GET /api/tracking
#[instrument(skip(state, _user))]
async fn map(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<TrackingMap>, AppError> {
    let map = DashboardService::new(state.pool()).tracking_map().await?;
    Ok(Json(map))
}
