//! Dashboard statistics API handler.

use axum::{Json, Router, extract::State, routing::get};
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::services::{DashboardService, DashboardStats};
use crate::state::AppState;

/// Build the dashboard API router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/dashboard/stats", get(stats))
}

/// Headline numbers and recent shipments.
///
/// GET /api/dashboard/stats
#[instrument(skip(state, _user))]
async fn stats(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<DashboardStats>, AppError> {
    let stats = DashboardService::new(state.pool()).stats().await?;
    Ok(Json(stats))
}
