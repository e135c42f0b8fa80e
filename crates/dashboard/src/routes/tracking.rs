//! Live tracking page.
//!
//! Renders the route table server-side and embeds the same payload as
//! `GET /api/tracking` for map scripts.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Router, extract::State, routing::get};
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::routes::views::Layout;
use crate::services::{DashboardService, TrackingMap};
use crate::state::AppState;

/// Build the tracking page router.
pub fn router() -> Router<AppState> {
    Router::new().route("/dashboard/tracking", get(index))
}

/// A route as a table row.
#[derive(Debug, Clone)]
pub struct RouteView {
    pub id: i32,
    pub number: String,
    pub patient: String,
    pub status: String,
    pub status_label: &'static str,
    pub priority_label: &'static str,
    pub cold_chain: bool,
    pub origin: String,
    pub destination: String,
    pub progress: u8,
}

/// Tracking page template.
#[derive(Template, WebTemplate)]
#[template(path = "tracking/index.html")]
pub struct TrackingTemplate {
    pub layout: Layout,
    pub routes: Vec<RouteView>,
    /// `TrackingMap` as JSON.
    pub map_json: String,
}

impl TrackingTemplate {
    fn new(layout: Layout, map: &TrackingMap) -> Result<Self, AppError> {
        let map_json = serde_json::to_string(map)
            .map_err(|e| AppError::Internal(format!("tracking map encoding: {e}")))?;

        let routes = map
            .routes
            .iter()
            .map(|route| RouteView {
                id: route.id.as_i32(),
                number: route.shipment_number.clone(),
                patient: route.patient_name.clone(),
                status: route.status.to_string(),
                status_label: route.status.label(),
                priority_label: route.priority.label(),
                cold_chain: route.temperature_monitoring,
                origin: format!("{:.4}, {:.4}", route.origin.lat, route.origin.lng),
                destination: format!(
                    "{:.4}, {:.4}",
                    route.destination.lat, route.destination.lng
                ),
                progress: route.progress,
            })
            .collect();

        Ok(Self {
            layout,
            routes,
            map_json,
        })
    }
}

/// GET /dashboard/tracking
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn index(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<TrackingTemplate, AppError> {
    let map = DashboardService::new(state.pool()).tracking_map().await?;
    TrackingTemplate::new(Layout::new(Some(&user), "/dashboard/tracking"), &map)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_map_renders() {
        let page = TrackingTemplate::new(
            Layout::new(None, "/dashboard/tracking"),
            &TrackingMap::from_shipments(&[]),
        )
        .unwrap();

        assert!(page.routes.is_empty());
        assert!(page.map_json.contains(r#""zoom":4"#));

        let html = page.render().unwrap();
        assert!(html.contains("No geocoded shipments"));
    }
}
