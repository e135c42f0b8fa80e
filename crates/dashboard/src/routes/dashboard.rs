//! Dashboard overview page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Router, extract::State, routing::get};
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::routes::views::Layout;
use crate::services::{DashboardService, DashboardStats, RecentShipment};
use crate::state::AppState;

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new().route("/dashboard", get(index))
}

/// Headline metrics as display strings.
#[derive(Debug, Clone)]
pub struct MetricsView {
    pub total_shipments: String,
    pub active_shipments: String,
    pub total_patients: String,
    pub delivery_rate: String,
    pub avg_delivery_time: String,
    pub temperature_alerts: String,
    pub cold_chain_active: String,
}

impl From<&DashboardStats> for MetricsView {
    fn from(stats: &DashboardStats) -> Self {
        Self {
            total_shipments: stats.total_shipments.to_string(),
            active_shipments: stats.active_shipments.to_string(),
            total_patients: stats.total_patients.to_string(),
            delivery_rate: stats
                .delivery_rate
                .map_or_else(|| "n/a".to_string(), |rate| format!("{rate}%")),
            avg_delivery_time: stats.avg_delivery_time.clone(),
            temperature_alerts: stats.temperature_alerts.to_string(),
            cold_chain_active: stats.cold_chain_active.to_string(),
        }
    }
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard/index.html")]
pub struct DashboardTemplate {
    pub layout: Layout,
    pub metrics: MetricsView,
    pub recent_shipments: Vec<RecentShipment>,
}

/// GET /dashboard
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn index(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<DashboardTemplate, AppError> {
    let stats = DashboardService::new(state.pool()).stats().await?;

    Ok(DashboardTemplate {
        layout: Layout::new(Some(&user), "/dashboard"),
        metrics: MetricsView::from(&stats),
        recent_shipments: stats.recent_shipments,
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn stats() -> DashboardStats {
        DashboardStats {
            total_shipments: 12,
            active_shipments: 7,
            total_patients: 9,
            delivery_rate: Some(dec!(80.0)),
            avg_delivery_time: "18.4 hrs".to_string(),
            temperature_alerts: 1,
            cold_chain_active: 3,
            recent_shipments: Vec::new(),
        }
    }

    #[test]
    fn test_metrics_view() {
        let view = MetricsView::from(&stats());
        assert_eq!(view.delivery_rate, "80.0%");
        assert_eq!(view.avg_delivery_time, "18.4 hrs");

        let empty = DashboardStats {
            delivery_rate: None,
            ..stats()
        };
        assert_eq!(MetricsView::from(&empty).delivery_rate, "n/a");
    }

    #[test]
    fn test_empty_dashboard_renders() {
        let page = DashboardTemplate {
            layout: Layout::new(None, "/dashboard"),
            metrics: MetricsView::from(&stats()),
            recent_shipments: Vec::new(),
        };
        let html = page.render().unwrap_or_default();
        assert!(html.contains("No shipments yet"));
        assert!(html.contains("18.4 hrs"));
    }
}
