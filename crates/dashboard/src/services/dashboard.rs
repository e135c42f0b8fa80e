//! Dashboard statistics and tracking map.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use tracing::instrument;

use pharmship_core::{Coordinates, Priority, ShipmentId, ShipmentStatus, stats};

use super::ServiceError;
use crate::db::{PatientRepository, ShipmentCounts, ShipmentRepository};
use crate::models::ShipmentDetails;

/// Number of shipments shown in the recent-activity list.
pub const RECENT_SHIPMENTS: i64 = 5;

/// Map center used when drawing routes, the geographic center of the contiguous US.
pub const MAP_CENTER: Coordinates = Coordinates {
    lat: 39.8283,
    lng: -98.5795,
};

/// Initial map zoom level.
pub const MAP_ZOOM: u8 = 4;

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_shipments: i64,
    pub active_shipments: i64,
    pub total_patients: i64,
    /// Percent of completed shipments that were delivered.
    pub delivery_rate: Option<Decimal>,
    /// Mean creation-to-delivery time, e.g. `"18.4 hrs"`.
    pub avg_delivery_time: String,
    pub temperature_alerts: i64,
    pub cold_chain_active: i64,
    pub recent_shipments: Vec<RecentShipment>,
}

impl DashboardStats {
    fn new(counts: &ShipmentCounts, total_patients: i64, recent: Vec<RecentShipment>) -> Self {
        Self {
            total_shipments: counts.total,
            active_shipments: counts.active,
            total_patients,
            delivery_rate: stats::delivery_rate(counts.delivered, counts.exceptions),
            avg_delivery_time: stats::format_hours(counts.avg_delivery_hours),
            temperature_alerts: counts.temperature_alerts,
            cold_chain_active: counts.cold_chain_active,
            recent_shipments: recent,
        }
    }
}

/// One row of the recent-activity list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentShipment {
    pub id: ShipmentId,
    pub shipment_number: String,
    pub patient_name: String,
    /// First medication on the shipment, with strength.
    pub medication: String,
    /// `"City, ST"`.
    pub destination: String,
    pub priority: Priority,
    pub status: ShipmentStatus,
    pub progress: u8,
}

impl From<&ShipmentDetails> for RecentShipment {
    fn from(details: &ShipmentDetails) -> Self {
        let medication = match details.items.as_slice() {
            [] => String::new(),
            [only] => only.medication.display_name(),
            [first, rest @ ..] => format!("{} +{}", first.medication.display_name(), rest.len()),
        };

        Self {
            id: details.shipment.id,
            shipment_number: details.shipment.shipment_number.clone(),
            patient_name: details.patient.full_name(),
            medication,
            destination: details.shipment.destination_city_state(),
            priority: details.shipment.priority,
            status: details.shipment.status,
            progress: details.shipment.status.progress_percent(),
        }
    }
}

/// Payload for the tracking map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackingMap {
    pub center: Coordinates,
    pub zoom: u8,
    pub routes: Vec<TrackingRoute>,
}

/// A shipment drawn as a line from origin to destination.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingRoute {
    pub id: ShipmentId,
    pub shipment_number: String,
    pub patient_name: String,
    pub status: ShipmentStatus,
    pub priority: Priority,
    pub temperature_monitoring: bool,
    pub origin: Coordinates,
    pub destination: Coordinates,
    pub progress: u8,
}

impl TrackingRoute {
    /// A route for the shipment, if both ends are geocoded.
    #[must_use]
    pub fn from_details(details: &ShipmentDetails) -> Option<Self> {
        let shipment = &details.shipment;
        Some(Self {
            id: shipment.id,
            shipment_number: shipment.shipment_number.clone(),
            patient_name: details.patient.full_name(),
            status: shipment.status,
            priority: shipment.priority,
            temperature_monitoring: shipment.temperature_monitoring,
            origin: shipment.origin()?,
            destination: shipment.destination()?,
            progress: shipment.status.progress_percent(),
        })
    }
}

impl TrackingMap {
    /// Build the map from shipments, skipping those without both coordinate pairs.
    #[must_use]
    pub fn from_shipments(shipments: &[ShipmentDetails]) -> Self {
        Self {
            center: MAP_CENTER,
            zoom: MAP_ZOOM,
            routes: shipments
                .iter()
                .filter_map(TrackingRoute::from_details)
                .collect(),
        }
    }
}

/// Dashboard service.
pub struct DashboardService<'a> {
    pool: &'a PgPool,
}

impl<'a> DashboardService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Headline statistics and the most recent shipments.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if a query fails.
    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<DashboardStats, ServiceError> {
        let counts = ShipmentRepository::new(self.pool).dashboard_counts().await?;
        let total_patients = PatientRepository::new(self.pool).count().await?;
        let recent = self.recent_shipments(RECENT_SHIPMENTS).await?;

        Ok(DashboardStats::new(&counts, total_patients, recent))
    }

    /// The `limit` newest shipments as activity rows.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if a query fails.
    #[instrument(skip(self))]
    pub async fn recent_shipments(&self, limit: i64) -> Result<Vec<RecentShipment>, ServiceError> {
        let shipments = ShipmentRepository::new(self.pool).list_recent(limit).await?;
        Ok(shipments.iter().map(RecentShipment::from).collect())
    }

    /// Routes for every geocoded shipment.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if a query fails.
    #[instrument(skip(self))]
    pub async fn tracking_map(&self) -> Result<TrackingMap, ServiceError> {
        let shipments = ShipmentRepository::new(self.pool).list_with_details().await?;
        Ok(TrackingMap::from_shipments(&shipments))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_stats_from_counts() {
        let counts = ShipmentCounts {
            total: 12,
            active: 7,
            delivered: 4,
            exceptions: 1,
            temperature_alerts: 1,
            cold_chain_active: 3,
            avg_delivery_hours: Some(18.44),
        };
        let stats = DashboardStats::new(&counts, 9, Vec::new());

        assert_eq!(stats.total_shipments, 12);
        assert_eq!(stats.active_shipments, 7);
        assert_eq!(stats.total_patients, 9);
        assert_eq!(stats.delivery_rate, Some(dec!(80.0)));
        assert_eq!(stats.avg_delivery_time, "18.4 hrs");
        assert_eq!(stats.cold_chain_active, 3);
    }

    #[test]
    fn test_empty_database_stats() {
        let stats = DashboardStats::new(&ShipmentCounts::default(), 0, Vec::new());
        assert_eq!(stats.delivery_rate, None);
        assert_eq!(stats.avg_delivery_time, "n/a");

        let json = serde_json::to_value(&stats).unwrap();
        assert!(json["deliveryRate"].is_null());
        assert_eq!(json["recentShipments"], serde_json::json!([]));
    }

    #[test]
    fn test_empty_map_is_centered_on_us() {
        let map = TrackingMap::from_shipments(&[]);
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json["center"]["lat"], 39.8283);
        assert_eq!(json["center"]["lng"], -98.5795);
        assert_eq!(json["zoom"], 4);
        assert!(map.routes.is_empty());
    }
}
