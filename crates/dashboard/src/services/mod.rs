//! Application logic between the route handlers and the repositories.
//!
//! # Services
//!
//! - `auth` - Staff password login and user registration
//! - `shipments` - Shipment creation defaults, status changes and tasks
//! - `dashboard` - Statistics, recent activity and the tracking map

pub mod auth;
pub mod dashboard;
mod error;
pub mod shipments;

pub use auth::{AuthError, AuthService};
pub use dashboard::{DashboardService, DashboardStats, RecentShipment, TrackingMap, TrackingRoute};
pub use error::ServiceError;
pub use shipments::ShipmentService;
