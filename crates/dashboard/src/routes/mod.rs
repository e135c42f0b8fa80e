//! HTTP route handlers for the dashboard.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                         - Liveness check
//! GET  /health/ready                   - Database readiness
//!
//! # Public
//! GET  /                               - Landing page
//! GET  /login                          - Login page
//! POST /login                          - Email and password login
//! POST /logout                         - Logout
//!
//! # Pages (session required, else redirect to /login)
//! GET  /dashboard                      - Overview and recent shipments
//! GET  /dashboard/shipments            - Shipment list with filters
//! GET  /dashboard/shipments/new        - New shipment form
//! POST /dashboard/shipments/new        - Submit new shipment
//! GET  /dashboard/shipments/{id}       - Shipment detail
//! POST /dashboard/shipments/{id}/status                  - Change status
//! POST /dashboard/shipments/{id}/tasks                   - Add task
//! POST /dashboard/shipments/{id}/tasks/{task_id}/complete - Complete task
//! GET  /dashboard/patients             - Patient directory
//! GET  /dashboard/medications          - Medication catalog
//! GET  /dashboard/tracking             - Route table and map data
//!
//! # JSON API (session required, else 401)
//! GET  /api/shipments                  - List shipments
//! POST /api/shipments                  - Create shipment
//! POST /api/shipments/estimate         - Price a shipment
//! GET  /api/shipments/{id}             - Shipment detail
//! POST /api/shipments/{id}/status      - Change status
//! POST /api/shipments/{id}/tasks       - Add task
//! POST /api/shipments/{id}/tasks/{task_id}/complete - Complete task
//! GET  /api/patients                   - List patients
//! POST /api/patients                   - Register patient
//! GET  /api/medications                - List medications
//! POST /api/medications                - Add medication (admin, pharmacist)
//! GET  /api/tracking                   - Tracking map payload
//! GET  /api/dashboard/stats            - Dashboard statistics
//! ```

pub mod api;
pub mod auth;
pub mod dashboard;
pub mod home;
pub mod medications;
pub mod patients;
pub mod shipments;
pub mod tracking;
pub mod views;

use axum::Router;

use crate::state::AppState;

/// Build the page and API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(home::router())
        .merge(auth::router())
        .merge(dashboard::router())
        .merge(shipments::router())
        .merge(patients::router())
        .merge(medications::router())
        .merge(tracking::router())
        .merge(api::router())
}
