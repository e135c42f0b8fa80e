//! JSON API route handlers.
//!
//! Every route here requires a session; unauthenticated calls get
//! `401 {"error": "Unauthorized"}` from the auth extractors.

pub mod dashboard;
pub mod medications;
pub mod patients;
pub mod shipments;
pub mod tracking;

use axum::Router;
use serde::Deserialize;

use crate::state::AppState;

/// Build the complete API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(shipments::router())
        .merge(patients::router())
        .merge(medications::router())
        .merge(tracking::router())
        .merge(dashboard::router())
}

/// `?q=` search parameter shared by the catalog lists.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}
