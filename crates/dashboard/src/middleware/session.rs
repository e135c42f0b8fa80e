//! Session layer configuration.
//!
//! Sessions live in `pharmacy.session` and expire after a configurable period
//! of inactivity.

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::DashboardConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "pharmship_session";

/// Create the session layer with `PostgreSQL` store.
///
/// # Panics
///
/// Panics if the schema name or table name is invalid (never the case for the
/// hardcoded "pharmacy" and "session" values).
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &DashboardConfig,
) -> SessionManagerLayer<PostgresStore> {
    // The session table is created by the migrations.
    let store = PostgresStore::new(pool.clone())
        .with_schema_name("pharmacy")
        .expect("valid schema name")
        .with_table_name("session")
        .expect("valid table name");

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::hours(config.session_hours),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
