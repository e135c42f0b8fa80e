//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! pharmship migrate
//! ```
//!
//! Migrations are embedded from `crates/dashboard/migrations/` at compile
//! time. Already-applied migrations are skipped.

use super::{CommandError, connect};

/// Run the dashboard database migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../dashboard/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
