//! CLI subcommands.
//!
//! Every command reads `PHARMSHIP_DATABASE_URL` (falling back to
//! `DATABASE_URL`), loading `.env` first.

pub mod migrate;
pub mod seed;
pub mod user;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

/// Errors shared by the database-backed commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: admin, pharmacist, technician")]
    InvalidRole(String),

    /// User registration failed.
    #[error("Could not create user: {0}")]
    Auth(#[from] pharmship_dashboard::services::AuthError),

    /// Repository operation failed.
    #[error("Repository error: {0}")]
    Repository(#[from] pharmship_dashboard::db::RepositoryError),

    /// Seed data failed validation.
    #[error("Invalid seed data for {0}")]
    InvalidSeed(String),
}

/// Load `.env` and connect to the dashboard database.
async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("PHARMSHIP_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("PHARMSHIP_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = pharmship_dashboard::db::create_pool(&database_url).await?;
    Ok(pool)
}
