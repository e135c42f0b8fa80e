//! Service-layer errors.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::models::ValidationErrors;

/// Errors returned by the shipment and dashboard services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request failed field validation.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// Repository/database error.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}
