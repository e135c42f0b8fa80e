//! Medication catalog repository.

use sqlx::PgPool;

use pharmship_core::MedicationId;

use super::{RepositoryError, conflict_on_unique};
use crate::models::{Medication, MedicationRecord};

const MEDICATION_COLUMNS: &str = "id, name, strength, form, manufacturer, ndc, \
     temperature, temperature_range, controlled, created_at";

/// Repository for medication database operations.
pub struct MedicationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MedicationRepository<'a> {
    /// Create a new medication repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List the catalog alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Medication>, RepositoryError> {
        let medications = sqlx::query_as::<_, Medication>(&format!(
            "SELECT {MEDICATION_COLUMNS} FROM pharmacy.medication ORDER BY name, strength"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(medications)
    }

    /// Get a medication by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: MedicationId) -> Result<Option<Medication>, RepositoryError> {
        let medication = sqlx::query_as::<_, Medication>(&format!(
            "SELECT {MEDICATION_COLUMNS} FROM pharmacy.medication WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(medication)
    }

    /// Get several medications by ID. Missing IDs are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[MedicationId]) -> Result<Vec<Medication>, RepositoryError> {
        let ids: Vec<i32> = ids.iter().map(MedicationId::as_i32).collect();
        let medications = sqlx::query_as::<_, Medication>(&format!(
            "SELECT {MEDICATION_COLUMNS} FROM pharmacy.medication WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        Ok(medications)
    }

    /// Insert a validated medication.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the NDC is already in the catalog.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, medication: &MedicationRecord) -> Result<Medication, RepositoryError> {
        let created = sqlx::query_as::<_, Medication>(&format!(
            r"
            INSERT INTO pharmacy.medication
                (name, strength, form, manufacturer, ndc,
                 temperature, temperature_range, controlled)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {MEDICATION_COLUMNS}
            "
        ))
        .bind(&medication.name)
        .bind(&medication.strength)
        .bind(&medication.form)
        .bind(&medication.manufacturer)
        .bind(&medication.ndc)
        .bind(medication.temperature)
        .bind(&medication.temperature_range)
        .bind(medication.controlled)
        .fetch_one(self.pool)
        .await
        .map_err(conflict_on_unique("medication with this NDC"))?;

        Ok(created)
    }

    /// Find a medication by NDC.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_ndc(&self, ndc: &str) -> Result<Option<Medication>, RepositoryError> {
        let medication = sqlx::query_as::<_, Medication>(&format!(
            "SELECT {MEDICATION_COLUMNS} FROM pharmacy.medication WHERE ndc = $1"
        ))
        .bind(ndc)
        .fetch_optional(self.pool)
        .await?;

        Ok(medication)
    }
}
