//! Patient repository.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use pharmship_core::{Email, PatientId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::{Patient, PatientRecord};

#[derive(Debug, sqlx::FromRow)]
struct PatientRow {
    id: i32,
    first_name: String,
    last_name: String,
    email: Option<String>,
    phone: Option<String>,
    date_of_birth: Option<NaiveDate>,
    address: String,
    city: String,
    state: String,
    zip_code: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PatientRow> for Patient {
    type Error = RepositoryError;

    fn try_from(row: PatientRow) -> Result<Self, Self::Error> {
        let email = row
            .email
            .as_deref()
            .map(Email::parse)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid patient email in database: {e}"))
            })?;

        Ok(Self {
            id: PatientId::new(row.id),
            first_name: row.first_name,
            last_name: row.last_name,
            email,
            phone: row.phone,
            date_of_birth: row.date_of_birth,
            address: row.address,
            city: row.city,
            state: row.state,
            zip_code: row.zip_code,
            latitude: row.latitude,
            longitude: row.longitude,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const PATIENT_COLUMNS: &str = "id, first_name, last_name, email, phone, date_of_birth, \
     address, city, state, zip_code, latitude, longitude, created_at, updated_at";

/// Repository for patient database operations.
pub struct PatientRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PatientRepository<'a> {
    /// Create a new patient repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List every patient by last then first name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored email is invalid.
    pub async fn list_all(&self) -> Result<Vec<Patient>, RepositoryError> {
        let rows = sqlx::query_as::<_, PatientRow>(&format!(
            "SELECT {PATIENT_COLUMNS} FROM pharmacy.patient ORDER BY last_name, first_name, id"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a patient by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get_by_id(&self, id: PatientId) -> Result<Option<Patient>, RepositoryError> {
        let row = sqlx::query_as::<_, PatientRow>(&format!(
            "SELECT {PATIENT_COLUMNS} FROM pharmacy.patient WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get several patients by ID. Missing IDs are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored email is invalid.
    pub async fn get_many(&self, ids: &[PatientId]) -> Result<Vec<Patient>, RepositoryError> {
        let ids: Vec<i32> = ids.iter().map(PatientId::as_i32).collect();
        let rows = sqlx::query_as::<_, PatientRow>(&format!(
            "SELECT {PATIENT_COLUMNS} FROM pharmacy.patient WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Insert a validated patient.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email belongs to another patient.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, patient: &PatientRecord) -> Result<Patient, RepositoryError> {
        let row = sqlx::query_as::<_, PatientRow>(&format!(
            r"
            INSERT INTO pharmacy.patient
                (first_name, last_name, email, phone, date_of_birth,
                 address, city, state, zip_code, latitude, longitude)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {PATIENT_COLUMNS}
            "
        ))
        .bind(&patient.first_name)
        .bind(&patient.last_name)
        .bind(patient.email.as_ref().map(Email::as_str))
        .bind(&patient.phone)
        .bind(patient.date_of_birth)
        .bind(&patient.address)
        .bind(&patient.city)
        .bind(&patient.state)
        .bind(&patient.zip_code)
        .bind(patient.coordinates.map(|c| c.lat))
        .bind(patient.coordinates.map(|c| c.lng))
        .fetch_one(self.pool)
        .await
        .map_err(conflict_on_unique("patient with this email"))?;

        row.try_into()
    }

    /// Count all patients.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM pharmacy.patient")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }
}
