//! Shipment workflows.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use pharmship_core::{
    CostEstimate, MedicationId, ShipmentId, ShipmentStatus, ShipmentTaskId, ShippingOptions, UserId,
    estimate,
};

use super::ServiceError;
use crate::config::PharmacyOrigin;
use crate::db::{MedicationRepository, PatientRepository, RepositoryError, ShipmentRepository};
use crate::models::shipment::shipment_number;
use crate::models::validation::non_blank;
use crate::models::{
    CheckedDraft, DraftSource, Medication, NewShipmentRecord, NewTask, Patient, ShipmentDetails,
    ShipmentDraft, ShipmentFilter, ShipmentTask, StatusChange, ValidationErrors,
};

/// Attempts at inserting with a fresh shipment number before giving up.
const SHIPMENT_NUMBER_ATTEMPTS: u32 = 3;

/// Shipment service.
pub struct ShipmentService<'a> {
    pool: &'a PgPool,
    origin: &'a PharmacyOrigin,
}

impl<'a> ShipmentService<'a> {
    /// Create a new shipment service shipping from `origin` by default.
    #[must_use]
    pub const fn new(pool: &'a PgPool, origin: &'a PharmacyOrigin) -> Self {
        Self { pool, origin }
    }

    /// List shipments with details, newest first, narrowed by `filter`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if loading fails.
    #[instrument(skip(self))]
    pub async fn list(&self, filter: &ShipmentFilter) -> Result<Vec<ShipmentDetails>, ServiceError> {
        let shipments = ShipmentRepository::new(self.pool).list_with_details().await?;
        Ok(filter.apply(shipments))
    }

    /// Get one shipment with details.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` (wrapped) if the shipment does not exist.
    #[instrument(skip(self))]
    pub async fn get(&self, id: ShipmentId) -> Result<ShipmentDetails, ServiceError> {
        ShipmentRepository::new(self.pool)
            .get_with_details(id)
            .await?
            .ok_or(ServiceError::Repository(RepositoryError::NotFound))
    }

    /// Price a shipment before it is created.
    ///
    /// Cold-chain medications among `medication_ids` switch temperature
    /// monitoring on, exactly as creation does. Returns the options actually
    /// priced alongside the breakdown.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if a medication does not exist.
    #[instrument(skip(self))]
    pub async fn quote(
        &self,
        options: ShippingOptions,
        medication_ids: &[MedicationId],
    ) -> Result<(ShippingOptions, CostEstimate), ServiceError> {
        let mut ids = medication_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let requires_cold_chain = if ids.is_empty() {
            false
        } else {
            let medications = MedicationRepository::new(self.pool).get_many(&ids).await?;
            if medications.len() != ids.len() {
                return Err(ValidationErrors::single("items", "Medication not found").into());
            }
            medications.iter().any(Medication::requires_cold_chain)
        };

        let options = options.with_cold_chain(requires_cold_chain);
        Ok((options, estimate(&options)))
    }

    /// Validate a draft, fill in defaults, price it and insert it.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if the draft is incomplete or references
    /// an unknown patient or medication.
    /// Returns `ServiceError::Repository` for database errors.
    #[instrument(skip(self, draft), fields(patient_id = ?draft.patient_id))]
    pub async fn create(
        &self,
        draft: &ShipmentDraft,
        creator: UserId,
        source: DraftSource,
    ) -> Result<ShipmentDetails, ServiceError> {
        let checked = draft.validate(Utc::now().date_naive(), source)?;

        let patient = PatientRepository::new(self.pool)
            .get_by_id(checked.patient_id)
            .await?
            .ok_or_else(|| ValidationErrors::single("patientId", "Patient not found"))?;

        let medication_ids: Vec<MedicationId> = {
            let mut ids: Vec<_> = checked.items.iter().map(|item| item.medication_id).collect();
            ids.sort_unstable();
            ids.dedup();
            ids
        };
        let medications = MedicationRepository::new(self.pool)
            .get_many(&medication_ids)
            .await?;
        if medications.len() != medication_ids.len() {
            return Err(ValidationErrors::single("items", "Medication not found").into());
        }

        let repo = ShipmentRepository::new(self.pool);
        let mut attempt = 1;
        let id = loop {
            let record = resolve_draft(
                draft,
                &checked,
                &patient,
                &medications,
                self.origin,
                creator,
                Utc::now(),
            );
            match repo.create(&record).await {
                Ok(id) => break id,
                Err(RepositoryError::Conflict(_)) if attempt < SHIPMENT_NUMBER_ATTEMPTS => {
                    tracing::warn!(
                        shipment_number = %record.shipment_number,
                        "Shipment number collision, retrying"
                    );
                    attempt += 1;
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
                Err(e) => return Err(e.into()),
            }
        };

        tracing::info!(shipment_id = %id, "Shipment created");
        self.get(id).await
    }

    /// Move a shipment along its lifecycle.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` (wrapped) for an unknown shipment and
    /// `RepositoryError::Conflict` (wrapped) for a forbidden transition.
    #[instrument(skip(self, change), fields(status = %change.status))]
    pub async fn change_status(
        &self,
        id: ShipmentId,
        change: &StatusChange,
    ) -> Result<ShipmentDetails, ServiceError> {
        let location = non_blank(change.location.as_deref());
        ShipmentRepository::new(self.pool)
            .update_status(
                id,
                change.status,
                location.as_deref(),
                &change.event_description(),
            )
            .await?;

        tracing::info!(shipment_id = %id, status = %change.status, "Shipment status changed");
        self.get(id).await
    }

    /// Add a checklist task to a shipment.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for a blank title and
    /// `RepositoryError::NotFound` (wrapped) for an unknown shipment.
    #[instrument(skip(self, task))]
    pub async fn add_task(
        &self,
        id: ShipmentId,
        task: &NewTask,
    ) -> Result<ShipmentTask, ServiceError> {
        let title = task.validate()?;
        let task = ShipmentRepository::new(self.pool)
            .add_task(id, &title, task.due_date)
            .await?;
        Ok(task)
    }

    /// Mark a shipment's task complete.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` (wrapped) if the task is not on the shipment.
    #[instrument(skip(self))]
    pub async fn complete_task(
        &self,
        id: ShipmentId,
        task_id: ShipmentTaskId,
    ) -> Result<ShipmentTask, ServiceError> {
        let task = ShipmentRepository::new(self.pool)
            .complete_task(id, task_id)
            .await?;
        Ok(task)
    }
}

/// Fill in a validated draft's defaults and price it.
///
/// Destination fields come from the patient unless given. The origin is the
/// pharmacy unless given. Coordinates are only carried over for defaulted
/// addresses, since explicitly typed addresses are not geocoded.
fn resolve_draft(
    draft: &ShipmentDraft,
    checked: &CheckedDraft,
    patient: &Patient,
    medications: &[Medication],
    origin: &PharmacyOrigin,
    created_by_id: UserId,
    now: DateTime<Utc>,
) -> NewShipmentRecord {
    let requires_cold_chain = medications.iter().any(Medication::requires_cold_chain);
    let options = draft.shipping_options().with_cold_chain(requires_cold_chain);
    let cost = estimate(&options);

    let (from_address, from_coordinates) = match non_blank(draft.from_address.as_deref()) {
        Some(address) => (address, None),
        None => (origin.address.clone(), origin.coordinates),
    };

    let (to_address, to_coordinates) = match non_blank(draft.to_address.as_deref()) {
        Some(address) => (address, None),
        None => (patient.address.clone(), patient.coordinates()),
    };
    let or_patient = |value: &Option<String>, fallback: &str| {
        non_blank(value.as_deref()).unwrap_or_else(|| fallback.to_owned())
    };

    NewShipmentRecord {
        shipment_number: shipment_number(now),
        status: draft.status.unwrap_or(ShipmentStatus::Pending),
        priority: options.priority,
        shipping_method: options.shipping_method,
        carrier: non_blank(draft.carrier.as_deref()),
        tracking_number: non_blank(draft.tracking_number.as_deref()),
        from_address,
        from_coordinates,
        to_address,
        to_city: or_patient(&draft.to_city, &patient.city),
        to_state: or_patient(&draft.to_state, &patient.state).to_uppercase(),
        to_zip_code: or_patient(&draft.to_zip_code, &patient.zip_code),
        to_coordinates,
        requires_signature: options.requires_signature,
        temperature_monitoring: options.temperature_monitoring,
        estimated_cost: cost.total,
        insurance_value: checked.insurance_value,
        requested_delivery_date: draft.requested_delivery_date,
        notes: non_blank(draft.notes.as_deref()),
        patient_id: checked.patient_id,
        created_by_id,
        items: checked.items.clone(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use pharmship_core::{
        Coordinates, Money, PatientId, Priority, ShippingMethod, TemperatureRequirement,
    };
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::ShipmentItemDraft;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 15, 0, 0).unwrap()
    }

    fn patient() -> Patient {
        Patient {
            id: PatientId::new(7),
            first_name: "Sarah".to_string(),
            last_name: "Johnson".to_string(),
            email: None,
            phone: None,
            date_of_birth: None,
            address: "123 Main St".to_string(),
            city: "New York".to_string(),
            state: "NY".to_string(),
            zip_code: "10001".to_string(),
            latitude: Some(40.7128),
            longitude: Some(-74.006),
            created_at: now(),
            updated_at: now(),
        }
    }

    fn medication(temperature: TemperatureRequirement) -> Medication {
        Medication {
            id: MedicationId::new(3),
            name: "Insulin Glargine".to_string(),
            strength: Some("100U/mL".to_string()),
            form: None,
            manufacturer: None,
            ndc: None,
            temperature,
            temperature_range: None,
            controlled: false,
            created_at: now(),
        }
    }

    fn origin() -> PharmacyOrigin {
        PharmacyOrigin {
            address: "Central Pharmacy, 1 Health Way".to_string(),
            coordinates: Some(Coordinates::new(41.88, -87.63).unwrap()),
        }
    }

    fn draft() -> ShipmentDraft {
        ShipmentDraft {
            patient_id: Some(PatientId::new(7)),
            items: vec![ShipmentItemDraft {
                medication_id: Some(MedicationId::new(3)),
                quantity: 2,
                instructions: None,
            }],
            ..ShipmentDraft::default()
        }
    }

    fn resolve(draft: &ShipmentDraft, temperature: TemperatureRequirement) -> NewShipmentRecord {
        let checked = draft.validate(now().date_naive(), DraftSource::Api).unwrap();
        resolve_draft(
            draft,
            &checked,
            &patient(),
            &[medication(temperature)],
            &origin(),
            UserId::new(1),
            now(),
        )
    }

    #[test]
    fn test_defaults_come_from_patient_and_pharmacy() {
        let record = resolve(&draft(), TemperatureRequirement::Room);

        assert_eq!(record.status, ShipmentStatus::Pending);
        assert_eq!(record.to_address, "123 Main St");
        assert_eq!(record.to_city, "New York");
        assert_eq!(record.to_zip_code, "10001");
        assert_eq!(record.to_coordinates, patient().coordinates());
        assert_eq!(record.from_address, "Central Pharmacy, 1 Health Way");
        assert_eq!(record.from_coordinates, origin().coordinates);
        assert_eq!(record.shipment_number, format!("SH{}", now().timestamp_millis()));
        assert_eq!(record.estimated_cost, Money::new(dec!(15.99)));
    }

    #[test]
    fn test_explicit_destination_drops_coordinates() {
        let mut custom = draft();
        custom.to_address = Some("55 Elm St".to_string());
        custom.to_city = Some("Albany".to_string());
        custom.to_state = Some("ny".to_string());

        let record = resolve(&custom, TemperatureRequirement::Room);
        assert_eq!(record.to_address, "55 Elm St");
        assert_eq!(record.to_city, "Albany");
        assert_eq!(record.to_state, "NY");
        assert_eq!(record.to_zip_code, "10001");
        assert_eq!(record.to_coordinates, None);
    }

    #[test]
    fn test_cold_chain_forces_monitoring_and_its_fee() {
        let mut overnight = draft();
        overnight.shipping_method = ShippingMethod::Overnight;
        overnight.priority = Priority::Critical;

        let record = resolve(&overnight, TemperatureRequirement::Refrigerated);
        assert!(record.temperature_monitoring);
        // 15.99 + 25 + 15 + 12
        assert_eq!(record.estimated_cost, Money::new(dec!(67.99)));

        let record = resolve(&overnight, TemperatureRequirement::Room);
        assert!(!record.temperature_monitoring);
        assert_eq!(record.estimated_cost, Money::new(dec!(55.99)));
    }

    #[test]
    fn test_requested_status_is_kept() {
        let mut shipped = draft();
        shipped.status = Some(ShipmentStatus::Preparing);
        assert_eq!(
            resolve(&shipped, TemperatureRequirement::Room).status,
            ShipmentStatus::Preparing
        );
    }
}
