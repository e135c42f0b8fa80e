//! Shipment repository.
//!
//! Shipments are always read as [`ShipmentDetails`]: the shipment rows are
//! loaded first, then everything they reference is fetched in one batched
//! query per table and stitched together in memory.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use pharmship_core::{
    Email, MedicationId, PatientId, ShipmentId, ShipmentStatus, ShipmentTaskId, UserId,
};

use super::{MedicationRepository, PatientRepository, RepositoryError, conflict_on_unique};
use crate::models::{
    NewShipmentRecord, Shipment, ShipmentDetails, ShipmentItem, ShipmentItemDetails, ShipmentTask,
    TrackingEvent, UserSummary,
};

const SHIPMENT_COLUMNS: &str = "id, shipment_number, status, priority, shipping_method, \
     carrier, tracking_number, from_address, from_latitude, from_longitude, \
     to_address, to_city, to_state, to_zip_code, to_latitude, to_longitude, \
     requires_signature, temperature_monitoring, estimated_cost, insurance_value, \
     requested_delivery_date, notes, patient_id, created_by_id, \
     created_at, updated_at, shipped_at, delivered_at";

const ITEM_COLUMNS: &str = "id, shipment_id, medication_id, quantity, instructions";

const EVENT_COLUMNS: &str = "id, shipment_id, status, location, description, occurred_at";

const TASK_COLUMNS: &str =
    "id, shipment_id, title, completed, due_date, created_at, completed_at";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CreatorRow {
    id: i32,
    name: String,
    email: String,
}

impl CreatorRow {
    fn into_entry(self) -> Result<(UserId, UserSummary), RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok((
            UserId::new(self.id),
            UserSummary {
                name: self.name,
                email,
            },
        ))
    }
}

/// Aggregate counts over every shipment.
#[derive(Debug, Clone, Default, PartialEq, sqlx::FromRow)]
pub struct ShipmentCounts {
    pub total: i64,
    /// Pending, preparing or shipped.
    pub active: i64,
    pub delivered: i64,
    pub exceptions: i64,
    /// Temperature-monitored shipments in exception.
    pub temperature_alerts: i64,
    /// Active temperature-monitored shipments.
    pub cold_chain_active: i64,
    /// Mean hours from creation to delivery over delivered shipments.
    pub avg_delivery_hours: Option<f64>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for shipment database operations.
pub struct ShipmentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ShipmentRepository<'a> {
    /// Create a new shipment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List every shipment with its details, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if a referenced row is missing.
    pub async fn list_with_details(&self) -> Result<Vec<ShipmentDetails>, RepositoryError> {
        let shipments = sqlx::query_as::<_, Shipment>(&format!(
            "SELECT {SHIPMENT_COLUMNS} FROM pharmacy.shipment ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        self.hydrate(shipments).await
    }

    /// The `limit` most recently created shipments with their details.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if a referenced row is missing.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<ShipmentDetails>, RepositoryError> {
        let shipments = sqlx::query_as::<_, Shipment>(&format!(
            r"
            SELECT {SHIPMENT_COLUMNS} FROM pharmacy.shipment
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        self.hydrate(shipments).await
    }

    /// Get one shipment with its details.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if a referenced row is missing.
    pub async fn get_with_details(
        &self,
        id: ShipmentId,
    ) -> Result<Option<ShipmentDetails>, RepositoryError> {
        let shipment = sqlx::query_as::<_, Shipment>(&format!(
            "SELECT {SHIPMENT_COLUMNS} FROM pharmacy.shipment WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(shipment) = shipment else {
            return Ok(None);
        };

        Ok(self.hydrate(vec![shipment]).await?.pop())
    }

    /// Insert a shipment, its items and its first tracking event in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the shipment number is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, record: &NewShipmentRecord) -> Result<ShipmentId, RepositoryError> {
        let now = Utc::now();
        let shipped_at = matches!(
            record.status,
            ShipmentStatus::Shipped | ShipmentStatus::Delivered
        )
        .then_some(now);
        let delivered_at = (record.status == ShipmentStatus::Delivered).then_some(now);

        let mut tx = self.pool.begin().await?;

        let id = sqlx::query_scalar::<_, ShipmentId>(
            r"
            INSERT INTO pharmacy.shipment
                (shipment_number, status, priority, shipping_method, carrier, tracking_number,
                 from_address, from_latitude, from_longitude,
                 to_address, to_city, to_state, to_zip_code, to_latitude, to_longitude,
                 requires_signature, temperature_monitoring, estimated_cost, insurance_value,
                 requested_delivery_date, notes, patient_id, created_by_id,
                 shipped_at, delivered_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                    $16, $17, $18, $19, $20, $21, $22, $23, $24, $25)
            RETURNING id
            ",
        )
        .bind(&record.shipment_number)
        .bind(record.status)
        .bind(record.priority)
        .bind(record.shipping_method)
        .bind(&record.carrier)
        .bind(&record.tracking_number)
        .bind(&record.from_address)
        .bind(record.from_coordinates.map(|c| c.lat))
        .bind(record.from_coordinates.map(|c| c.lng))
        .bind(&record.to_address)
        .bind(&record.to_city)
        .bind(&record.to_state)
        .bind(&record.to_zip_code)
        .bind(record.to_coordinates.map(|c| c.lat))
        .bind(record.to_coordinates.map(|c| c.lng))
        .bind(record.requires_signature)
        .bind(record.temperature_monitoring)
        .bind(record.estimated_cost)
        .bind(record.insurance_value)
        .bind(record.requested_delivery_date)
        .bind(&record.notes)
        .bind(record.patient_id)
        .bind(record.created_by_id)
        .bind(shipped_at)
        .bind(delivered_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(conflict_on_unique("shipment number"))?;

        for item in &record.items {
            sqlx::query(
                r"
                INSERT INTO pharmacy.shipment_item (shipment_id, medication_id, quantity, instructions)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(id)
            .bind(item.medication_id)
            .bind(item.quantity)
            .bind(&item.instructions)
            .execute(&mut *tx)
            .await?;
        }

        insert_event(
            &mut tx,
            id,
            record.status,
            None,
            record.status.event_description(),
        )
        .await?;

        tx.commit().await?;

        Ok(id)
    }

    /// Move a shipment to `next`, stamping timestamps and recording the event.
    ///
    /// The row is locked for the transition check.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the shipment does not exist.
    /// Returns `RepositoryError::Conflict` if the lifecycle forbids the transition.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_status(
        &self,
        id: ShipmentId,
        next: ShipmentStatus,
        location: Option<&str>,
        description: &str,
    ) -> Result<TrackingEvent, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_scalar::<_, ShipmentStatus>(
            "SELECT status FROM pharmacy.shipment WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        if !current.can_transition_to(next) {
            return Err(RepositoryError::Conflict(format!(
                "cannot move shipment from {current} to {next}"
            )));
        }

        sqlx::query(
            r"
            UPDATE pharmacy.shipment
            SET status = $2,
                updated_at = NOW(),
                shipped_at = CASE WHEN $3 THEN COALESCE(shipped_at, NOW()) ELSE shipped_at END,
                delivered_at = CASE WHEN $4 THEN COALESCE(delivered_at, NOW()) ELSE delivered_at END
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(next)
        .bind(next == ShipmentStatus::Shipped)
        .bind(next == ShipmentStatus::Delivered)
        .execute(&mut *tx)
        .await?;

        let event = insert_event(&mut tx, id, next, location, description).await?;

        tx.commit().await?;

        Ok(event)
    }

    /// Attach a task to a shipment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the shipment does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn add_task(
        &self,
        shipment_id: ShipmentId,
        title: &str,
        due_date: Option<NaiveDate>,
    ) -> Result<ShipmentTask, RepositoryError> {
        sqlx::query_as::<_, ShipmentTask>(&format!(
            r"
            INSERT INTO pharmacy.shipment_task (shipment_id, title, due_date)
            VALUES ($1, $2, $3)
            RETURNING {TASK_COLUMNS}
            "
        ))
        .bind(shipment_id)
        .bind(title)
        .bind(due_date)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })
    }

    /// Mark a task complete. Completing it again keeps the first timestamp.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the task does not belong to the shipment.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn complete_task(
        &self,
        shipment_id: ShipmentId,
        task_id: ShipmentTaskId,
    ) -> Result<ShipmentTask, RepositoryError> {
        sqlx::query_as::<_, ShipmentTask>(&format!(
            r"
            UPDATE pharmacy.shipment_task
            SET completed = TRUE,
                completed_at = COALESCE(completed_at, NOW())
            WHERE id = $1 AND shipment_id = $2
            RETURNING {TASK_COLUMNS}
            "
        ))
        .bind(task_id)
        .bind(shipment_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Totals for the dashboard statistics.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn dashboard_counts(&self) -> Result<ShipmentCounts, RepositoryError> {
        let counts = sqlx::query_as::<_, ShipmentCounts>(
            r"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status IN ('pending', 'preparing', 'shipped')) AS active,
                COUNT(*) FILTER (WHERE status = 'delivered') AS delivered,
                COUNT(*) FILTER (WHERE status = 'exception') AS exceptions,
                COUNT(*) FILTER (
                    WHERE status = 'exception' AND temperature_monitoring
                ) AS temperature_alerts,
                COUNT(*) FILTER (
                    WHERE status IN ('pending', 'preparing', 'shipped') AND temperature_monitoring
                ) AS cold_chain_active,
                (
                    AVG(EXTRACT(EPOCH FROM (delivered_at - created_at)))
                        FILTER (WHERE status = 'delivered' AND delivered_at IS NOT NULL)
                    / 3600.0
                )::float8 AS avg_delivery_hours
            FROM pharmacy.shipment
            ",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(counts)
    }

    /// Load everything the given shipments reference, preserving their order.
    async fn hydrate(
        &self,
        shipments: Vec<Shipment>,
    ) -> Result<Vec<ShipmentDetails>, RepositoryError> {
        if shipments.is_empty() {
            return Ok(Vec::new());
        }

        let shipment_ids: Vec<i32> = shipments.iter().map(|s| s.id.as_i32()).collect();
        let patient_ids = unique(shipments.iter().map(|s| s.patient_id));
        let creator_ids: Vec<i32> = unique(shipments.iter().map(|s| s.created_by_id.as_i32()));

        let patients: HashMap<PatientId, _> = PatientRepository::new(self.pool)
            .get_many(&patient_ids)
            .await?
            .into_iter()
            .map(|patient| (patient.id, patient))
            .collect();

        let creators = sqlx::query_as::<_, CreatorRow>(
            "SELECT id, name, email FROM pharmacy.app_user WHERE id = ANY($1)",
        )
        .bind(creator_ids)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(CreatorRow::into_entry)
        .collect::<Result<HashMap<UserId, UserSummary>, RepositoryError>>()?;

        let items = sqlx::query_as::<_, ShipmentItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM pharmacy.shipment_item WHERE shipment_id = ANY($1) ORDER BY id"
        ))
        .bind(&shipment_ids)
        .fetch_all(self.pool)
        .await?;

        let medication_ids = unique(items.iter().map(|item| item.medication_id));
        let medications: HashMap<MedicationId, _> = MedicationRepository::new(self.pool)
            .get_many(&medication_ids)
            .await?
            .into_iter()
            .map(|medication| (medication.id, medication))
            .collect();

        let tasks = sqlx::query_as::<_, ShipmentTask>(&format!(
            r"
            SELECT {TASK_COLUMNS} FROM pharmacy.shipment_task
            WHERE shipment_id = ANY($1)
            ORDER BY created_at, id
            "
        ))
        .bind(&shipment_ids)
        .fetch_all(self.pool)
        .await?;

        let events = sqlx::query_as::<_, TrackingEvent>(&format!(
            r"
            SELECT {EVENT_COLUMNS} FROM pharmacy.tracking_event
            WHERE shipment_id = ANY($1)
            ORDER BY occurred_at DESC, id DESC
            "
        ))
        .bind(&shipment_ids)
        .fetch_all(self.pool)
        .await?;

        let mut items_by_shipment: HashMap<ShipmentId, Vec<ShipmentItemDetails>> = HashMap::new();
        for item in items {
            let medication = medications.get(&item.medication_id).cloned().ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "shipment item {} references missing medication {}",
                    item.id, item.medication_id
                ))
            })?;
            items_by_shipment
                .entry(item.shipment_id)
                .or_default()
                .push(ShipmentItemDetails { item, medication });
        }

        let mut tasks_by_shipment: HashMap<ShipmentId, Vec<ShipmentTask>> = HashMap::new();
        for task in tasks {
            tasks_by_shipment.entry(task.shipment_id).or_default().push(task);
        }

        let mut events_by_shipment: HashMap<ShipmentId, Vec<TrackingEvent>> = HashMap::new();
        for event in events {
            events_by_shipment.entry(event.shipment_id).or_default().push(event);
        }

        shipments
            .into_iter()
            .map(|shipment| {
                let patient = patients
                    .get(&shipment.patient_id)
                    .cloned()
                    .ok_or_else(|| missing(&shipment, "patient"))?;
                let created_by = creators
                    .get(&shipment.created_by_id)
                    .cloned()
                    .ok_or_else(|| missing(&shipment, "creator"))?;

                Ok(ShipmentDetails {
                    items: items_by_shipment.remove(&shipment.id).unwrap_or_default(),
                    tasks: tasks_by_shipment.remove(&shipment.id).unwrap_or_default(),
                    tracking_events: events_by_shipment.remove(&shipment.id).unwrap_or_default(),
                    patient,
                    created_by,
                    shipment,
                })
            })
            .collect()
    }
}

async fn insert_event(
    tx: &mut Transaction<'_, Postgres>,
    shipment_id: ShipmentId,
    status: ShipmentStatus,
    location: Option<&str>,
    description: &str,
) -> Result<TrackingEvent, RepositoryError> {
    let event = sqlx::query_as::<_, TrackingEvent>(&format!(
        r"
        INSERT INTO pharmacy.tracking_event (shipment_id, status, location, description)
        VALUES ($1, $2, $3, $4)
        RETURNING {EVENT_COLUMNS}
        "
    ))
    .bind(shipment_id)
    .bind(status)
    .bind(location)
    .bind(description)
    .fetch_one(&mut **tx)
    .await?;

    Ok(event)
}

fn unique<T: Ord>(values: impl Iterator<Item = T>) -> Vec<T> {
    let mut values: Vec<T> = values.collect();
    values.sort_unstable();
    values.dedup();
    values
}

fn missing(shipment: &Shipment, what: &str) -> RepositoryError {
    RepositoryError::DataCorruption(format!(
        "shipment {} references missing {what}",
        shipment.id
    ))
}
