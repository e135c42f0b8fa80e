//! Shipment domain types.
//!
//! [`ShipmentDetails`] is the aggregate the API returns: the shipment row plus
//! its patient, line items (with medication), creator, tasks and tracking
//! history. [`ShipmentDraft`] is the create request, checked by
//! [`ShipmentDraft::validate`] before the service resolves defaults.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pharmship_core::{
    Coordinates, Email, MedicationId, Money, PatientId, Priority, ShipmentId, ShipmentItemId,
    ShipmentStatus, ShipmentTaskId, ShippingMethod, ShippingOptions, TextQuery, TrackingEventId,
    UserId,
};

use super::medication::Medication;
use super::patient::Patient;
use super::validation::{ValidationErrors, blank_as_none, non_blank};

// =============================================================================
// Stored Types
// =============================================================================

/// A shipment row.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub id: ShipmentId,
    /// Human-facing identifier, `SH` followed by creation time in unix millis.
    pub shipment_number: String,
    pub status: ShipmentStatus,
    pub priority: Priority,
    pub shipping_method: ShippingMethod,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub from_address: String,
    pub from_latitude: Option<f64>,
    pub from_longitude: Option<f64>,
    pub to_address: String,
    pub to_city: String,
    pub to_state: String,
    pub to_zip_code: String,
    pub to_latitude: Option<f64>,
    pub to_longitude: Option<f64>,
    pub requires_signature: bool,
    pub temperature_monitoring: bool,
    pub estimated_cost: Money,
    pub insurance_value: Option<Money>,
    pub requested_delivery_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub patient_id: PatientId,
    pub created_by_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl Shipment {
    #[must_use]
    pub fn origin(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.from_latitude, self.from_longitude)
    }

    #[must_use]
    pub fn destination(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.to_latitude, self.to_longitude)
    }

    /// `"City, ST"` of the destination.
    #[must_use]
    pub fn destination_city_state(&self) -> String {
        format!("{}, {}", self.to_city, self.to_state)
    }

    /// Options the estimated cost was computed from.
    #[must_use]
    pub const fn shipping_options(&self) -> ShippingOptions {
        ShippingOptions {
            shipping_method: self.shipping_method,
            priority: self.priority,
            temperature_monitoring: self.temperature_monitoring,
            requires_signature: self.requires_signature,
        }
    }
}

/// A medication line on a shipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentItem {
    pub id: ShipmentItemId,
    pub shipment_id: ShipmentId,
    pub medication_id: MedicationId,
    pub quantity: i32,
    pub instructions: Option<String>,
}

/// A line item with its medication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentItemDetails {
    #[serde(flatten)]
    pub item: ShipmentItem,
    pub medication: Medication,
}

/// One entry in a shipment's status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEvent {
    pub id: TrackingEventId,
    pub shipment_id: ShipmentId,
    pub status: ShipmentStatus,
    pub location: Option<String>,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
}

/// A checklist item attached to a shipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentTask {
    pub id: ShipmentTaskId,
    pub shipment_id: ShipmentId,
    pub title: String,
    pub completed: bool,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// The creator of a shipment, as exposed to API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub name: String,
    pub email: Email,
}

/// A shipment with everything it references.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentDetails {
    #[serde(flatten)]
    pub shipment: Shipment,
    pub patient: Patient,
    pub items: Vec<ShipmentItemDetails>,
    pub created_by: UserSummary,
    pub tasks: Vec<ShipmentTask>,
    /// Newest first.
    pub tracking_events: Vec<TrackingEvent>,
}

impl ShipmentDetails {
    /// Whether any medication on the shipment needs a cold chain.
    #[must_use]
    pub fn requires_cold_chain(&self) -> bool {
        self.items
            .iter()
            .any(|item| item.medication.requires_cold_chain())
    }

    /// Names of the medications on the shipment, in line order.
    #[must_use]
    pub fn medication_names(&self) -> Vec<&str> {
        self.items
            .iter()
            .map(|item| item.medication.name.as_str())
            .collect()
    }

    /// The most recent tracking event.
    #[must_use]
    pub fn latest_event(&self) -> Option<&TrackingEvent> {
        self.tracking_events.first()
    }

    /// Number of tasks still open.
    #[must_use]
    pub fn open_tasks(&self) -> usize {
        self.tasks.iter().filter(|task| !task.completed).count()
    }

    /// Shipment search matches number, patient, medications and destination.
    #[must_use]
    pub fn matches(&self, query: &TextQuery) -> bool {
        let patient = self.patient.full_name();
        let fields = [
            self.shipment.shipment_number.as_str(),
            patient.as_str(),
            self.shipment.to_address.as_str(),
            self.shipment.to_city.as_str(),
        ];
        query.matches(fields.into_iter().chain(self.medication_names()))
    }
}

// =============================================================================
// Listing
// =============================================================================

/// Query parameters for shipment lists.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShipmentFilter {
    pub q: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub status: Option<ShipmentStatus>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub priority: Option<Priority>,
}

impl ShipmentFilter {
    #[must_use]
    pub fn text_query(&self) -> TextQuery {
        TextQuery::from_param(self.q.as_deref())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text_query().is_empty() && self.status.is_none() && self.priority.is_none()
    }

    /// Keep only the shipments matching every given criterion.
    #[must_use]
    pub fn apply(&self, shipments: Vec<ShipmentDetails>) -> Vec<ShipmentDetails> {
        let query = self.text_query();
        shipments
            .into_iter()
            .filter(|details| {
                self.status.is_none_or(|s| details.shipment.status == s)
                    && self.priority.is_none_or(|p| details.shipment.priority == p)
                    && details.matches(&query)
            })
            .collect()
    }
}

// =============================================================================
// Create Request
// =============================================================================

/// Where a draft came from. The HTML form has stricter rules than the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftSource {
    Api,
    Form,
}

const fn default_quantity() -> i32 {
    1
}

/// One requested medication line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentItemDraft {
    pub medication_id: Option<MedicationId>,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    #[serde(default)]
    pub instructions: Option<String>,
}

/// Request body for creating a shipment.
///
/// Destination fields default to the patient's address and the origin to the
/// pharmacy's when omitted.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShipmentDraft {
    pub patient_id: Option<PatientId>,
    pub status: Option<ShipmentStatus>,
    pub priority: Priority,
    pub shipping_method: ShippingMethod,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub from_address: Option<String>,
    pub to_address: Option<String>,
    pub to_city: Option<String>,
    pub to_state: Option<String>,
    pub to_zip_code: Option<String>,
    pub requires_signature: bool,
    pub temperature_monitoring: bool,
    pub insurance_value: Option<Decimal>,
    #[serde(alias = "deliveryDate")]
    pub requested_delivery_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub items: Vec<ShipmentItemDraft>,
}

/// The parts of a draft that validation guarantees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedDraft {
    pub patient_id: PatientId,
    pub items: Vec<NewShipmentItem>,
    pub insurance_value: Option<Money>,
}

/// Largest value the `NUMERIC(10, 2)` insurance column holds.
const MAX_INSURANCE_VALUE: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2); // 99_999_999.99

impl ShipmentDraft {
    /// Collect every field error in the draft.
    ///
    /// `today` is the date delivery requests are compared against.
    ///
    /// # Errors
    ///
    /// Returns the field errors keyed by JSON field name.
    pub fn validate(
        &self,
        today: NaiveDate,
        source: DraftSource,
    ) -> Result<CheckedDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.patient_id.is_none() {
            errors.add("patientId", "Please select a patient");
        }

        let mut items = Vec::with_capacity(self.items.len());
        if self.items.is_empty() {
            errors.add("items", "Please select a medication");
        }
        for item in &self.items {
            match item.medication_id {
                None => errors.add("items", "Please select a medication"),
                Some(_) if item.quantity < 1 => errors.add("items", "Quantity must be at least 1"),
                Some(medication_id) => items.push(NewShipmentItem {
                    medication_id,
                    quantity: item.quantity,
                    instructions: non_blank(item.instructions.as_deref()),
                }),
            }
        }

        match self.requested_delivery_date {
            None if source == DraftSource::Form => {
                errors.add("deliveryDate", "Please select a delivery date");
            }
            Some(date) if date < today => {
                errors.add("deliveryDate", "Delivery date cannot be in the past");
            }
            _ => {}
        }

        let insurance_value = self.insurance_value.map(Money::new);
        match insurance_value {
            Some(value) if value.is_negative() => {
                errors.add("insuranceValue", "Insurance value cannot be negative");
            }
            Some(value) if value.amount() > MAX_INSURANCE_VALUE => {
                errors.add("insuranceValue", "Insurance value is too large");
            }
            _ => {}
        }

        match self.patient_id {
            Some(patient_id) if errors.is_empty() => Ok(CheckedDraft {
                patient_id,
                items,
                insurance_value,
            }),
            _ => Err(errors),
        }
    }

    /// The priced options as requested, before cold-chain enforcement.
    #[must_use]
    pub const fn shipping_options(&self) -> ShippingOptions {
        ShippingOptions {
            shipping_method: self.shipping_method,
            priority: self.priority,
            temperature_monitoring: self.temperature_monitoring,
            requires_signature: self.requires_signature,
        }
    }
}

/// A validated line item ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShipmentItem {
    pub medication_id: MedicationId,
    pub quantity: i32,
    pub instructions: Option<String>,
}

/// A fully resolved shipment ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewShipmentRecord {
    pub shipment_number: String,
    pub status: ShipmentStatus,
    pub priority: Priority,
    pub shipping_method: ShippingMethod,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub from_address: String,
    pub from_coordinates: Option<Coordinates>,
    pub to_address: String,
    pub to_city: String,
    pub to_state: String,
    pub to_zip_code: String,
    pub to_coordinates: Option<Coordinates>,
    pub requires_signature: bool,
    pub temperature_monitoring: bool,
    pub estimated_cost: Money,
    pub insurance_value: Option<Money>,
    pub requested_delivery_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub patient_id: PatientId,
    pub created_by_id: UserId,
    pub items: Vec<NewShipmentItem>,
}

/// Format a shipment number from a creation timestamp.
#[must_use]
pub fn shipment_number(at: DateTime<Utc>) -> String {
    format!("SH{}", at.timestamp_millis())
}

// =============================================================================
// Updates
// =============================================================================

/// Request body for moving a shipment to a new status.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub status: ShipmentStatus,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl StatusChange {
    /// The event text to record, falling back to the status default.
    #[must_use]
    pub fn event_description(&self) -> String {
        non_blank(self.description.as_deref())
            .unwrap_or_else(|| self.status.event_description().to_owned())
    }
}

/// Request body for adding a task.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

impl NewTask {
    /// The trimmed title.
    ///
    /// # Errors
    ///
    /// Returns a `title` error when the title is blank.
    pub fn validate(&self) -> Result<String, ValidationErrors> {
        non_blank(Some(&self.title)).ok_or_else(|| ValidationErrors::single("title", "Title is required"))
    }
}
