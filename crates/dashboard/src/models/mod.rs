//! Domain models for the dashboard.
//!
//! These are the validated shapes handlers and repositories exchange. Request
//! bodies (`New*`, `*Draft`) are checked into records before they reach the
//! database.

pub mod medication;
pub mod patient;
pub mod session;
pub mod shipment;
pub mod user;
pub mod validation;

pub use medication::{Medication, MedicationRecord, NewMedication};
pub use patient::{NewPatient, Patient, PatientRecord};
pub use session::{CurrentUser, keys as session_keys};
pub use shipment::{
    CheckedDraft, DraftSource, NewShipmentItem, NewShipmentRecord, NewTask, Shipment,
    ShipmentDetails, ShipmentDraft, ShipmentFilter, ShipmentItem, ShipmentItemDetails,
    ShipmentItemDraft, ShipmentTask, StatusChange, TrackingEvent, UserSummary,
};
pub use user::User;
pub use validation::ValidationErrors;
