//! View models shared by the HTML pages.
//!
//! Templates only see preformatted strings and flags; all formatting happens
//! in the `From` conversions here.

use chrono::{DateTime, NaiveDate, Utc};

use pharmship_core::{Priority, ShipmentStatus, ShippingMethod, TemperatureRequirement};

use crate::models::{CurrentUser, Medication, Patient, ShipmentDetails, ShipmentTask, TrackingEvent};

// =============================================================================
// Layout
// =============================================================================

/// Logged-in user as shown in the header.
#[derive(Debug, Clone)]
pub struct UserView {
    pub name: String,
    pub email: String,
    pub role: String,
    pub can_manage_catalog: bool,
}

impl From<&CurrentUser> for UserView {
    fn from(user: &CurrentUser) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.to_string(),
            role: user.role.label().to_string(),
            can_manage_catalog: user.role.can_manage_catalog(),
        }
    }
}

/// A sidebar link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavItem {
    pub href: &'static str,
    pub label: &'static str,
    pub active: bool,
}

const NAV: &[(&str, &str)] = &[
    ("/dashboard", "Overview"),
    ("/dashboard/shipments", "Shipments"),
    ("/dashboard/patients", "Patients"),
    ("/dashboard/medications", "Medications"),
    ("/dashboard/tracking", "Tracking"),
];

/// Data every page's base layout needs.
#[derive(Debug, Clone)]
pub struct Layout {
    pub user: Option<UserView>,
    pub current_path: String,
}

impl Layout {
    #[must_use]
    pub fn new(user: Option<&CurrentUser>, current_path: impl Into<String>) -> Self {
        Self {
            user: user.map(UserView::from),
            current_path: current_path.into(),
        }
    }

    /// Sidebar links with the current section marked active.
    #[must_use]
    pub fn nav(&self) -> Vec<NavItem> {
        NAV.iter()
            .map(|&(href, label)| NavItem {
                href,
                label,
                active: self.current_path == href
                    || (href != "/dashboard" && self.current_path.starts_with(href)),
            })
            .collect()
    }
}

/// An `<option>` in a `<select>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl SelectOption {
    #[must_use]
    pub fn new(value: impl Into<String>, label: impl Into<String>, selected: bool) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            selected,
        }
    }
}

/// Options for a status filter, with an "any" entry first.
#[must_use]
pub fn status_options(selected: Option<ShipmentStatus>) -> Vec<SelectOption> {
    std::iter::once(SelectOption::new("", "All statuses", selected.is_none()))
        .chain(ShipmentStatus::ALL.iter().map(|status| {
            SelectOption::new(status.as_str(), status.label(), selected == Some(*status))
        }))
        .collect()
}

/// Options for a priority filter, with an "any" entry first.
#[must_use]
pub fn priority_options(selected: Option<Priority>) -> Vec<SelectOption> {
    std::iter::once(SelectOption::new("", "All priorities", selected.is_none()))
        .chain(Priority::ALL.iter().map(|priority| {
            SelectOption::new(
                priority.as_str(),
                priority.label(),
                selected == Some(*priority),
            )
        }))
        .collect()
}

/// Shipping method choices with their list prices and windows.
#[must_use]
pub fn method_options(selected: ShippingMethod) -> Vec<SelectOption> {
    ShippingMethod::ALL
        .iter()
        .map(|method| {
            SelectOption::new(
                method.as_str(),
                format!(
                    "{} ({}, {})",
                    method.label(),
                    method.list_price(),
                    method.delivery_window()
                ),
                *method == selected,
            )
        })
        .collect()
}

/// Priority choices without an "any" entry.
#[must_use]
pub fn priority_choices(selected: Priority) -> Vec<SelectOption> {
    Priority::ALL
        .iter()
        .map(|priority| SelectOption::new(priority.as_str(), priority.label(), *priority == selected))
        .collect()
}

// =============================================================================
// Formatting
// =============================================================================

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

pub(crate) fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%b %-d, %Y %H:%M UTC").to_string()
}

fn or_dash(value: Option<&str>) -> String {
    value.map_or_else(|| "-".to_string(), str::to_owned)
}

// =============================================================================
// Shipments
// =============================================================================

/// A row in the shipment list.
#[derive(Debug, Clone)]
pub struct ShipmentRowView {
    pub id: i32,
    pub number: String,
    pub patient: String,
    pub medications: String,
    pub destination: String,
    pub status: ShipmentStatus,
    pub status_label: &'static str,
    pub priority: Priority,
    pub priority_label: &'static str,
    pub method: &'static str,
    pub cost: String,
    pub created: String,
    pub progress: u8,
    pub cold_chain: bool,
}

impl From<&ShipmentDetails> for ShipmentRowView {
    fn from(details: &ShipmentDetails) -> Self {
        let shipment = &details.shipment;
        Self {
            id: shipment.id.as_i32(),
            number: shipment.shipment_number.clone(),
            patient: details.patient.full_name(),
            medications: details.medication_names().join(", "),
            destination: shipment.destination_city_state(),
            status: shipment.status,
            status_label: shipment.status.label(),
            priority: shipment.priority,
            priority_label: shipment.priority.label(),
            method: shipment.shipping_method.label(),
            cost: shipment.estimated_cost.to_string(),
            created: format_timestamp(shipment.created_at),
            progress: shipment.status.progress_percent(),
            cold_chain: shipment.temperature_monitoring,
        }
    }
}

/// A medication line on the detail page.
#[derive(Debug, Clone)]
pub struct ItemView {
    pub medication: String,
    pub quantity: i32,
    pub instructions: String,
    pub temperature: String,
    pub cold_chain: bool,
    pub controlled: bool,
}

/// A tracking history entry.
#[derive(Debug, Clone)]
pub struct EventView {
    pub status: ShipmentStatus,
    pub status_label: &'static str,
    pub description: String,
    pub location: String,
    pub occurred: String,
}

impl From<&TrackingEvent> for EventView {
    fn from(event: &TrackingEvent) -> Self {
        Self {
            status: event.status,
            status_label: event.status.label(),
            description: event.description.clone(),
            location: or_dash(event.location.as_deref()),
            occurred: format_timestamp(event.occurred_at),
        }
    }
}

/// A checklist task.
#[derive(Debug, Clone)]
pub struct TaskView {
    pub id: i32,
    pub title: String,
    pub completed: bool,
    pub due: String,
}

impl From<&ShipmentTask> for TaskView {
    fn from(task: &ShipmentTask) -> Self {
        Self {
            id: task.id.as_i32(),
            title: task.title.clone(),
            completed: task.completed,
            due: task.due_date.map_or_else(|| "-".to_string(), format_date),
        }
    }
}

/// Everything the shipment detail page shows.
#[derive(Debug, Clone)]
pub struct ShipmentDetailView {
    pub row: ShipmentRowView,
    pub carrier: String,
    pub tracking_number: String,
    pub from_address: String,
    pub to_address: String,
    pub patient_email: String,
    pub patient_phone: String,
    pub requires_signature: bool,
    pub insurance_value: String,
    pub requested_delivery: String,
    pub shipped_at: String,
    pub delivered_at: String,
    pub notes: String,
    pub created_by: String,
    pub items: Vec<ItemView>,
    pub events: Vec<EventView>,
    pub tasks: Vec<TaskView>,
    /// Statuses the shipment may move to next.
    pub next_statuses: Vec<SelectOption>,
}

impl From<&ShipmentDetails> for ShipmentDetailView {
    fn from(details: &ShipmentDetails) -> Self {
        let shipment = &details.shipment;
        Self {
            row: ShipmentRowView::from(details),
            carrier: or_dash(shipment.carrier.as_deref()),
            tracking_number: or_dash(shipment.tracking_number.as_deref()),
            from_address: shipment.from_address.clone(),
            to_address: format!(
                "{}, {}, {} {}",
                shipment.to_address, shipment.to_city, shipment.to_state, shipment.to_zip_code
            ),
            patient_email: details
                .patient
                .email
                .as_ref()
                .map_or_else(|| "-".to_string(), ToString::to_string),
            patient_phone: or_dash(details.patient.phone.as_deref()),
            requires_signature: shipment.requires_signature,
            insurance_value: shipment
                .insurance_value
                .map_or_else(|| "-".to_string(), |value| value.to_string()),
            requested_delivery: shipment
                .requested_delivery_date
                .map_or_else(|| "-".to_string(), format_date),
            shipped_at: shipment
                .shipped_at
                .map_or_else(|| "-".to_string(), format_timestamp),
            delivered_at: shipment
                .delivered_at
                .map_or_else(|| "-".to_string(), format_timestamp),
            notes: shipment.notes.clone().unwrap_or_default(),
            created_by: details.created_by.name.clone(),
            items: details
                .items
                .iter()
                .map(|line| ItemView {
                    medication: line.medication.display_name(),
                    quantity: line.item.quantity,
                    instructions: or_dash(line.item.instructions.as_deref()),
                    temperature: line.medication.temperature_band().to_string(),
                    cold_chain: line.medication.requires_cold_chain(),
                    controlled: line.medication.controlled,
                })
                .collect(),
            events: details.tracking_events.iter().map(EventView::from).collect(),
            tasks: details.tasks.iter().map(TaskView::from).collect(),
            next_statuses: shipment
                .status
                .next_statuses()
                .into_iter()
                .map(|status| SelectOption::new(status.as_str(), status.label(), false))
                .collect(),
        }
    }
}

// =============================================================================
// Patients & Medications
// =============================================================================

/// A patient card.
#[derive(Debug, Clone)]
pub struct PatientView {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: String,
    pub address: String,
    pub geocoded: bool,
}

impl From<&Patient> for PatientView {
    fn from(patient: &Patient) -> Self {
        Self {
            id: patient.id.as_i32(),
            name: patient.full_name(),
            email: patient
                .email
                .as_ref()
                .map_or_else(|| "-".to_string(), ToString::to_string),
            phone: or_dash(patient.phone.as_deref()),
            date_of_birth: patient.date_of_birth.map_or_else(|| "-".to_string(), format_date),
            address: patient.full_address(),
            geocoded: patient.coordinates().is_some(),
        }
    }
}

/// A medication card.
#[derive(Debug, Clone)]
pub struct MedicationView {
    pub id: i32,
    pub name: String,
    pub form: String,
    pub manufacturer: String,
    pub ndc: String,
    pub temperature: TemperatureRequirement,
    pub temperature_label: &'static str,
    pub temperature_band: String,
    pub cold_chain: bool,
    pub controlled: bool,
}

impl From<&Medication> for MedicationView {
    fn from(medication: &Medication) -> Self {
        Self {
            id: medication.id.as_i32(),
            name: medication.display_name(),
            form: or_dash(medication.form.as_deref()),
            manufacturer: or_dash(medication.manufacturer.as_deref()),
            ndc: or_dash(medication.ndc.as_deref()),
            temperature: medication.temperature,
            temperature_label: medication.temperature.label(),
            temperature_band: medication.temperature_band().to_string(),
            cold_chain: medication.requires_cold_chain(),
            controlled: medication.controlled,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pharmship_core::{Email, UserId, UserRole};

    use super::*;

    fn technician() -> CurrentUser {
        CurrentUser {
            id: UserId::new(2),
            email: Email::parse("tech@pharmacy.com").unwrap(),
            name: "Tina Tech".to_string(),
            role: UserRole::Technician,
        }
    }

    #[test]
    fn test_nav_marks_current_section() {
        let layout = Layout::new(Some(&technician()), "/dashboard/shipments/12");
        let active: Vec<_> = layout.nav().into_iter().filter(|n| n.active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].href, "/dashboard/shipments");

        let overview = Layout::new(None, "/dashboard");
        let active: Vec<_> = overview.nav().into_iter().filter(|n| n.active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].label, "Overview");
    }

    #[test]
    fn test_user_view() {
        let view = UserView::from(&technician());
        assert_eq!(view.role, "Technician");
        assert!(!view.can_manage_catalog);
    }

    #[test]
    fn test_status_options_have_any_entry() {
        let options = status_options(Some(ShipmentStatus::Shipped));
        assert_eq!(options.len(), ShipmentStatus::ALL.len() + 1);
        assert_eq!(options[0].value, "");
        assert!(!options[0].selected);
        assert!(options.iter().any(|o| o.value == "shipped" && o.selected));
    }

    #[test]
    fn test_method_options_show_prices() {
        let options = method_options(ShippingMethod::Express);
        let express = options.iter().find(|o| o.selected).unwrap();
        assert_eq!(express.value, "express");
        assert_eq!(express.label, "Express ($25.99, 2-3 days)");
    }

    #[test]
    fn test_date_formatting() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
        assert_eq!(format_date(date), "Mar 5, 2026");
    }
}
