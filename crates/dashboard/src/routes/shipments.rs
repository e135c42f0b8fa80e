//! Shipment pages.
//!
//! The create form posts one medication line; the JSON API accepts several.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{
        Path, Query, State,
        rejection::{FormRejection, PathRejection, QueryRejection},
    },
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use pharmship_core::{
    MedicationId, PatientId, Priority, ShipmentId, ShipmentStatus, ShipmentTaskId, ShippingMethod,
    pricing,
};

use crate::db::{MedicationRepository, PatientRepository, RepositoryError};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::validation::non_blank;
use crate::models::{
    CurrentUser, DraftSource, NewTask, ShipmentDraft, ShipmentFilter, ShipmentItemDraft,
    StatusChange, ValidationErrors,
};
use crate::routes::views::{
    Layout, SelectOption, ShipmentDetailView, ShipmentRowView, method_options, priority_choices,
    priority_options, status_options,
};
use crate::services::{ServiceError, ShipmentService};
use crate::state::AppState;

/// Build the shipment pages router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard/shipments", get(index))
        .route("/dashboard/shipments/new", get(new_form).post(create))
        .route("/dashboard/shipments/{id}", get(show))
        .route("/dashboard/shipments/{id}/status", post(change_status))
        .route("/dashboard/shipments/{id}/tasks", post(add_task))
        .route(
            "/dashboard/shipments/{id}/tasks/{task_id}/complete",
            post(complete_task),
        )
}

fn service(state: &AppState) -> ShipmentService<'_> {
    ShipmentService::new(state.pool(), &state.config().pharmacy)
}

// =============================================================================
// List
// =============================================================================

/// Shipment list template.
#[derive(Template, WebTemplate)]
#[template(path = "shipments/index.html")]
pub struct ShipmentsTemplate {
    pub layout: Layout,
    pub q: String,
    pub statuses: Vec<SelectOption>,
    pub priorities: Vec<SelectOption>,
    pub filtered: bool,
    pub shipments: Vec<ShipmentRowView>,
}

/// GET /dashboard/shipments?q=&status=&priority=
///
/// Unparseable filters are ignored rather than rejected.
#[instrument(skip(state, user, filter), fields(user_id = %user.id))]
async fn index(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    filter: Result<Query<ShipmentFilter>, QueryRejection>,
) -> Result<ShipmentsTemplate, AppError> {
    let filter = filter.map(|Query(filter)| filter).unwrap_or_default();
    let shipments = service(&state).list(&filter).await?;

    Ok(ShipmentsTemplate {
        layout: Layout::new(Some(&user), "/dashboard/shipments"),
        q: filter.q.clone().unwrap_or_default(),
        statuses: status_options(filter.status),
        priorities: priority_options(filter.priority),
        filtered: !filter.is_empty(),
        shipments: shipments.iter().map(ShipmentRowView::from).collect(),
    })
}

// =============================================================================
// Create
// =============================================================================

/// New shipment form as posted. Every field arrives as text.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShipmentForm {
    pub patient_id: String,
    pub medication_id: String,
    pub quantity: String,
    pub instructions: String,
    pub shipping_method: String,
    pub priority: String,
    pub requires_signature: Option<String>,
    pub temperature_monitoring: Option<String>,
    pub insurance_value: String,
    pub delivery_date: String,
    pub to_address: String,
    pub to_city: String,
    pub to_state: String,
    pub to_zip_code: String,
    pub carrier: String,
    pub notes: String,
}

impl ShipmentForm {
    fn blank() -> Self {
        Self {
            quantity: "1".to_string(),
            ..Self::default()
        }
    }

    /// Convert the posted text into a draft.
    ///
    /// Fields that do not parse are reported and left empty in the draft so
    /// draft validation can still report everything else.
    fn to_draft(&self) -> (ShipmentDraft, ValidationErrors) {
        let mut errors = ValidationErrors::new();

        let patient_id = parse_field(
            &self.patient_id,
            "patientId",
            "Please select a patient",
            &mut errors,
        )
        .map(PatientId::new);
        let medication_id = parse_field(
            &self.medication_id,
            "items",
            "Please select a medication",
            &mut errors,
        )
        .map(MedicationId::new);
        let quantity = parse_field::<i32>(
            &self.quantity,
            "items",
            "Quantity must be at least 1",
            &mut errors,
        )
        .unwrap_or(1);
        let shipping_method = parse_field::<ShippingMethod>(
            &self.shipping_method,
            "shippingMethod",
            "Unknown shipping method",
            &mut errors,
        )
        .unwrap_or_default();
        let priority =
            parse_field::<Priority>(&self.priority, "priority", "Unknown priority", &mut errors)
                .unwrap_or_default();
        let insurance_value = parse_field::<Decimal>(
            &self.insurance_value,
            "insuranceValue",
            "Insurance value must be a number",
            &mut errors,
        );
        let requested_delivery_date = parse_field::<NaiveDate>(
            &self.delivery_date,
            "deliveryDate",
            "Please select a delivery date",
            &mut errors,
        );

        let draft = ShipmentDraft {
            patient_id,
            priority,
            shipping_method,
            carrier: non_blank(Some(&self.carrier)),
            to_address: non_blank(Some(&self.to_address)),
            to_city: non_blank(Some(&self.to_city)),
            to_state: non_blank(Some(&self.to_state)),
            to_zip_code: non_blank(Some(&self.to_zip_code)),
            requires_signature: self.requires_signature.is_some(),
            temperature_monitoring: self.temperature_monitoring.is_some(),
            insurance_value,
            requested_delivery_date,
            notes: non_blank(Some(&self.notes)),
            items: vec![ShipmentItemDraft {
                medication_id,
                quantity,
                instructions: non_blank(Some(&self.instructions)),
            }],
            ..ShipmentDraft::default()
        };

        (draft, errors)
    }
}

/// Parse a trimmed text field. Blank is `None`; garbage records `message`.
fn parse_field<T: std::str::FromStr>(
    raw: &str,
    field: &'static str,
    message: &str,
    errors: &mut ValidationErrors,
) -> Option<T> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse().map_or_else(
        |_| {
            errors.add(field, message);
            None
        },
        Some,
    )
}

/// New shipment form template.
#[derive(Template, WebTemplate)]
#[template(path = "shipments/new.html")]
pub struct NewShipmentTemplate {
    pub layout: Layout,
    pub patients: Vec<SelectOption>,
    pub medications: Vec<SelectOption>,
    pub methods: Vec<SelectOption>,
    pub priorities: Vec<SelectOption>,
    pub form: ShipmentForm,
    /// Earliest selectable delivery date, `YYYY-MM-DD`.
    pub min_date: String,
    pub monitoring_fee: String,
    pub signature_fee: String,
    pub errors: ValidationErrors,
}

impl NewShipmentTemplate {
    /// Load the pick lists and render `form` with `errors`.
    async fn load(
        state: &AppState,
        user: &CurrentUser,
        form: ShipmentForm,
        errors: ValidationErrors,
    ) -> Result<Self, AppError> {
        let patients = PatientRepository::new(state.pool()).list_all().await?;
        let medications = MedicationRepository::new(state.pool()).list_all().await?;

        let patients = std::iter::once(SelectOption::new("", "Select a patient", false))
            .chain(patients.iter().map(|patient| {
                let value = patient.id.to_string();
                let selected = value == form.patient_id.trim();
                SelectOption::new(
                    value,
                    format!("{} ({})", patient.full_name(), patient.city_state()),
                    selected,
                )
            }))
            .collect();
        let medications = std::iter::once(SelectOption::new("", "Select a medication", false))
            .chain(medications.iter().map(|medication| {
                let value = medication.id.to_string();
                let selected = value == form.medication_id.trim();
                let label = if medication.requires_cold_chain() {
                    format!("{} [cold chain]", medication.display_name())
                } else {
                    medication.display_name()
                };
                SelectOption::new(value, label, selected)
            }))
            .collect();

        let method = form.shipping_method.trim().parse().unwrap_or_default();
        let priority = form.priority.trim().parse().unwrap_or_default();

        Ok(Self {
            layout: Layout::new(Some(user), "/dashboard/shipments/new"),
            patients,
            medications,
            methods: method_options(method),
            priorities: priority_choices(priority),
            form,
            min_date: Utc::now().date_naive().format("%Y-%m-%d").to_string(),
            monitoring_fee: pricing::temperature_monitoring_fee().to_string(),
            signature_fee: pricing::signature_fee().to_string(),
            errors,
        })
    }
}

/// GET /dashboard/shipments/new
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn new_form(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<NewShipmentTemplate, AppError> {
    NewShipmentTemplate::load(&state, &user, ShipmentForm::blank(), ValidationErrors::new()).await
}

/// POST /dashboard/shipments/new
///
/// Redirects to the new shipment on success, re-renders the form with
/// messages otherwise.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
async fn create(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Form(form): Form<ShipmentForm>,
) -> Result<Response, AppError> {
    let (draft, mut errors) = form.to_draft();

    if !errors.is_empty() {
        if let Err(more) = draft.validate(Utc::now().date_naive(), DraftSource::Form) {
            for (field, message) in more.iter() {
                errors.add(field, message);
            }
        }
        return Ok(NewShipmentTemplate::load(&state, &user, form, errors)
            .await?
            .into_response());
    }

    match service(&state)
        .create(&draft, user.id, DraftSource::Form)
        .await
    {
        Ok(details) => Ok(Redirect::to(&detail_path(details.shipment.id)).into_response()),
        Err(ServiceError::Validation(errors)) => {
            Ok(NewShipmentTemplate::load(&state, &user, form, errors)
                .await?
                .into_response())
        }
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Detail
// =============================================================================

/// Shipment detail template.
#[derive(Template, WebTemplate)]
#[template(path = "shipments/show.html")]
pub struct ShipmentTemplate {
    pub layout: Layout,
    pub shipment: ShipmentDetailView,
    pub error: Option<&'static str>,
}

/// Query parameters for detail page messages.
#[derive(Debug, Default, Deserialize)]
pub struct DetailQuery {
    pub error: Option<String>,
}

impl DetailQuery {
    fn message(&self) -> Option<&'static str> {
        self.error.as_deref().map(|code| match code {
            "transition" => "That status change is not allowed from the current status.",
            "task" => "Task title is required.",
            "task_due" => "Task due date is not a valid date.",
            _ => "Something went wrong. Please try again.",
        })
    }
}

/// GET /dashboard/shipments/{id}
#[instrument(skip(state, user, query), fields(user_id = %user.id))]
async fn show(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    id: Result<Path<ShipmentId>, PathRejection>,
    query: Result<Query<DetailQuery>, QueryRejection>,
) -> Result<ShipmentTemplate, AppError> {
    let Path(id) = id?;
    let query = query.map(|Query(query)| query).unwrap_or_default();
    let details = service(&state).get(id).await?;

    Ok(ShipmentTemplate {
        layout: Layout::new(Some(&user), "/dashboard/shipments"),
        shipment: ShipmentDetailView::from(&details),
        error: query.message(),
    })
}

/// Status change form as posted.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: ShipmentStatus,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

fn detail_path(id: ShipmentId) -> String {
    format!("/dashboard/shipments/{id}")
}

/// POST /dashboard/shipments/{id}/status
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
async fn change_status(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    id: Result<Path<ShipmentId>, PathRejection>,
    form: Result<Form<StatusForm>, FormRejection>,
) -> Result<Redirect, AppError> {
    let Path(id) = id?;
    let Ok(Form(form)) = form else {
        return Ok(Redirect::to(&format!("{}?error=transition", detail_path(id))));
    };
    let change = StatusChange {
        status: form.status,
        location: form.location,
        description: form.description,
    };

    match service(&state).change_status(id, &change).await {
        Ok(_) => Ok(Redirect::to(&detail_path(id))),
        Err(ServiceError::Repository(RepositoryError::Conflict(_))) => {
            Ok(Redirect::to(&format!("{}?error=transition", detail_path(id))))
        }
        Err(e) => Err(e.into()),
    }
}

/// Task form as posted.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TaskForm {
    pub title: String,
    pub due_date: String,
}

impl TaskForm {
    /// Convert the posted strings into a task, rejecting a malformed due date.
    fn to_task(&self) -> Result<NewTask, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let due_date = parse_field(
            &self.due_date,
            "dueDate",
            "Please enter a valid due date",
            &mut errors,
        );

        if errors.is_empty() {
            Ok(NewTask {
                title: self.title.clone(),
                due_date,
            })
        } else {
            Err(errors)
        }
    }
}

/// POST /dashboard/shipments/{id}/tasks
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
async fn add_task(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    id: Result<Path<ShipmentId>, PathRejection>,
    Form(form): Form<TaskForm>,
) -> Result<Redirect, AppError> {
    let Path(id) = id?;
    let Ok(task) = form.to_task() else {
        return Ok(Redirect::to(&format!("{}?error=task_due", detail_path(id))));
    };

    match service(&state).add_task(id, &task).await {
        Ok(_) => Ok(Redirect::to(&detail_path(id))),
        Err(ServiceError::Validation(_)) => {
            Ok(Redirect::to(&format!("{}?error=task", detail_path(id))))
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /dashboard/shipments/{id}/tasks/{task_id}/complete
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn complete_task(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    ids: Result<Path<(ShipmentId, ShipmentTaskId)>, PathRejection>,
) -> Result<Redirect, AppError> {
    let Path((id, task_id)) = ids?;
    service(&state).complete_task(id, task_id).await?;
    Ok(Redirect::to(&detail_path(id)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn filled() -> ShipmentForm {
        ShipmentForm {
            patient_id: "7".to_string(),
            medication_id: "3".to_string(),
            quantity: "2".to_string(),
            shipping_method: "overnight".to_string(),
            priority: "urgent".to_string(),
            requires_signature: Some("on".to_string()),
            insurance_value: "120.50".to_string(),
            delivery_date: "2026-03-12".to_string(),
            to_city: "  ".to_string(),
            ..ShipmentForm::default()
        }
    }

    #[test]
    fn test_form_to_draft() {
        let (draft, errors) = filled().to_draft();
        assert!(errors.is_empty());
        assert_eq!(draft.patient_id, Some(PatientId::new(7)));
        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.items[0].medication_id, Some(MedicationId::new(3)));
        assert_eq!(draft.items[0].quantity, 2);
        assert_eq!(draft.shipping_method, ShippingMethod::Overnight);
        assert_eq!(draft.priority, Priority::Urgent);
        assert!(draft.requires_signature);
        assert!(!draft.temperature_monitoring);
        assert_eq!(draft.insurance_value, Some(dec!(120.50)));
        assert_eq!(draft.to_city, None);
        assert_eq!(draft.status, None);
    }

    #[test]
    fn test_blank_form_fails_draft_validation() {
        let (draft, errors) = ShipmentForm::blank().to_draft();
        assert!(errors.is_empty());

        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let errors = draft.validate(today, DraftSource::Form).unwrap_err();
        assert_eq!(errors.get("patientId"), Some("Please select a patient"));
        assert_eq!(errors.get("items"), Some("Please select a medication"));
        assert_eq!(errors.get("deliveryDate"), Some("Please select a delivery date"));
    }

    #[test]
    fn test_garbage_fields_are_reported() {
        let form = ShipmentForm {
            quantity: "lots".to_string(),
            insurance_value: "a few dollars".to_string(),
            ..filled()
        };
        let (draft, errors) = form.to_draft();
        assert_eq!(errors.get("items"), Some("Quantity must be at least 1"));
        assert_eq!(errors.get("insuranceValue"), Some("Insurance value must be a number"));
        assert_eq!(draft.insurance_value, None);
    }

    #[tokio::test]
    async fn test_status_form_accepts_legacy_labels() {
        use axum::extract::FromRequest;

        let request = axum::http::Request::builder()
            .method("POST")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(axum::body::Body::from("status=SHIPPED&location=Chicago%2C+IL"))
            .unwrap();
        let Form(form) = Form::<StatusForm>::from_request(request, &()).await.unwrap();

        assert_eq!(form.status, ShipmentStatus::Shipped);
        assert_eq!(form.location.as_deref(), Some("Chicago, IL"));
    }

    #[test]
    fn test_task_form_rejects_malformed_due_date() {
        let form = TaskForm {
            title: "Pack with ice packs".to_string(),
            due_date: "next tuesday".to_string(),
        };
        let errors = form.to_task().unwrap_err();
        assert_eq!(errors.get("dueDate"), Some("Please enter a valid due date"));

        let form = TaskForm {
            due_date: " 2026-03-12 ".to_string(),
            ..form
        };
        let task = form.to_task().unwrap();
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2026, 3, 12));

        let form = TaskForm {
            due_date: String::new(),
            ..form
        };
        assert_eq!(form.to_task().unwrap().due_date, None);
    }

    #[test]
    fn test_detail_messages() {
        let query = DetailQuery {
            error: Some("transition".to_string()),
        };
        assert!(query.message().unwrap().contains("not allowed"));
        assert_eq!(DetailQuery::default().message(), None);
    }
}
