//! End-to-end flows against a migrated `PostgreSQL` database.
//!
//! These tests require `PHARMSHIP_TEST_DATABASE_URL` to point at a database
//! the tests may migrate and write to.
//!
//! Run with: `cargo test -p pharmship-integration-tests -- --ignored`

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

use pharmship_core::{TemperatureRequirement, UserRole};
use pharmship_dashboard::db::{MedicationRepository, PatientRepository};
use pharmship_dashboard::models::{NewMedication, NewPatient};
use pharmship_dashboard::services::AuthService;
use pharmship_integration_tests::{
    body_json, body_text, database_app, get, location, post_form, post_json, send, session_cookie,
};

const PASSWORD: &str = "integration-pass-1";

/// Register a uniquely-named staff user and return their email.
async fn create_user(pool: &PgPool, role: UserRole) -> String {
    let email = format!("staff-{}@pharmacy.test", Uuid::new_v4().simple());
    AuthService::new(pool)
        .register_user(&email, "Test Staff", PASSWORD, role)
        .await
        .expect("Failed to create test user");
    email
}

/// Log in through the form and return the session cookie.
async fn login(app: &axum::Router, email: &str) -> String {
    let body = format!("email={}&password={PASSWORD}", email.replace('@', "%40"));
    let response = send(app, post_form("/login", &body, None)).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/dashboard"));
    session_cookie(&response).expect("login sets a session cookie")
}

async fn create_patient(pool: &PgPool) -> i64 {
    let record = NewPatient {
        first_name: "Test".to_owned(),
        last_name: "Patient".to_owned(),
        email: Some(format!("patient-{}@example.com", Uuid::new_v4().simple())),
        address: "1 Test Way".to_owned(),
        city: "Springfield".to_owned(),
        state: "il".to_owned(),
        zip_code: "62701".to_owned(),
        latitude: Some(39.80),
        longitude: Some(-89.64),
        ..NewPatient::default()
    }
    .validate()
    .unwrap();

    let patient = PatientRepository::new(pool).create(&record).await.unwrap();
    i64::from(patient.id.as_i32())
}

async fn create_medication(pool: &PgPool, temperature: TemperatureRequirement) -> i64 {
    let record = NewMedication {
        name: format!("Test Medication {}", Uuid::new_v4().simple()),
        strength: Some("10mg".to_owned()),
        temperature,
        ..NewMedication::default()
    }
    .validate()
    .unwrap();

    let medication = MedicationRepository::new(pool).create(&record).await.unwrap();
    i64::from(medication.id.as_i32())
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_wrong_password_is_rejected() {
    let (app, pool) = database_app().await;
    let email = create_user(&pool, UserRole::Technician).await;

    let body = format!("email={}&password=not-the-password", email.replace('@', "%40"));
    let response = send(&app, post_form("/login", &body, None)).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login?error=credentials"));
    assert!(session_cookie(&response).is_none());
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_login_opens_dashboard_and_logout_closes_it() {
    let (app, pool) = database_app().await;
    let email = create_user(&pool, UserRole::Pharmacist).await;
    let cookie = login(&app, &email).await;

    let response = send(&app, get("/dashboard", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Test Staff"));

    let response = send(&app, post_form("/logout", "", Some(&cookie))).await;
    assert_eq!(location(&response), Some("/login?success=logged_out"));

    let response = send(&app, get("/dashboard", Some(&cookie))).await;
    assert_eq!(location(&response), Some("/login"));
}

// =============================================================================
// Shipments API
// =============================================================================

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_estimate_turns_on_monitoring_for_cold_chain() {
    let (app, pool) = database_app().await;
    let cookie = login(&app, &create_user(&pool, UserRole::Technician).await).await;
    let insulin = create_medication(&pool, TemperatureRequirement::Refrigerated).await;

    let request = post_json(
        "/api/shipments/estimate",
        &json!({
            "shippingMethod": "express",
            "priority": "critical",
            "medicationIds": [insulin],
        }),
        Some(&cookie),
    );
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let estimate = body_json(response).await;
    // 15.99 + 25 + 15 + 12
    assert_eq!(estimate["total"], "67.99");
    assert_eq!(estimate["options"]["temperatureMonitoring"], true);
    assert_eq!(estimate["deliveryWindow"], "2-3 days");
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_estimate_rejects_unknown_medication() {
    let (app, pool) = database_app().await;
    let cookie = login(&app, &create_user(&pool, UserRole::Technician).await).await;

    let request = post_json(
        "/api/shipments/estimate",
        &json!({ "medicationIds": [i32::MAX] }),
        Some(&cookie),
    );
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["fields"]["items"], "Medication not found");
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_shipment_lifecycle() {
    let (app, pool) = database_app().await;
    let cookie = login(&app, &create_user(&pool, UserRole::Technician).await).await;
    let patient = create_patient(&pool).await;
    let medication = create_medication(&pool, TemperatureRequirement::Refrigerated).await;

    // Create
    let request = post_json(
        "/api/shipments",
        &json!({
            "patientId": patient,
            "items": [{ "medicationId": medication, "quantity": 2 }],
        }),
        Some(&cookie),
    );
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let shipment: Value = body_json(response).await;
    let id = shipment["id"].as_i64().unwrap();
    assert_eq!(shipment["status"], "pending");
    assert_eq!(shipment["temperatureMonitoring"], true);
    assert_eq!(shipment["estimatedCost"], "27.99");
    assert_eq!(shipment["toCity"], "Springfield");
    assert_eq!(shipment["items"][0]["quantity"], 2);
    assert_eq!(shipment["trackingEvents"].as_array().unwrap().len(), 1);

    // Pending cannot jump straight to delivered
    let request = post_json(
        &format!("/api/shipments/{id}/status"),
        &json!({ "status": "delivered" }),
        Some(&cookie),
    );
    assert_eq!(send(&app, request).await.status(), StatusCode::CONFLICT);

    // Legacy uppercase spelling is accepted
    let request = post_json(
        &format!("/api/shipments/{id}/status"),
        &json!({ "status": "PREPARING", "location": "Central Pharmacy" }),
        Some(&cookie),
    );
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let shipment = body_json(response).await;
    assert_eq!(shipment["status"], "preparing");
    assert_eq!(shipment["trackingEvents"][0]["location"], "Central Pharmacy");

    // Checklist
    let request = post_json(
        &format!("/api/shipments/{id}/tasks"),
        &json!({ "title": "Pack with ice packs" }),
        Some(&cookie),
    );
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let task = body_json(response).await;
    assert_eq!(task["completed"], false);

    let task_id = task["id"].as_i64().unwrap();
    let request = post_json(
        &format!("/api/shipments/{id}/tasks/{task_id}/complete"),
        &json!({}),
        Some(&cookie),
    );
    let task = body_json(send(&app, request).await).await;
    assert_eq!(task["completed"], true);

    // Detail page renders
    let response = send(&app, get(&format!("/dashboard/shipments/{id}"), Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Pack with ice packs"));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_create_shipment_requires_patient_and_items() {
    let (app, pool) = database_app().await;
    let cookie = login(&app, &create_user(&pool, UserRole::Technician).await).await;

    let response = send(&app, post_json("/api/shipments", &json!({}), Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Validation failed");
    assert!(body["fields"]["patientId"].is_string());
    assert!(body["fields"]["items"].is_string());
}

// =============================================================================
// Catalog Permissions
// =============================================================================

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_only_catalog_managers_add_medications() {
    let (app, pool) = database_app().await;
    let medication = json!({
        "name": format!("Catalog Test {}", Uuid::new_v4().simple()),
        "temperature": "frozen",
    });

    let technician = login(&app, &create_user(&pool, UserRole::Technician).await).await;
    let response = send(&app, post_json("/api/medications", &medication, Some(&technician))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let pharmacist = login(&app, &create_user(&pool, UserRole::Pharmacist).await).await;
    let response = send(&app, post_json("/api/medications", &medication, Some(&pharmacist))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["temperature"], "frozen");
}
