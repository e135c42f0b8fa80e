//! Seed the database with demo data.
//!
//! Safe to run repeatedly: the admin user and medications are matched by
//! email and NDC, and sample patients are only added to an empty table.

use pharmship_core::{Email, TemperatureRequirement, UserRole};
use pharmship_dashboard::db::{MedicationRepository, PatientRepository, UserRepository};
use pharmship_dashboard::models::{NewMedication, NewPatient};
use pharmship_dashboard::services::AuthService;
use sqlx::PgPool;
use tracing::info;

use super::{CommandError, connect};

/// Login created for the first administrator.
pub const ADMIN_EMAIL: &str = "admin@pharmacy.com";
const ADMIN_NAME: &str = "Pharmacy Administrator";

/// Totals printed after seeding.
#[derive(Debug, Default)]
struct SeedSummary {
    admin_created: bool,
    medications_inserted: usize,
    medications_skipped: usize,
    patients_inserted: usize,
}

/// Seed the admin user, medication catalog and sample patients.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn run(admin_password: Option<String>) -> Result<(), CommandError> {
    let pool = connect().await?;

    let summary = SeedSummary {
        admin_created: seed_admin(&pool, admin_password).await?,
        ..SeedSummary::default()
    };
    let summary = seed_medications(&pool, summary).await?;
    let summary = seed_patients(&pool, summary).await?;

    info!("Seeding complete!");
    info!("  Admin user created: {}", summary.admin_created);
    info!("  Medications inserted: {}", summary.medications_inserted);
    info!(
        "  Medications skipped (already exist): {}",
        summary.medications_skipped
    );
    info!("  Patients inserted: {}", summary.patients_inserted);

    Ok(())
}

async fn seed_admin(pool: &PgPool, password: Option<String>) -> Result<bool, CommandError> {
    let email =
        Email::parse(ADMIN_EMAIL).map_err(|_| CommandError::InvalidSeed(ADMIN_EMAIL.to_owned()))?;

    if UserRepository::new(pool).get_by_email(&email).await?.is_some() {
        info!("Admin user {ADMIN_EMAIL} already exists");
        return Ok(false);
    }

    let (password, generated) = match password {
        Some(password) => (password, false),
        None => (super::user::generate_password(), true),
    };

    AuthService::new(pool)
        .register_user(ADMIN_EMAIL, ADMIN_NAME, &password, UserRole::Admin)
        .await?;

    if generated {
        #[allow(clippy::print_stdout)]
        {
            println!("Generated password for {ADMIN_EMAIL}: {password}");
            println!("It will not be shown again.");
        }
    }

    Ok(true)
}

async fn seed_medications(
    pool: &PgPool,
    mut summary: SeedSummary,
) -> Result<SeedSummary, CommandError> {
    let repo = MedicationRepository::new(pool);

    for medication in sample_medications() {
        let record = medication
            .validate()
            .map_err(|_| CommandError::InvalidSeed(medication.name.clone()))?;

        if let Some(ndc) = &record.ndc
            && repo.get_by_ndc(ndc).await?.is_some()
        {
            summary.medications_skipped += 1;
            continue;
        }

        repo.create(&record).await?;
        summary.medications_inserted += 1;
    }

    Ok(summary)
}

async fn seed_patients(
    pool: &PgPool,
    mut summary: SeedSummary,
) -> Result<SeedSummary, CommandError> {
    let repo = PatientRepository::new(pool);

    if repo.count().await? > 0 {
        info!("Patients already present, skipping sample patients");
        return Ok(summary);
    }

    for patient in sample_patients() {
        let record = patient.validate().map_err(|_| {
            CommandError::InvalidSeed(format!("{} {}", patient.first_name, patient.last_name))
        })?;
        repo.create(&record).await?;
        summary.patients_inserted += 1;
    }

    Ok(summary)
}

fn medication(
    name: &str,
    strength: &str,
    form: &str,
    manufacturer: &str,
    ndc: &str,
    temperature: TemperatureRequirement,
) -> NewMedication {
    NewMedication {
        name: name.to_owned(),
        strength: Some(strength.to_owned()),
        form: Some(form.to_owned()),
        manufacturer: Some(manufacturer.to_owned()),
        ndc: Some(ndc.to_owned()),
        temperature,
        temperature_range: None,
        controlled: false,
    }
}

fn sample_medications() -> Vec<NewMedication> {
    use TemperatureRequirement::{Refrigerated, Room};

    vec![
        medication("Lisinopril", "10mg", "Tablet", "Lupin", "68180-513-01", Room),
        medication("Metformin", "500mg", "Tablet", "Teva", "00093-104-01", Room),
        medication(
            "Insulin Glargine",
            "100 units/mL",
            "Injection",
            "Sanofi",
            "0088-2220-33",
            Refrigerated,
        ),
        medication("Humira", "40mg/0.4mL", "Pen", "AbbVie", "0074-0554-02", Refrigerated),
        medication("Levothyroxine", "50mcg", "Tablet", "AbbVie", "0074-4341-90", Room),
        medication("Ozempic", "1mg", "Pen", "Novo Nordisk", "0169-4132-12", Refrigerated),
    ]
}

#[allow(clippy::too_many_arguments)]
fn patient(
    first_name: &str,
    last_name: &str,
    email: &str,
    phone: &str,
    address: &str,
    city: &str,
    zip_code: &str,
    (lat, lng): (f64, f64),
) -> NewPatient {
    NewPatient {
        first_name: first_name.to_owned(),
        last_name: last_name.to_owned(),
        email: Some(email.to_owned()),
        phone: Some(phone.to_owned()),
        date_of_birth: None,
        address: address.to_owned(),
        city: city.to_owned(),
        state: "IL".to_owned(),
        zip_code: zip_code.to_owned(),
        latitude: Some(lat),
        longitude: Some(lng),
    }
}

fn sample_patients() -> Vec<NewPatient> {
    vec![
        patient(
            "John",
            "Smith",
            "john.smith@example.com",
            "(217) 555-0101",
            "742 Evergreen Ter",
            "Springfield",
            "62704",
            (39.7817, -89.6501),
        ),
        patient(
            "Maria",
            "Garcia",
            "maria.garcia@example.com",
            "(217) 555-0144",
            "15 Lake Shore Dr",
            "Chatham",
            "62629",
            (39.6761, -89.7043),
        ),
        patient(
            "Robert",
            "Johnson",
            "robert.johnson@example.com",
            "(309) 555-0178",
            "400 Main St",
            "Peoria",
            "61602",
            (40.6936, -89.5890),
        ),
    ]
}
