//! Patient domain types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use pharmship_core::{Coordinates, Email, PatientId, TextQuery};

use super::validation::{ValidationErrors, non_blank};

/// A shipment recipient.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: PatientId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<Email>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// `"City, ST"` for compact displays.
    #[must_use]
    pub fn city_state(&self) -> String {
        format!("{}, {}", self.city, self.state)
    }

    /// Street, city, state and ZIP on one line.
    #[must_use]
    pub fn full_address(&self) -> String {
        format!(
            "{}, {}, {} {}",
            self.address, self.city, self.state, self.zip_code
        )
    }

    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.latitude, self.longitude)
    }

    /// Patient search matches on name or email.
    #[must_use]
    pub fn matches(&self, query: &TextQuery) -> bool {
        let name = self.full_name();
        let email = self.email.as_ref().map_or("", Email::as_str);
        query.matches([name.as_str(), email])
    }
}

/// Request body for registering a patient.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// A validated patient ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientRecord {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<Email>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub coordinates: Option<Coordinates>,
}

impl NewPatient {
    /// Check required fields and normalize the input.
    ///
    /// # Errors
    ///
    /// Returns every field that failed validation.
    pub fn validate(&self) -> Result<PatientRecord, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let mut required = |field: &'static str, value: &str, label: &str| {
            let value = value.trim();
            if value.is_empty() {
                errors.add(field, format!("{label} is required"));
            }
            value.to_owned()
        };

        let first_name = required("firstName", &self.first_name, "First name");
        let last_name = required("lastName", &self.last_name, "Last name");
        let address = required("address", &self.address, "Address");
        let city = required("city", &self.city, "City");
        let state = required("state", &self.state, "State");
        let zip_code = required("zipCode", &self.zip_code, "ZIP code");

        let email = match non_blank(self.email.as_deref()) {
            Some(raw) => match Email::parse(&raw) {
                Ok(email) => Some(email),
                Err(e) => {
                    errors.add("email", e.to_string());
                    None
                }
            },
            None => None,
        };

        let coordinates = match (self.latitude, self.longitude) {
            (None, None) => None,
            (Some(lat), Some(lng)) => match Coordinates::new(lat, lng) {
                Ok(coordinates) => Some(coordinates),
                Err(e) => {
                    errors.add("latitude", e.to_string());
                    None
                }
            },
            _ => {
                errors.add("latitude", "Latitude and longitude must be given together");
                None
            }
        };

        errors.into_result(PatientRecord {
            first_name,
            last_name,
            email,
            phone: non_blank(self.phone.as_deref()),
            date_of_birth: self.date_of_birth,
            address,
            city,
            state: state.to_uppercase(),
            zip_code,
            coordinates,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sarah() -> Patient {
        Patient {
            id: PatientId::new(1),
            first_name: "Sarah".to_string(),
            last_name: "Johnson".to_string(),
            email: Some(Email::parse("sarah.j@email.com").unwrap()),
            phone: Some("(555) 123-4567".to_string()),
            date_of_birth: None,
            address: "123 Main St".to_string(),
            city: "New York".to_string(),
            state: "NY".to_string(),
            zip_code: "10001".to_string(),
            latitude: Some(40.7128),
            longitude: Some(-74.0060),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_display_helpers() {
        let patient = sarah();
        assert_eq!(patient.full_name(), "Sarah Johnson");
        assert_eq!(patient.city_state(), "New York, NY");
        assert_eq!(patient.full_address(), "123 Main St, New York, NY 10001");
        assert!(patient.coordinates().is_some());
    }

    #[test]
    fn test_matches_name_or_email() {
        let patient = sarah();
        assert!(patient.matches(&TextQuery::new("johnson")));
        assert!(patient.matches(&TextQuery::new("SARAH.J@")));
        assert!(patient.matches(&TextQuery::new("")));
        assert!(!patient.matches(&TextQuery::new("chen")));
    }

    #[test]
    fn test_validate_reports_every_missing_field() {
        let errors = NewPatient::default().validate().unwrap_err();
        for field in ["firstName", "lastName", "address", "city", "state", "zipCode"] {
            assert!(errors.get(field).is_some(), "missing error for {field}");
        }
        assert!(errors.get("email").is_none());
    }

    #[test]
    fn test_validate_normalizes() {
        let record = NewPatient {
            first_name: " Michael ".to_string(),
            last_name: "Chen".to_string(),
            email: Some("Mchen@Email.com".to_string()),
            phone: Some("  ".to_string()),
            address: "456 Oak Ave".to_string(),
            city: "Los Angeles".to_string(),
            state: "ca".to_string(),
            zip_code: "90210".to_string(),
            ..NewPatient::default()
        }
        .validate()
        .unwrap();

        assert_eq!(record.first_name, "Michael");
        assert_eq!(record.state, "CA");
        assert_eq!(record.email.unwrap().as_str(), "mchen@email.com");
        assert_eq!(record.phone, None);
    }

    #[test]
    fn test_validate_rejects_bad_email_and_half_coordinates() {
        let errors = NewPatient {
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            email: Some("not-an-email".to_string()),
            address: "1 St".to_string(),
            city: "X".to_string(),
            state: "TX".to_string(),
            zip_code: "77001".to_string(),
            latitude: Some(29.76),
            ..NewPatient::default()
        }
        .validate()
        .unwrap_err();

        assert!(errors.get("email").is_some());
        assert!(errors.get("latitude").is_some());
    }
}
