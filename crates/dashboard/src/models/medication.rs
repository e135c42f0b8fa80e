//! Medication catalog types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pharmship_core::{MedicationId, TemperatureRequirement, TextQuery};

use super::validation::{ValidationErrors, non_blank};

/// A dispensable medication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub id: MedicationId,
    pub name: String,
    /// Dose strength, e.g. `"500mg"`.
    pub strength: Option<String>,
    /// Dosage form, e.g. `"Tablet"`.
    pub form: Option<String>,
    pub manufacturer: Option<String>,
    /// National Drug Code.
    pub ndc: Option<String>,
    pub temperature: TemperatureRequirement,
    /// Recorded storage band, e.g. `"2-8°C"`.
    pub temperature_range: Option<String>,
    /// Scheduled (controlled) substance.
    pub controlled: bool,
    pub created_at: DateTime<Utc>,
}

impl Medication {
    #[must_use]
    pub const fn requires_cold_chain(&self) -> bool {
        self.temperature.requires_cold_chain()
    }

    /// Name with strength, e.g. `"Metformin 500mg"`.
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.strength {
            Some(strength) => format!("{} {strength}", self.name),
            None => self.name.clone(),
        }
    }

    /// The recorded temperature band, or the default for its requirement.
    #[must_use]
    pub fn temperature_band(&self) -> &str {
        self.temperature_range
            .as_deref()
            .unwrap_or_else(|| self.temperature.default_range())
    }

    /// Medication search matches on name or manufacturer.
    #[must_use]
    pub fn matches(&self, query: &TextQuery) -> bool {
        query.matches([
            self.name.as_str(),
            self.manufacturer.as_deref().unwrap_or_default(),
        ])
    }
}

/// Request body for adding a medication to the catalog.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewMedication {
    pub name: String,
    pub strength: Option<String>,
    pub form: Option<String>,
    pub manufacturer: Option<String>,
    pub ndc: Option<String>,
    pub temperature: TemperatureRequirement,
    pub temperature_range: Option<String>,
    pub controlled: bool,
}

/// A validated medication ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MedicationRecord {
    pub name: String,
    pub strength: Option<String>,
    pub form: Option<String>,
    pub manufacturer: Option<String>,
    pub ndc: Option<String>,
    pub temperature: TemperatureRequirement,
    pub temperature_range: Option<String>,
    pub controlled: bool,
}

impl NewMedication {
    /// Check required fields and normalize the input.
    ///
    /// # Errors
    ///
    /// Returns every field that failed validation.
    pub fn validate(&self) -> Result<MedicationRecord, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = self.name.trim().to_owned();
        if name.is_empty() {
            errors.add("name", "Name is required");
        }

        let ndc = non_blank(self.ndc.as_deref());
        if let Some(code) = &ndc
            && !is_ndc(code)
        {
            errors.add("ndc", "NDC must look like 12345-678-90");
        }

        errors.into_result(MedicationRecord {
            name,
            strength: non_blank(self.strength.as_deref()),
            form: non_blank(self.form.as_deref()),
            manufacturer: non_blank(self.manufacturer.as_deref()),
            ndc,
            temperature: self.temperature,
            temperature_range: non_blank(self.temperature_range.as_deref()),
            controlled: self.controlled,
        })
    }
}

/// Three dash-separated groups of digits, ten digits in total.
fn is_ndc(code: &str) -> bool {
    let groups: Vec<&str> = code.split('-').collect();
    groups.len() == 3
        && groups
            .iter()
            .all(|g| !g.is_empty() && g.chars().all(|c| c.is_ascii_digit()))
        && groups.iter().map(|g| g.len()).sum::<usize>() == 10
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn insulin() -> Medication {
        Medication {
            id: MedicationId::new(1),
            name: "Insulin Glargine".to_string(),
            strength: Some("100U/mL".to_string()),
            form: Some("Injectable".to_string()),
            manufacturer: Some("Sanofi".to_string()),
            ndc: None,
            temperature: TemperatureRequirement::Refrigerated,
            temperature_range: None,
            controlled: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_display_and_band() {
        let medication = insulin();
        assert_eq!(medication.display_name(), "Insulin Glargine 100U/mL");
        assert_eq!(medication.temperature_band(), "2-8°C");
        assert!(medication.requires_cold_chain());
    }

    #[test]
    fn test_matches_name_or_manufacturer() {
        let medication = insulin();
        assert!(medication.matches(&TextQuery::new("glargine")));
        assert!(medication.matches(&TextQuery::new("SANOFI")));
        assert!(!medication.matches(&TextQuery::new("teva")));
    }

    #[test]
    fn test_validate() {
        assert!(NewMedication::default().validate().unwrap_err().get("name").is_some());

        let record = NewMedication {
            name: " Lisinopril ".to_string(),
            strength: Some("10mg".to_string()),
            ndc: Some("12345-678-90".to_string()),
            ..NewMedication::default()
        }
        .validate()
        .unwrap();
        assert_eq!(record.name, "Lisinopril");
        assert_eq!(record.temperature, TemperatureRequirement::Room);

        let errors = NewMedication {
            name: "Metformin".to_string(),
            ndc: Some("98765-43210".to_string()),
            ..NewMedication::default()
        }
        .validate()
        .unwrap_err();
        assert!(errors.get("ndc").is_some());
    }

    #[test]
    fn test_is_ndc() {
        assert!(is_ndc("11111-222-33"));
        assert!(is_ndc("1234-5678-90"));
        assert!(!is_ndc("12345-678-9a"));
        assert!(!is_ndc("123-45-6"));
    }
}
