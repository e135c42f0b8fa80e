//! Field-level validation errors.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Validation messages keyed by the JSON field name they belong to.
///
/// Only the first message recorded for a field is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, String>);

impl ValidationErrors {
    /// An empty error set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An error set with a single message.
    #[must_use]
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record a message for `field` unless one is already present.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The message recorded for `field`, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Iterate over `(field, message)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    /// `Ok(value)` when no errors were recorded.
    ///
    /// # Errors
    ///
    /// Returns `self` if any field failed validation.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Trim an optional string, mapping blank input to `None`.
#[must_use]
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Deserialize an optional value from a string, treating a blank string as absent.
///
/// HTML selects post `""` for their placeholder option.
///
/// # Errors
///
/// Returns the deserializer's error if the value is present but does not parse.
pub fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_first_message_wins() {
        let mut errors = ValidationErrors::new();
        errors.add("items", "Please select a medication");
        errors.add("items", "Quantity must be at least 1");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("items"), Some("Please select a medication"));
    }

    #[test]
    fn test_serializes_as_field_map() {
        let mut errors = ValidationErrors::single("patientId", "Please select a patient");
        errors.add("deliveryDate", "Please select a delivery date");

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["patientId"], "Please select a patient");
        assert_eq!(json["deliveryDate"], "Please select a delivery date");
        assert_eq!(
            errors.to_string(),
            "deliveryDate: Please select a delivery date; patientId: Please select a patient"
        );
    }

    #[test]
    fn test_into_result() {
        assert_eq!(ValidationErrors::new().into_result(5), Ok(5));
        assert!(ValidationErrors::single("x", "bad").into_result(5).is_err());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  Austin ")), Some("Austin".to_string()));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn test_blank_as_none() {
        #[derive(Deserialize)]
        struct Query {
            #[serde(default, deserialize_with = "blank_as_none")]
            id: Option<i32>,
        }

        let parsed: Query = serde_json::from_str(r#"{"id":""}"#).unwrap();
        assert_eq!(parsed.id, None);
        let parsed: Query = serde_json::from_str(r#"{"id":" 12 "}"#).unwrap();
        assert_eq!(parsed.id, Some(12));
        let parsed: Query = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.id, None);
        assert!(serde_json::from_str::<Query>(r#"{"id":"x"}"#).is_err());
    }
}
