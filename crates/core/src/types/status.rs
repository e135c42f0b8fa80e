//! Closed enumerations for shipments, medications and staff.
//!
//! Every enum here has three spellings:
//! - a wire label (`"same-day"`) used by serde, `Display` and Postgres,
//! - a display label (`"Same Day"`) for pages,
//! - the legacy uppercase form (`"SAME_DAY"`) which is still accepted on input.

use serde::{Deserialize, Serialize};

/// Error returned when a string does not name a variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    /// Which enumeration failed to parse.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

macro_rules! labelled_enum {
    ($name:ident, $kind:literal, { $($variant:ident => ($wire:literal, $label:literal)),+ $(,)? }) => {
        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Wire label used in JSON, forms and the database.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }

            /// Human-readable label for pages.
            #[must_use]
            pub const fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
                match normalized.as_str() {
                    $($wire => Ok(Self::$variant),)+
                    _ => Err(ParseEnumError {
                        kind: $kind,
                        value: s.to_owned(),
                    }),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = ParseEnumError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

/// Where a shipment is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "pharmacy.shipment_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ShipmentStatus {
    /// Created, not yet picked.
    #[default]
    Pending,
    /// Being picked and packed at the pharmacy.
    Preparing,
    /// Handed to the carrier.
    Shipped,
    /// Received by the patient.
    Delivered,
    /// Delayed, damaged, or out of temperature range.
    Exception,
}

labelled_enum!(ShipmentStatus, "shipment status", {
    Pending => ("pending", "Pending"),
    Preparing => ("preparing", "Preparing"),
    Shipped => ("shipped", "Shipped"),
    Delivered => ("delivered", "Delivered"),
    Exception => ("exception", "Exception"),
});

/// Shipment urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "pharmacy.shipment_priority", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Priority {
    #[default]
    Normal,
    Urgent,
    Critical,
}

labelled_enum!(Priority, "priority", {
    Normal => ("normal", "Normal"),
    Urgent => ("urgent", "Urgent"),
    Critical => ("critical", "Critical"),
});

/// Carrier service level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "pharmacy.shipping_method", rename_all = "kebab-case")
)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum ShippingMethod {
    #[default]
    Standard,
    Express,
    Overnight,
    SameDay,
}

labelled_enum!(ShippingMethod, "shipping method", {
    Standard => ("standard", "Standard"),
    Express => ("express", "Express"),
    Overnight => ("overnight", "Overnight"),
    SameDay => ("same-day", "Same Day"),
});

/// Storage temperature a medication must be kept at in transit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "pharmacy.temperature_requirement", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum TemperatureRequirement {
    /// 15-30°C.
    #[default]
    Room,
    /// 2-8°C.
    Refrigerated,
    /// Below -15°C.
    Frozen,
}

labelled_enum!(TemperatureRequirement, "temperature requirement", {
    Room => ("room", "Room temperature"),
    Refrigerated => ("refrigerated", "Refrigerated"),
    Frozen => ("frozen", "Frozen"),
});

impl TemperatureRequirement {
    /// Whether transport needs an unbroken cold chain.
    #[must_use]
    pub const fn requires_cold_chain(&self) -> bool {
        matches!(self, Self::Refrigerated | Self::Frozen)
    }

    /// Default temperature band shown when a medication has none recorded.
    #[must_use]
    pub const fn default_range(&self) -> &'static str {
        match self {
            Self::Room => "15-30°C",
            Self::Refrigerated => "2-8°C",
            Self::Frozen => "-25 to -15°C",
        }
    }
}

/// Staff role with different permission levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "pharmacy.user_role", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum UserRole {
    /// Full access including the medication catalog.
    Admin,
    /// Can dispense and manage the medication catalog.
    Pharmacist,
    /// Can create and track shipments.
    Technician,
}

labelled_enum!(UserRole, "user role", {
    Admin => ("admin", "Administrator"),
    Pharmacist => ("pharmacist", "Pharmacist"),
    Technician => ("technician", "Technician"),
});

impl UserRole {
    /// Whether this role may edit the medication catalog.
    #[must_use]
    pub const fn can_manage_catalog(&self) -> bool {
        matches!(self, Self::Admin | Self::Pharmacist)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_labels_round_trip_through_from_str() {
        for method in ShippingMethod::ALL {
            assert_eq!(method.as_str().parse::<ShippingMethod>().unwrap(), *method);
        }
        for status in ShipmentStatus::ALL {
            assert_eq!(status.to_string().parse::<ShipmentStatus>().unwrap(), *status);
        }
    }

    #[test]
    fn test_from_str_accepts_legacy_uppercase() {
        assert_eq!("PENDING".parse::<ShipmentStatus>().unwrap(), ShipmentStatus::Pending);
        assert_eq!("NORMAL".parse::<Priority>().unwrap(), Priority::Normal);
        assert_eq!("SAME_DAY".parse::<ShippingMethod>().unwrap(), ShippingMethod::SameDay);
        assert_eq!(
            "REFRIGERATED".parse::<TemperatureRequirement>().unwrap(),
            TemperatureRequirement::Refrigerated
        );
    }

    #[test]
    fn test_from_str_rejects_unknown() {
        let err = "teleport".parse::<ShippingMethod>().unwrap_err();
        assert_eq!(err.kind, "shipping method");
        assert_eq!(err.to_string(), "invalid shipping method: teleport");
    }

    #[test]
    fn test_serde_uses_wire_labels() {
        assert_eq!(serde_json::to_string(&ShippingMethod::SameDay).unwrap(), "\"same-day\"");
        assert_eq!(serde_json::to_string(&Priority::Critical).unwrap(), "\"critical\"");

        let status: ShipmentStatus = serde_json::from_str("\"SHIPPED\"").unwrap();
        assert_eq!(status, ShipmentStatus::Shipped);
        assert!(serde_json::from_str::<UserRole>("\"owner\"").is_err());
    }

    #[test]
    fn test_cold_chain() {
        assert!(!TemperatureRequirement::Room.requires_cold_chain());
        assert!(TemperatureRequirement::Refrigerated.requires_cold_chain());
        assert!(TemperatureRequirement::Frozen.requires_cold_chain());
    }

    #[test]
    fn test_catalog_permission() {
        assert!(UserRole::Admin.can_manage_catalog());
        assert!(UserRole::Pharmacist.can_manage_catalog());
        assert!(!UserRole::Technician.can_manage_catalog());
    }
}
