//! Shipment cost estimator.
//!
//! The estimate is a flat base fee plus one surcharge per selected option:
//!
//! | component              | surcharge                                   |
//! |------------------------|---------------------------------------------|
//! | base                   | $15.99                                      |
//! | shipping method        | standard 0, express 10, overnight 25, same-day 50 |
//! | priority               | normal 0, urgent 5, critical 15             |
//! | temperature monitoring | 12                                          |
//! | signature required     | 3                                           |

use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Priority, ShippingMethod};

/// Base fee charged for every shipment.
#[must_use]
pub fn base_fee() -> Money {
    Money::new(dec!(15.99))
}

/// Surcharge for real-time temperature tracking.
#[must_use]
pub fn temperature_monitoring_fee() -> Money {
    Money::new(dec!(12))
}

/// Surcharge for signature on delivery.
#[must_use]
pub fn signature_fee() -> Money {
    Money::new(dec!(3))
}

impl ShippingMethod {
    /// Surcharge over the base fee.
    #[must_use]
    pub fn surcharge(&self) -> Money {
        Money::new(match self {
            Self::Standard => dec!(0),
            Self::Express => dec!(10),
            Self::Overnight => dec!(25),
            Self::SameDay => dec!(50),
        })
    }

    /// Advertised price for this method alone (base fee included).
    #[must_use]
    pub fn list_price(&self) -> Money {
        base_fee() + self.surcharge()
    }

    /// Advertised delivery window.
    #[must_use]
    pub const fn delivery_window(&self) -> &'static str {
        match self {
            Self::Standard => "3-5 days",
            Self::Express => "2-3 days",
            Self::Overnight => "1 day",
            Self::SameDay => "4-8 hours",
        }
    }
}

impl Priority {
    /// Surcharge over the base fee.
    #[must_use]
    pub fn surcharge(&self) -> Money {
        Money::new(match self {
            Self::Normal => dec!(0),
            Self::Urgent => dec!(5),
            Self::Critical => dec!(15),
        })
    }
}

/// The priced choices for one shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingOptions {
    pub shipping_method: ShippingMethod,
    pub priority: Priority,
    pub temperature_monitoring: bool,
    pub requires_signature: bool,
}

impl ShippingOptions {
    /// Force temperature monitoring on when the shipment carries cold-chain stock.
    #[must_use]
    pub const fn with_cold_chain(mut self, requires_cold_chain: bool) -> Self {
        if requires_cold_chain {
            self.temperature_monitoring = true;
        }
        self
    }
}

/// One priced component of an estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostLine {
    /// Stable machine key (`base`, `shippingMethod`, ...).
    pub key: &'static str,
    /// Human-readable description.
    pub label: String,
    pub amount: Money,
}

/// Itemized shipping cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostEstimate {
    pub lines: Vec<CostLine>,
    pub total: Money,
    /// Advertised delivery window for the chosen method.
    pub delivery_window: &'static str,
}

impl CostEstimate {
    /// Look up a line by key.
    #[must_use]
    pub fn line(&self, key: &str) -> Option<&CostLine> {
        self.lines.iter().find(|line| line.key == key)
    }
}

/// Price a shipment.
///
/// Method and priority are always itemized, even at $0.00, so the breakdown
/// has the same shape for every standard/normal order. The two toggles are
/// itemized only when selected.
#[must_use]
pub fn estimate(options: &ShippingOptions) -> CostEstimate {
    let mut lines = vec![
        CostLine {
            key: "base",
            label: "Base shipping".to_owned(),
            amount: base_fee(),
        },
        CostLine {
            key: "shippingMethod",
            label: format!("{} shipping", options.shipping_method.label()),
            amount: options.shipping_method.surcharge(),
        },
        CostLine {
            key: "priority",
            label: format!("{} priority", options.priority.label()),
            amount: options.priority.surcharge(),
        },
    ];

    if options.temperature_monitoring {
        lines.push(CostLine {
            key: "temperatureMonitoring",
            label: "Temperature monitoring".to_owned(),
            amount: temperature_monitoring_fee(),
        });
    }

    if options.requires_signature {
        lines.push(CostLine {
            key: "signature",
            label: "Signature required".to_owned(),
            amount: signature_fee(),
        });
    }

    let total = lines.iter().map(|line| line.amount).sum();

    CostEstimate {
        lines,
        total,
        delivery_window: options.shipping_method.delivery_window(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn options(
        shipping_method: ShippingMethod,
        priority: Priority,
        temperature_monitoring: bool,
        requires_signature: bool,
    ) -> ShippingOptions {
        ShippingOptions {
            shipping_method,
            priority,
            temperature_monitoring,
            requires_signature,
        }
    }

    #[test]
    fn test_standard_normal_is_base_fee() {
        let estimate = estimate(&ShippingOptions::default());
        assert_eq!(estimate.total, Money::new(dec!(15.99)));
        assert_eq!(estimate.lines.len(), 3);
        assert_eq!(estimate.line("shippingMethod").unwrap().amount, Money::ZERO);
        assert_eq!(estimate.delivery_window, "3-5 days");
    }

    #[test]
    fn test_every_option_selected() {
        let estimate = estimate(&options(
            ShippingMethod::SameDay,
            Priority::Critical,
            true,
            true,
        ));
        // 15.99 + 50 + 15 + 12 + 3
        assert_eq!(estimate.total, Money::new(dec!(95.99)));
        assert_eq!(estimate.lines.len(), 5);
        assert_eq!(estimate.delivery_window, "4-8 hours");
    }

    #[test]
    fn test_express_urgent_with_signature() {
        let estimate = estimate(&options(ShippingMethod::Express, Priority::Urgent, false, true));
        assert_eq!(estimate.total, Money::new(dec!(33.99)));
        assert!(estimate.line("temperatureMonitoring").is_none());
        assert_eq!(estimate.line("signature").unwrap().amount, signature_fee());
    }

    #[test]
    fn test_overnight_with_monitoring() {
        let estimate = estimate(&options(ShippingMethod::Overnight, Priority::Normal, true, false));
        assert_eq!(estimate.total, Money::new(dec!(52.99)));
    }

    #[test]
    fn test_list_prices() {
        assert_eq!(ShippingMethod::Standard.list_price().to_string(), "$15.99");
        assert_eq!(ShippingMethod::Express.list_price().to_string(), "$25.99");
        assert_eq!(ShippingMethod::Overnight.list_price().to_string(), "$40.99");
        assert_eq!(ShippingMethod::SameDay.list_price().to_string(), "$65.99");
    }

    #[test]
    fn test_cold_chain_forces_monitoring() {
        let forced = ShippingOptions::default().with_cold_chain(true);
        assert!(forced.temperature_monitoring);

        let untouched = ShippingOptions::default().with_cold_chain(false);
        assert!(!untouched.temperature_monitoring);

        let kept = options(ShippingMethod::Standard, Priority::Normal, true, false)
            .with_cold_chain(false);
        assert!(kept.temperature_monitoring);
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let parsed: ShippingOptions =
            serde_json::from_str(r#"{"shippingMethod":"overnight","requiresSignature":true}"#)
                .unwrap();
        assert_eq!(parsed.shipping_method, ShippingMethod::Overnight);
        assert_eq!(parsed.priority, Priority::Normal);
        assert!(parsed.requires_signature);
        assert!(!parsed.temperature_monitoring);
    }
}
