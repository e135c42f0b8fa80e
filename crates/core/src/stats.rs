//! Helpers for dashboard metrics.

use rust_decimal::{Decimal, RoundingStrategy};

/// Share of completed shipments that were delivered, as a percentage with one
/// decimal place.
///
/// A shipment counts as completed once it is delivered or in exception.
/// Returns `None` before anything has completed.
#[must_use]
pub fn delivery_rate(delivered: i64, exceptions: i64) -> Option<Decimal> {
    let completed = delivered.checked_add(exceptions)?;
    if completed <= 0 {
        return None;
    }

    let rate = Decimal::from(delivered) * Decimal::ONE_HUNDRED / Decimal::from(completed);
    Some(rate.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero))
}

/// Format a mean duration in hours for display (`"18.4 hrs"`).
#[must_use]
pub fn format_hours(hours: Option<f64>) -> String {
    match hours {
        Some(h) if h.is_finite() && h >= 0.0 => format!("{h:.1} hrs"),
        _ => "n/a".to_owned(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_delivery_rate() {
        assert_eq!(delivery_rate(992, 8), Some(dec!(99.2)));
        assert_eq!(delivery_rate(2, 1), Some(dec!(66.7)));
        assert_eq!(delivery_rate(5, 0), Some(dec!(100.0)));
        assert_eq!(delivery_rate(0, 3), Some(dec!(0)));
    }

    #[test]
    fn test_delivery_rate_with_nothing_completed() {
        assert_eq!(delivery_rate(0, 0), None);
    }

    #[test]
    fn test_format_hours() {
        assert_eq!(format_hours(Some(18.44)), "18.4 hrs");
        assert_eq!(format_hours(Some(0.0)), "0.0 hrs");
        assert_eq!(format_hours(None), "n/a");
        assert_eq!(format_hours(Some(f64::NAN)), "n/a");
    }
}
