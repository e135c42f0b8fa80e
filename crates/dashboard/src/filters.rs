//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// CSS classes for a status or priority badge.
///
/// Usage in templates: `{{ shipment.status|badge }}` renders `badge badge-shipped`.
#[askama::filter_fn]
pub fn badge(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format!("badge badge-{value}"))
}
