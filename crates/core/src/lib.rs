//! Pharmship Core - Shared domain library.
//!
//! This crate provides the types and rules used across all Pharmship components:
//! - `dashboard` - Web dashboard and JSON API for pharmacy staff
//! - `cli` - Command-line tools for migrations, users and seed data
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Postgres encodings for the newtypes and enums are available
//! behind the `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, money, coordinates and the closed enumerations
//! - [`pricing`] - Shipment cost estimator
//! - [`lifecycle`] - Shipment status transitions and progress
//! - [`search`] - Case-insensitive text matching for list filters
//! - [`stats`] - Dashboard metric helpers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod lifecycle;
pub mod pricing;
pub mod search;
pub mod stats;
pub mod types;

pub use pricing::{CostEstimate, CostLine, ShippingOptions, estimate};
pub use search::TextQuery;
pub use types::*;
