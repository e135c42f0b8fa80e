//! Core types for Pharmship.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod geo;
pub mod id;
pub mod money;
pub mod status;

pub use email::{Email, EmailError};
pub use geo::{Coordinates, CoordinatesError};
pub use id::*;
pub use money::Money;
pub use status::*;
