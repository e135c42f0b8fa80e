//! Pharmship Dashboard library.
//!
//! The web dashboard and JSON API for pharmacy staff, exposed as a library so
//! the binary, the CLI and the integration tests share one router.
//!
//! # Data
//!
//! The database holds patient names, addresses and medication histories.
//! Sentry is initialized without default PII and handlers never log request
//! bodies.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
