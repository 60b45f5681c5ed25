//! # credo_core
//!
//! Core credential logic for Credo: input validation, password hashing and
//! signed access tokens. Storage and transport live elsewhere.

pub mod auth;
pub mod clock;
pub mod config;
pub mod models;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
