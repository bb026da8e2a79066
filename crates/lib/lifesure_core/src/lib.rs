//! # lifesure_core
//!
//! Core domain logic for LifeSure: accounts, policy catalog, claim ledger,
//! their storage backends and document intake.

pub mod auth;
pub mod claims;
pub mod migrate;
pub mod models;
pub mod policies;
pub mod store;
pub mod uploads;
pub mod uuid;
pub mod validation;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
