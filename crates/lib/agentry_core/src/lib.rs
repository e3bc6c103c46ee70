//! # agentry_core
//!
//! Core identity verification logic for Agentry.

pub mod agents;
pub mod gate;
pub mod identity;
pub mod migrate;
pub mod models;
pub mod uuid;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
