//! Domain models.

pub mod agent;
