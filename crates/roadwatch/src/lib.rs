//! Oversight of road-construction contractors: complaint intake, explicit ratings, and the
//! deduction-based quality score used for procurement decisions.

pub mod config;
pub mod error;
pub mod ratings;
pub mod telemetry;
