//! Domain types and anomaly-indicator logic for AMR meter readings.

pub mod analysis;
pub mod domain;
