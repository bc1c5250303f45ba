//! ---
//! ug_section: "11-simulation"
//! ug_subsection: "01-bootstrap"
//! ug_type: "source"
//! ug_scope: "code"
//! ug_description: "Simulation module exports and shared types."
//! ug_version: "v0.1.0"
//! ug_owner: "tbd"
//! ---
//! Synthetic telemetry and health scoring for monitored urban assets.
//!
//! The crate is pure computation: every random draw goes through a
//! [`RandomSource`] and every timestamp is supplied by the caller, so a seeded
//! source reproduces a run exactly.

pub mod anomaly;
pub mod errors;
pub mod health;
pub mod model;
pub mod rng;
pub mod seeder;
pub mod sensor;
pub mod threshold;

pub use anomaly::{AnomalyIdSource, AnomalyLog, DEFAULT_ANOMALY_RETENTION};
pub use errors::{Result, SimError};
pub use health::{
    aggregate, merge_outcomes, score_from_bands, step_asset, trend_between, AssetStep,
    HealthAssessment,
};
pub use model::{
    Anomaly, Asset, AssetIdentity, AssetType, City, Coordinates, HealthStatus, ReadingWindow,
    Sensor, SensorReading, Trend, DEFAULT_HISTORY_WINDOW,
};
pub use rng::{RandomSource, ScriptedRandom, SeededRandom};
pub use seeder::{CatalogEntry, FleetSeeder, SensorProfile};
pub use sensor::{advance, draw_next_value, settle, SensorOutcome};
pub use threshold::{SensorBand, Threshold};
