//! ---
//! ug_section: "01-core-functionality"
//! ug_subsection: "module"
//! ug_type: "source"
//! ug_scope: "code"
//! ug_description: "Error types for the simulation service."
//! ug_version: "v0.1.0"
//! ug_owner: "tbd"
//! ---
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown asset {0}")]
    UnknownAsset(String),
    #[error("unknown city {0}")]
    UnknownCity(String),
    #[error("asset {0} appears more than once in the fleet")]
    DuplicateAsset(String),
    #[error("fleet seeding failed: {0}")]
    Seed(#[from] ug_sim::SimError),
    #[error("metrics registration failed: {0}")]
    Metrics(#[from] prometheus::Error),
}
