//! ---
//! ug_section: "11-simulation"
//! ug_subsection: "module"
//! ug_type: "source"
//! ug_scope: "code"
//! ug_description: "Error taxonomy for model construction."
//! ug_version: "v0.1.0"
//! ug_owner: "tbd"
//! ---
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimError>;

/// Construction-time validation failures. Ticking itself cannot fail.
#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    #[error("invalid threshold: {0}")]
    InvalidThreshold(String),
    #[error("asset {0} must carry at least one sensor")]
    NoSensors(String),
    #[error("history window must hold at least one reading")]
    EmptyHistoryWindow,
}
