//! ---
//! ug_section: "05-networking-external-interfaces"
//! ug_subsection: "module"
//! ug_type: "source"
//! ug_scope: "code"
//! ug_description: "Advisor error types."
//! ug_version: "v0.1.0"
//! ug_owner: "tbd"
//! ---
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdvisorError>;

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("query must not be empty")]
    EmptyQuery,
    #[error("advisor transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("advisor returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("advisor response could not be decoded: {0}")]
    Malformed(#[from] serde_json::Error),
}
