//! ---
//! ug_section: "08-reporting"
//! ug_subsection: "module"
//! ug_type: "source"
//! ug_scope: "code"
//! ug_description: "Compliance report formatting and export."
//! ug_version: "v0.1.0"
//! ug_owner: "tbd"
//! ---
//! Compliance documents over a single asset snapshot.

pub mod compliance;
pub mod errors;
pub mod export;

pub use compliance::{
    ComplianceReport, IncidentLine, OperationalStatus, ReportIdentification, SensorAnalysis,
    MAX_INCIDENTS,
};
pub use errors::{ReportError, Result};
pub use export::{ExportedReport, ReportExporter};
