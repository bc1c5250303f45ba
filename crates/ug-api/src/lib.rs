//! ---
//! ug_section: "05-networking-external-interfaces"
//! ug_subsection: "module"
//! ug_type: "source"
//! ug_scope: "code"
//! ug_description: "HTTP surface crate root."
//! ug_version: "v0.1.0"
//! ug_owner: "tbd"
//! ---
//! Read-side and selection endpoints over a running [`ug_core::SimulationService`].
//! The surface never ingests telemetry; ticks are driven elsewhere.

pub mod server;
pub mod views;

pub use server::{ApiHandle, ApiServerBuilder};
pub use views::{
    AdvisorRequest, CitySelection, CitySummary, ErrorResponse, HealthResponse, LeaderboardRow,
    ListParams, SelectedCity, StatusResponse,
};
