//! ---
//! ug_section: "01-core-functionality"
//! ug_subsection: "module"
//! ug_type: "source"
//! ug_scope: "code"
//! ug_description: "Simulation service lifecycle and fleet queries."
//! ug_version: "v0.1.0"
//! ug_owner: "tbd"
//! ---
//! Simulation service, snapshot queries, and tick scheduling for UrbanGuard.

pub mod driver;
pub mod errors;
pub mod observer;
pub mod query;
pub mod service;
pub mod snapshot;

pub use driver::{DriverHandle, DriverStats, TickDriver};
pub use errors::{CoreError, Result};
pub use observer::{new_registry, SharedRegistry, SimulationMetrics, TickObserver};
pub use query::{AnomalyEntry, AssetQuery, SortOrder, StatusCensus};
pub use service::{ServiceSettings, SimulationService};
pub use snapshot::{FleetSnapshot, EMPTY_FLEET_HEALTH};
