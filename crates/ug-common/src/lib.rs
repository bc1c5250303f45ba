//! ---
//! ug_section: "01-core-functionality"
//! ug_subsection: "module"
//! ug_type: "source"
//! ug_scope: "code"
//! ug_description: "Shared primitives and utilities for the UrbanGuard runtime."
//! ug_version: "v0.1.0"
//! ug_owner: "tbd"
//! ---
//! Shared primitives for the UrbanGuard workspace.
//! This crate exposes configuration loading, logging, and tick timing
//! utilities consumed by the simulation service and the daemon.

pub mod config;
pub mod logging;
pub mod metrics;

pub use config::{
    AdvisorConfig, ApiConfig, AppConfig, LoadedAppConfig, LoggingConfig, ReportConfig,
    SimulationConfig,
};
pub use logging::{init_tracing, LogFormat};
pub use metrics::{JitterHistogram, JitterSummary, TickTimingReporter};
