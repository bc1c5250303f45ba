//! ---
//! ug_section: "03-persistence-logging"
//! ug_subsection: "module"
//! ug_type: "source"
//! ug_scope: "code"
//! ug_description: "Post-tick observers and Prometheus simulation metrics."
//! ug_version: "v0.1.0"
//! ug_owner: "tbd"
//! ---
use std::sync::Arc;

use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntGauge, IntGaugeVec, Opts, Registry,
};
use strum::IntoEnumIterator;
use ug_sim::HealthStatus;

use crate::errors::Result;
use crate::snapshot::FleetSnapshot;

/// Shared registry type used across services.
pub type SharedRegistry = Arc<Registry>;

pub fn new_registry() -> SharedRegistry {
    Arc::new(Registry::new())
}

/// Hook invoked after each committed tick.
///
/// Errors are logged by the service and never abort the tick or the driver;
/// the snapshot is already published when observers run.
pub trait TickObserver: Send + Sync {
    fn name(&self) -> &str;

    fn on_tick(&self, snapshot: &FleetSnapshot) -> anyhow::Result<()>;
}

#[derive(Clone, Debug)]
pub struct SimulationMetrics {
    registry: SharedRegistry,
    ticks_total: IntCounter,
    tick_seconds: Histogram,
    overall_health: IntGauge,
    assets_by_status: IntGaugeVec,
    anomalies_total: IntCounter,
}

impl SimulationMetrics {
    pub fn new(registry: SharedRegistry) -> Result<Self> {
        let ticks_total = IntCounter::with_opts(Opts::new(
            "urbanguard_ticks_total",
            "Total number of simulation ticks committed",
        ))?;
        registry.register(Box::new(ticks_total.clone()))?;

        let buckets = prometheus::exponential_buckets(0.00001, 2.0, 16)?;
        let tick_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "urbanguard_tick_duration_seconds",
                "Time spent computing one simulation tick",
            )
            .buckets(buckets),
        )?;
        registry.register(Box::new(tick_seconds.clone()))?;

        let overall_health = IntGauge::with_opts(Opts::new(
            "urbanguard_overall_health",
            "Rounded mean health score across the fleet",
        ))?;
        registry.register(Box::new(overall_health.clone()))?;

        let assets_by_status = IntGaugeVec::new(
            Opts::new(
                "urbanguard_assets",
                "Number of assets per health status after the last tick",
            ),
            &["status"],
        )?;
        registry.register(Box::new(assets_by_status.clone()))?;

        let anomalies_total = IntCounter::with_opts(Opts::new(
            "urbanguard_anomalies_emitted_total",
            "Anomalies emitted by simulation ticks",
        ))?;
        registry.register(Box::new(anomalies_total.clone()))?;

        Ok(Self {
            registry,
            ticks_total,
            tick_seconds,
            overall_health,
            assets_by_status,
            anomalies_total,
        })
    }

    pub fn registry(&self) -> SharedRegistry {
        self.registry.clone()
    }

    pub fn record(&self, snapshot: &FleetSnapshot) {
        self.ticks_total.inc();
        self.tick_seconds
            .observe(snapshot.compute_time().as_secs_f64());
        self.overall_health.set(i64::from(snapshot.overall_health()));
        for status in HealthStatus::iter() {
            let count = snapshot
                .assets()
                .filter(|asset| asset.status() == status)
                .count();
            self.assets_by_status
                .with_label_values(&[&status.to_string()])
                .set(count as i64);
        }
        self.anomalies_total.inc_by(snapshot.emitted().len() as u64);
    }
}

impl TickObserver for SimulationMetrics {
    fn name(&self) -> &str {
        "prometheus"
    }

    fn on_tick(&self, snapshot: &FleetSnapshot) -> anyhow::Result<()> {
        self.record(snapshot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_register_once_per_registry() {
        let registry = new_registry();
        let metrics = SimulationMetrics::new(registry.clone());
        assert!(metrics.is_ok());
        assert!(SimulationMetrics::new(registry).is_err());
    }
}
