//! ---
//! ug_section: "01-core-functionality"
//! ug_subsection: "module"
//! ug_type: "source"
//! ug_scope: "code"
//! ug_description: "Periodic tick driver for the simulation service."
//! ug_version: "v0.1.0"
//! ug_owner: "tbd"
//! ---
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use ug_common::{JitterSummary, TickTimingReporter};

use crate::service::SimulationService;

/// Invokes [`SimulationService::tick`] on a fixed interval.
///
/// The first tick fires immediately. Ticks run inline on the driver task, so a
/// new tick never starts before the previous snapshot is published.
#[derive(Debug)]
pub struct TickDriver {
    service: Arc<SimulationService>,
    interval: Duration,
    max_ticks: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct DriverStats {
    pub ticks: u64,
    pub jitter: Option<JitterSummary>,
}

impl TickDriver {
    pub fn new(service: Arc<SimulationService>, interval: Duration) -> Self {
        Self {
            service,
            interval,
            max_ticks: None,
        }
    }

    /// Stop on its own after `limit` ticks.
    pub fn with_max_ticks(mut self, limit: u64) -> Self {
        self.max_ticks = Some(limit);
        self
    }

    pub fn spawn(self) -> DriverHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(self.run(async move {
            let _ = shutdown_rx.await;
        }));
        DriverHandle {
            shutdown: Some(shutdown_tx),
            task,
        }
    }

    /// Drive ticks until `shutdown` resolves or the tick limit is reached.
    pub async fn run<F>(self, shutdown: F) -> DriverStats
    where
        F: std::future::Future<Output = ()> + Send,
    {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let reporter = TickTimingReporter::new(self.interval);
        let mut ticks: u64 = 0;
        tokio::pin!(shutdown);

        info!(
            interval_ms = self.interval.as_millis() as u64,
            max_ticks = ?self.max_ticks,
            "tick driver started"
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    debug!("tick driver shutdown signal received");
                    break;
                }
                _ = interval.tick() => {
                    let jitter = reporter.record_tick();
                    let snapshot = self.service.tick();
                    ticks += 1;
                    for anomaly in snapshot.emitted() {
                        warn!(
                            anomaly_id = %anomaly.id,
                            sensor_id = %anomaly.sensor_id,
                            description = %anomaly.description,
                            "anomaly logged"
                        );
                    }
                    debug!(
                        generation = snapshot.generation(),
                        overall_health = snapshot.overall_health(),
                        new_anomalies = snapshot.emitted().len(),
                        compute_us = snapshot.compute_time().as_micros() as u64,
                        jitter_us = jitter.map(|value| value.as_micros() as u64),
                        "simulation tick"
                    );
                    if self.max_ticks.is_some_and(|limit| ticks >= limit) {
                        debug!(ticks, "tick driver reached its tick limit");
                        break;
                    }
                }
            }
        }

        let jitter = reporter.histogram().summary();
        if let Some(summary) = &jitter {
            info!(
                ticks,
                mean_ms = summary.mean_ms,
                max_ms = summary.max_ms,
                "tick driver stopped"
            );
        } else {
            info!(ticks, "tick driver stopped");
        }
        DriverStats { ticks, jitter }
    }
}

/// Handle to a spawned [`TickDriver`].
#[derive(Debug)]
pub struct DriverHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<DriverStats>,
}

impl DriverHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signal shutdown and await the driver task.
    pub async fn shutdown(mut self) -> Result<DriverStats> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.task
            .await
            .map_err(|err| anyhow::anyhow!("tick driver join failure: {}", err))
    }
}
