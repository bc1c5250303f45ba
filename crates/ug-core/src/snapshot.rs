//! ---
//! ug_section: "01-core-functionality"
//! ug_subsection: "module"
//! ug_type: "source"
//! ug_scope: "code"
//! ug_description: "Immutable fleet snapshot published after every tick."
//! ug_version: "v0.1.0"
//! ug_owner: "tbd"
//! ---
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use ug_sim::{Anomaly, Asset, HealthStatus};

/// Health reported for a fleet (or city) with no assets.
pub const EMPTY_FLEET_HEALTH: u32 = 100;

/// A committed view of the whole fleet.
///
/// Snapshots are never mutated after publication. A tick builds a new snapshot
/// and swaps it in, so readers observe either the pre-tick or the post-tick
/// fleet. `overall_health` and `notifications` are recomputed from the assets
/// every time a snapshot is assembled.
#[derive(Debug, Clone)]
pub struct FleetSnapshot {
    generation: u64,
    taken_at: DateTime<Utc>,
    assets: IndexMap<String, Arc<Asset>>,
    overall_health: u32,
    notifications: Vec<Anomaly>,
    emitted: Vec<Anomaly>,
    compute_time: Duration,
}

impl FleetSnapshot {
    pub(crate) fn assemble(
        generation: u64,
        taken_at: DateTime<Utc>,
        assets: IndexMap<String, Arc<Asset>>,
        emitted: Vec<Anomaly>,
        notification_limit: usize,
        compute_time: Duration,
    ) -> Self {
        let overall_health = rounded_mean_health(assets.values().map(Arc::as_ref));
        let notifications = critical_notifications(assets.values(), notification_limit);
        Self {
            generation,
            taken_at,
            assets,
            overall_health,
            notifications,
            emitted,
            compute_time,
        }
    }

    /// Number of ticks applied; the seeded fleet is generation 0.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    /// Assets in seed order.
    pub fn assets(&self) -> impl Iterator<Item = &Arc<Asset>> {
        self.assets.values()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<Arc<Asset>> {
        self.assets.get(id).cloned()
    }

    pub fn overall_health(&self) -> u32 {
        self.overall_health
    }

    /// Recent critical anomalies across the fleet.
    ///
    /// Built by flattening each asset's most-recent-first log in seed order, so
    /// entries from different assets are not in global chronological order.
    pub fn notifications(&self) -> &[Anomaly] {
        &self.notifications
    }

    /// Anomalies emitted by the tick that produced this snapshot.
    pub fn emitted(&self) -> &[Anomaly] {
        &self.emitted
    }

    pub fn compute_time(&self) -> Duration {
        self.compute_time
    }
}

/// Rounded arithmetic mean of the assets' health scores, or
/// [`EMPTY_FLEET_HEALTH`] when there are none.
pub fn rounded_mean_health<'a>(assets: impl IntoIterator<Item = &'a Asset>) -> u32 {
    let (count, total) = assets
        .into_iter()
        .fold((0usize, 0.0f64), |(count, total), asset| {
            (count + 1, total + asset.health_score())
        });
    if count == 0 {
        return EMPTY_FLEET_HEALTH;
    }
    (total / count as f64).round() as u32
}

fn critical_notifications<'a>(
    assets: impl IntoIterator<Item = &'a Arc<Asset>>,
    limit: usize,
) -> Vec<Anomaly> {
    assets
        .into_iter()
        .flat_map(|asset| asset.anomalies().iter())
        .filter(|anomaly| anomaly.severity == HealthStatus::Critical)
        .take(limit)
        .cloned()
        .collect()
}
