//! ---
//! ug_section: "01-core-functionality"
//! ug_subsection: "module"
//! ug_type: "source"
//! ug_scope: "code"
//! ug_description: "Read-side fleet queries used by listing and dashboard views."
//! ug_version: "v0.1.0"
//! ug_owner: "tbd"
//! ---
use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use ug_sim::{Anomaly, Asset, AssetType, City, HealthStatus};

use crate::snapshot::{rounded_mean_health, FleetSnapshot};

pub const RECENT_ANOMALY_LIMIT: usize = 5;
pub const LEADERBOARD_LIMIT: usize = 10;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum SortOrder {
    /// Lowest health first.
    #[default]
    CriticalFirst,
    HealthiestFirst,
    Alphabetical,
}

/// Filter and ordering for [`FleetSnapshot::list_assets`]. `None` filters match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetQuery {
    #[serde(default)]
    pub city: Option<City>,
    #[serde(default)]
    pub status: Option<HealthStatus>,
    #[serde(default, rename = "type")]
    pub asset_type: Option<AssetType>,
    #[serde(default)]
    pub sort: SortOrder,
}

impl AssetQuery {
    pub fn for_city(city: City) -> Self {
        Self {
            city: Some(city),
            ..Self::default()
        }
    }

    pub fn matches(&self, asset: &Asset) -> bool {
        self.city.map_or(true, |city| asset.city() == city)
            && self.status.map_or(true, |status| asset.status() == status)
            && self
                .asset_type
                .map_or(true, |asset_type| asset.asset_type() == asset_type)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCensus {
    pub healthy: usize,
    pub warning: usize,
    pub critical: usize,
}

impl StatusCensus {
    pub fn total(&self) -> usize {
        self.healthy + self.warning + self.critical
    }
}

/// An anomaly annotated with the asset that logged it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyEntry {
    pub asset_id: String,
    pub asset_name: String,
    #[serde(flatten)]
    pub anomaly: Anomaly,
}

fn compare(order: SortOrder, left: &Asset, right: &Asset) -> Ordering {
    match order {
        SortOrder::CriticalFirst => left.health_score().total_cmp(&right.health_score()),
        SortOrder::HealthiestFirst => right.health_score().total_cmp(&left.health_score()),
        SortOrder::Alphabetical => left.name().cmp(right.name()),
    }
}

impl FleetSnapshot {
    /// Filtered, stably sorted asset list.
    pub fn list_assets(&self, query: &AssetQuery) -> Vec<Arc<Asset>> {
        let mut assets: Vec<Arc<Asset>> = self
            .assets()
            .filter(|asset| query.matches(asset))
            .cloned()
            .collect();
        assets.sort_by(|left, right| compare(query.sort, left, right));
        assets
    }

    pub fn city_assets(&self, city: City) -> impl Iterator<Item = &Arc<Asset>> {
        self.assets().filter(move |asset| asset.city() == city)
    }

    /// Rounded mean health of one city; 100 when the city has no assets.
    pub fn city_health(&self, city: City) -> u32 {
        rounded_mean_health(self.city_assets(city).map(Arc::as_ref))
    }

    pub fn status_census(&self, city: City) -> StatusCensus {
        self.city_assets(city)
            .fold(StatusCensus::default(), |mut census, asset| {
                match asset.status() {
                    HealthStatus::Healthy => census.healthy += 1,
                    HealthStatus::Warning => census.warning += 1,
                    HealthStatus::Critical => census.critical += 1,
                }
                census
            })
    }

    /// Newest anomalies logged in `city`, sorted by timestamp across assets.
    pub fn city_recent_anomalies(&self, city: City, limit: usize) -> Vec<AnomalyEntry> {
        let mut entries: Vec<AnomalyEntry> = self
            .city_assets(city)
            .flat_map(|asset| {
                asset.anomalies().iter().map(move |anomaly| AnomalyEntry {
                    asset_id: asset.id().to_owned(),
                    asset_name: asset.name().to_owned(),
                    anomaly: anomaly.clone(),
                })
            })
            .collect();
        entries.sort_by(|left, right| right.anomaly.timestamp.cmp(&left.anomaly.timestamp));
        entries.truncate(limit);
        entries
    }

    /// The `limit` least healthy assets of `city`.
    pub fn risk_leaderboard(&self, city: City, limit: usize) -> Vec<Arc<Asset>> {
        let mut ranked = self.list_assets(&AssetQuery {
            sort: SortOrder::CriticalFirst,
            ..AssetQuery::for_city(city)
        });
        ranked.truncate(limit);
        ranked
    }
}
