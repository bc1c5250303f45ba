//! ---
//! ug_section: "05-networking-external-interfaces"
//! ug_subsection: "module"
//! ug_type: "source"
//! ug_scope: "code"
//! ug_description: "Request and response bodies for the HTTP surface."
//! ug_version: "v0.1.0"
//! ug_owner: "tbd"
//! ---
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ug_advisor::ChatTurn;
use ug_core::{AnomalyEntry, FleetSnapshot, StatusCensus};
use ug_sim::{Asset, City, HealthStatus};

/// Summary returned by `GET /status`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusResponse {
    pub generation: u64,
    pub taken_at: DateTime<Utc>,
    pub asset_count: usize,
    pub overall_health: u32,
    pub selected_city: City,
    /// Wall time spent computing the latest tick.
    pub compute_time_ms: f64,
}

impl StatusResponse {
    pub(crate) fn from_snapshot(snapshot: &FleetSnapshot, selected_city: City) -> Self {
        Self {
            generation: snapshot.generation(),
            taken_at: snapshot.taken_at(),
            asset_count: snapshot.len(),
            overall_health: snapshot.overall_health(),
            selected_city,
            compute_time_ms: snapshot.compute_time().as_secs_f64() * 1_000.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub overall_health: u32,
    pub selected_city: City,
    pub city_health: u32,
}

/// Query string accepted by `GET /assets`. Values are matched case-insensitively.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub city: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub asset_type: Option<String>,
    pub sort: Option<String>,
}

/// One row of the risk leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeaderboardRow {
    pub id: String,
    pub name: String,
    pub health_score: f64,
    pub status: HealthStatus,
}

impl From<&Asset> for LeaderboardRow {
    fn from(asset: &Asset) -> Self {
        Self {
            id: asset.id().to_owned(),
            name: asset.name().to_owned(),
            health_score: asset.health_score(),
            status: asset.status(),
        }
    }
}

/// Dashboard view of one city.
#[derive(Debug, Clone, Serialize)]
pub struct CitySummary {
    pub city: City,
    pub health: u32,
    pub census: StatusCensus,
    pub recent_anomalies: Vec<AnomalyEntry>,
    pub leaderboard: Vec<LeaderboardRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CitySelection {
    pub city: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectedCity {
    pub selected_city: City,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorRequest {
    pub query: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    /// Defaults to the selected city.
    #[serde(default)]
    pub city: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}
