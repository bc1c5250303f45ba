//! ---
//! ug_section: "11-simulation"
//! ug_subsection: "module"
//! ug_type: "source"
//! ug_scope: "code"
//! ug_description: "Asset, sensor, and anomaly data model."
//! ug_version: "v0.1.0"
//! ug_owner: "tbd"
//! ---
use std::collections::VecDeque;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::anomaly::AnomalyLog;
use crate::errors::{Result, SimError};
use crate::health::HealthAssessment;
use crate::threshold::Threshold;

pub const DEFAULT_HISTORY_WINDOW: usize = 20;

/// Cities covered by the monitoring network.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString, EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum City {
    Chennai,
    Coimbatore,
}

impl City {
    pub fn center(self) -> Coordinates {
        match self {
            City::Chennai => Coordinates {
                lat: 13.0827,
                lng: 80.2707,
            },
            City::Coimbatore => Coordinates {
                lat: 11.0168,
                lng: 76.9558,
            },
        }
    }

    /// Latitude/longitude stretch applied to the seeded scatter.
    pub fn scatter_scale(self) -> (f64, f64) {
        match self {
            City::Chennai => (1.5, 1.8),
            City::Coimbatore => (1.2, 1.4),
        }
    }

    pub fn id_prefix(self) -> &'static str {
        match self {
            City::Chennai => "CH",
            City::Coimbatore => "CBE",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            City::Chennai => "chennai",
            City::Coimbatore => "coimbatore",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum AssetType {
    Bridge,
    #[serde(rename = "Water Pipe")]
    #[strum(to_string = "Water Pipe", serialize = "water-pipe")]
    WaterPipe,
    Transformer,
    #[serde(rename = "Traffic Signal")]
    #[strum(to_string = "Traffic Signal", serialize = "traffic-signal")]
    TrafficSignal,
    Building,
}

/// Discrete health classification, always derived from a health score.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

impl HealthStatus {
    pub const HEALTHY_ABOVE: f64 = 85.0;
    pub const WARNING_ABOVE: f64 = 60.0;

    pub fn from_score(score: f64) -> Self {
        if score > Self::HEALTHY_ABOVE {
            HealthStatus::Healthy
        } else if score > Self::WARNING_ABOVE {
            HealthStatus::Warning
        } else {
            HealthStatus::Critical
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Fixed-length sliding window of readings, oldest evicted first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawWindow")]
pub struct ReadingWindow {
    capacity: usize,
    readings: VecDeque<SensorReading>,
}

#[derive(Deserialize)]
struct RawWindow {
    capacity: usize,
    readings: Vec<SensorReading>,
}

impl TryFrom<RawWindow> for ReadingWindow {
    type Error = SimError;

    fn try_from(raw: RawWindow) -> Result<Self> {
        let mut window = ReadingWindow::new(raw.capacity)?;
        for reading in raw.readings {
            window.push(reading);
        }
        Ok(window)
    }
}

impl ReadingWindow {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(SimError::EmptyHistoryWindow);
        }
        Ok(Self {
            capacity,
            readings: VecDeque::with_capacity(capacity),
        })
    }

    pub fn push(&mut self, reading: SensorReading) {
        while self.readings.len() >= self.capacity {
            self.readings.pop_front();
        }
        self.readings.push_back(reading);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn latest(&self) -> Option<&SensorReading> {
        self.readings.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SensorReading> {
        self.readings.iter()
    }
}

/// One measured channel of an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    pub id: String,
    pub name: String,
    pub unit: String,
    current_value: f64,
    pub history: ReadingWindow,
    pub threshold: Threshold,
}

impl Sensor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        unit: impl Into<String>,
        current_value: f64,
        threshold: Threshold,
        history: ReadingWindow,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unit: unit.into(),
            current_value: current_value.max(0.0),
            history,
            threshold,
        }
    }

    pub fn current_value(&self) -> f64 {
        self.current_value
    }

    /// Store a new reading as the current value and append it to the history window.
    pub fn record(&mut self, value: f64, timestamp: DateTime<Utc>) {
        self.current_value = value.max(0.0);
        self.history.push(SensorReading {
            timestamp,
            value: self.current_value,
        });
    }
}

/// A logged critical event on one sensor. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// Lookup reference to the sensor within the owning asset.
    pub sensor_id: String,
    pub severity: HealthStatus,
    pub description: String,
}

/// Identification fields of an asset, fixed at seed time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetIdentity {
    pub id: String,
    pub name: String,
    pub location: String,
    pub city: City,
    pub coordinates: Coordinates,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub last_maintenance: NaiveDate,
}

/// A monitored infrastructure unit.
///
/// `health_score`, `status`, and `trend` are projections recomputed wholesale on
/// every tick through [`Asset::apply_assessment`]; there is no setter for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAsset")]
pub struct Asset {
    #[serde(flatten)]
    pub identity: AssetIdentity,
    sensors: Vec<Sensor>,
    health_score: f64,
    status: HealthStatus,
    trend: Trend,
    anomalies: AnomalyLog,
}

/// Wire form of [`Asset`]. A serialized `status` is ignored and re-derived
/// from `health_score`.
#[derive(Deserialize)]
struct RawAsset {
    #[serde(flatten)]
    identity: AssetIdentity,
    sensors: Vec<Sensor>,
    health_score: f64,
    trend: Trend,
    anomalies: AnomalyLog,
}

impl TryFrom<RawAsset> for Asset {
    type Error = SimError;

    fn try_from(raw: RawAsset) -> Result<Self> {
        let mut asset = Asset::new(raw.identity, raw.sensors, raw.health_score, raw.anomalies)?;
        asset.trend = raw.trend;
        Ok(asset)
    }
}

impl Asset {
    pub fn new(
        identity: AssetIdentity,
        sensors: Vec<Sensor>,
        health_score: f64,
        anomalies: AnomalyLog,
    ) -> Result<Self> {
        if sensors.is_empty() {
            return Err(SimError::NoSensors(identity.id));
        }
        let health_score = health_score.clamp(0.0, 100.0);
        Ok(Self {
            identity,
            sensors,
            health_score,
            status: HealthStatus::from_score(health_score),
            trend: Trend::Stable,
            anomalies,
        })
    }

    pub fn id(&self) -> &str {
        &self.identity.id
    }

    pub fn name(&self) -> &str {
        &self.identity.name
    }

    pub fn city(&self) -> City {
        self.identity.city
    }

    pub fn asset_type(&self) -> AssetType {
        self.identity.asset_type
    }

    pub fn sensors(&self) -> &[Sensor] {
        &self.sensors
    }

    pub(crate) fn sensors_mut(&mut self) -> &mut [Sensor] {
        &mut self.sensors
    }

    /// The sensor that drives the trend indicator and the compliance report.
    pub fn primary_sensor(&self) -> &Sensor {
        &self.sensors[0]
    }

    pub fn health_score(&self) -> f64 {
        self.health_score
    }

    pub fn status(&self) -> HealthStatus {
        self.status
    }

    pub fn trend(&self) -> Trend {
        self.trend
    }

    pub fn anomalies(&self) -> &AnomalyLog {
        &self.anomalies
    }

    pub(crate) fn anomalies_mut(&mut self) -> &mut AnomalyLog {
        &mut self.anomalies
    }

    pub fn apply_assessment(&mut self, assessment: HealthAssessment) {
        self.health_score = assessment.health_score;
        self.status = assessment.status;
        self.trend = assessment.trend;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reading(second: u32, value: f64) -> SensorReading {
        SensorReading {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, second).unwrap(),
            value,
        }
    }

    #[test]
    fn status_cut_points_are_exclusive() {
        assert_eq!(HealthStatus::from_score(100.0), HealthStatus::Healthy);
        assert_eq!(HealthStatus::from_score(86.0), HealthStatus::Healthy);
        assert_eq!(HealthStatus::from_score(85.0), HealthStatus::Warning);
        assert_eq!(HealthStatus::from_score(61.0), HealthStatus::Warning);
        assert_eq!(HealthStatus::from_score(60.0), HealthStatus::Critical);
        assert_eq!(HealthStatus::from_score(0.0), HealthStatus::Critical);
    }

    #[test]
    fn window_evicts_oldest_at_capacity() {
        let mut window = ReadingWindow::new(3).unwrap();
        for second in 0..5 {
            window.push(reading(second, f64::from(second)));
        }
        assert_eq!(window.len(), 3);
        let values: Vec<f64> = window.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0]);
        assert_eq!(window.latest().unwrap().value, 4.0);
    }

    #[test]
    fn zero_capacity_window_is_rejected() {
        assert_eq!(ReadingWindow::new(0), Err(SimError::EmptyHistoryWindow));
    }

    fn identity() -> AssetIdentity {
        AssetIdentity {
            id: "ASSET-X".into(),
            name: "Empty".into(),
            location: "Nowhere".into(),
            city: City::Chennai,
            coordinates: City::Chennai.center(),
            asset_type: AssetType::Building,
            last_maintenance: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        }
    }

    fn asset_json(health_score: f64) -> serde_json::Value {
        let mut history = ReadingWindow::new(3).unwrap();
        history.push(reading(0, 40.0));
        let sensor = Sensor::new(
            "SENSOR-1",
            "Load",
            "%",
            40.0,
            Threshold::new(0.0, 80.0, 0.1, 0.25).unwrap(),
            history,
        );
        let asset = Asset::new(identity(), vec![sensor], health_score, AnomalyLog::new(10)).unwrap();
        serde_json::to_value(&asset).unwrap()
    }

    #[test]
    fn asset_requires_sensors() {
        let result = Asset::new(identity(), Vec::new(), 100.0, AnomalyLog::new(10));
        assert_eq!(result, Err(SimError::NoSensors("ASSET-X".into())));
    }

    #[test]
    fn asset_json_round_trips() {
        let value = asset_json(72.0);
        assert_eq!(value["status"], "Warning");
        assert_eq!(value["type"], "Building");
        let asset: Asset = serde_json::from_value(value).unwrap();
        assert_eq!(asset.status(), HealthStatus::Warning);
        assert_eq!(asset.primary_sensor().history.len(), 1);
    }

    #[test]
    fn asset_json_without_sensors_is_rejected() {
        let mut value = asset_json(90.0);
        value["sensors"] = serde_json::json!([]);
        let err = serde_json::from_value::<Asset>(value).unwrap_err();
        assert!(err.to_string().contains("at least one sensor"), "{err}");
    }

    #[test]
    fn asset_json_status_is_derived_from_score() {
        let mut value = asset_json(90.0);
        value["health_score"] = serde_json::json!(10.0);
        value["status"] = serde_json::json!("Healthy");
        let asset: Asset = serde_json::from_value(value).unwrap();
        assert_eq!(asset.status(), HealthStatus::Critical);

        let mut value = asset_json(90.0);
        value["health_score"] = serde_json::json!(250.0);
        let asset: Asset = serde_json::from_value(value).unwrap();
        assert_eq!(asset.health_score(), 100.0);
    }

    #[test]
    fn window_json_with_zero_capacity_is_rejected() {
        let json = r#"{"capacity":0,"readings":[]}"#;
        let err = serde_json::from_str::<ReadingWindow>(json).unwrap_err();
        assert!(err.to_string().contains("at least one reading"), "{err}");
    }

    #[test]
    fn window_json_is_trimmed_to_capacity() {
        let mut wide = ReadingWindow::new(5).unwrap();
        for second in 0..5 {
            wide.push(reading(second, f64::from(second)));
        }
        let mut value = serde_json::to_value(&wide).unwrap();
        value["capacity"] = serde_json::json!(2);
        let window: ReadingWindow = serde_json::from_value(value).unwrap();
        let values: Vec<f64> = window.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![3.0, 4.0]);
    }

    #[test]
    fn labels_round_trip_through_strings() {
        assert_eq!(AssetType::WaterPipe.to_string(), "Water Pipe");
        assert_eq!("traffic-signal".parse::<AssetType>().unwrap(), AssetType::TrafficSignal);
        assert_eq!("coimbatore".parse::<City>().unwrap(), City::Coimbatore);
        assert_eq!(
            serde_json::to_string(&AssetType::TrafficSignal).unwrap(),
            "\"Traffic Signal\""
        );
        assert_eq!(Trend::Up.to_string(), "up");
    }
}
