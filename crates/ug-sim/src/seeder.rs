//! ---
//! ug_section: "11-simulation"
//! ug_subsection: "module"
//! ug_type: "source"
//! ug_scope: "code"
//! ug_description: "Deterministic cold-start fleet for the two monitored cities."
//! ug_version: "v0.1.0"
//! ug_owner: "tbd"
//! ---
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use strum::IntoEnumIterator;
use tracing::debug;

use crate::anomaly::{AnomalyLog, DEFAULT_ANOMALY_RETENTION};
use crate::errors::Result;
use crate::model::{
    Anomaly, Asset, AssetIdentity, AssetType, City, Coordinates, HealthStatus, ReadingWindow,
    Sensor, SensorReading, DEFAULT_HISTORY_WINDOW,
};
use crate::threshold::Threshold;

const WARNING_DEVIATION: f64 = 0.1;
const CRITICAL_DEVIATION: f64 = 0.25;

const SEED_HEALTHY_SCORE: f64 = 98.0;
const SEED_WARNING_SCORE: f64 = 74.0;
const SEED_CRITICAL_SCORE: f64 = 42.0;

/// Named asset in the static city catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub asset_type: AssetType,
    pub location: &'static str,
}

const fn entry(name: &'static str, asset_type: AssetType, location: &'static str) -> CatalogEntry {
    CatalogEntry {
        name,
        asset_type,
        location,
    }
}

const CHENNAI_CATALOG: &[CatalogEntry] = &[
    entry("Kathipara Flyover", AssetType::Bridge, "Guindy"),
    entry("Napier Bridge", AssetType::Bridge, "Marina Beach"),
    entry("Adyar Bridge", AssetType::Bridge, "Adyar"),
    entry("Koyambedu Metro Hub", AssetType::Building, "Koyambedu"),
    entry("Thiruvanmiyur MRTS", AssetType::Building, "Thiruvanmiyur"),
    entry("Taramani Substation", AssetType::Transformer, "Taramani"),
    entry("Chembarambakkam Lake Intake", AssetType::WaterPipe, "Poonamallee"),
    entry("Kilpauk Pumping Station", AssetType::WaterPipe, "Kilpauk"),
    entry("Anna Salai Traffic Grid", AssetType::TrafficSignal, "Teynampet"),
    entry("Marina Beach Signal", AssetType::TrafficSignal, "Triplicane"),
    entry("Gem Flyover", AssetType::Bridge, "Nungambakkam"),
    entry("Velachery Flyover", AssetType::Bridge, "Velachery"),
    entry("Perambur Loco Works", AssetType::Building, "Perambur"),
    entry("Chennai Central Terminal", AssetType::Building, "Park Town"),
    entry("Egmore Station Terminal", AssetType::Building, "Egmore"),
    entry("Mylapore TNEB Grid", AssetType::Transformer, "Mylapore"),
    entry("Kodambakkam Main Pipeline", AssetType::WaterPipe, "Kodambakkam"),
    entry("Porur Flyover Bridge", AssetType::Bridge, "Porur"),
    entry("Chromepet Footbridge", AssetType::Bridge, "Chromepet"),
    entry("Tambaram Junction Signal", AssetType::TrafficSignal, "Tambaram"),
    entry("OMR Sholinganallur Grid", AssetType::TrafficSignal, "Sholinganallur"),
    entry("Nemmeli Desalination Plant", AssetType::Building, "Nemmeli"),
    entry("Minjur Desalination Plant", AssetType::Building, "Minjur"),
    entry("T. Nagar Power Grid", AssetType::Transformer, "T. Nagar"),
    entry("Mount Road Signal Grid", AssetType::TrafficSignal, "Little Mount"),
    entry("IT Expressway Flyover", AssetType::Bridge, "OMR"),
    entry("Ennore Power Plant", AssetType::Building, "Ennore"),
    entry("Royapuram Overbridge", AssetType::Bridge, "Royapuram"),
    entry("Saidapet Metro Station", AssetType::Building, "Saidapet"),
    entry("Ekkaduthangal Bridge", AssetType::Bridge, "Ekkaduthangal"),
    entry("Puzhal Reservoir Pipeline", AssetType::WaterPipe, "Puzhal"),
    entry("Avadi HVF Grid", AssetType::Transformer, "Avadi"),
    entry("Guindy Industrial Signal", AssetType::TrafficSignal, "Guindy"),
    entry("Ashok Nagar Main Intake", AssetType::WaterPipe, "Ashok Nagar"),
    entry("CMBT Koyambedu Terminal", AssetType::Building, "Koyambedu"),
    entry("Besant Nagar Pumping Station", AssetType::WaterPipe, "Besant Nagar"),
    entry("Anna Nagar Tower Water Line", AssetType::WaterPipe, "Anna Nagar"),
    entry("Red Hills Supply Line", AssetType::WaterPipe, "Red Hills"),
];

const COIMBATORE_CATALOG: &[CatalogEntry] = &[
    entry("Gandhipuram Flyover", AssetType::Bridge, "Gandhipuram"),
    entry("Avinashi Road Flyover", AssetType::Bridge, "Peelamedu"),
    entry("Ukkadam Flyover", AssetType::Bridge, "Ukkadam"),
    entry("Brookefields Power Node", AssetType::Transformer, "RS Puram"),
    entry("Siruvani Pipeline Alpha", AssetType::WaterPipe, "Alandurai"),
    entry("Pillur Water Intake", AssetType::WaterPipe, "Mettupalayam Rd"),
    entry("Coimbatore Junction Terminal", AssetType::Building, "City Center"),
    entry("TNAU Grid Substation", AssetType::Transformer, "TNAU Campus"),
    entry("Peelamedu Substation", AssetType::Transformer, "Peelamedu"),
    entry("L&T Bypass Signal", AssetType::TrafficSignal, "L&T Bypass"),
    entry("Saravanampatti IT Grid", AssetType::TrafficSignal, "Saravanampatti"),
    entry("Singanallur Lake Intake", AssetType::WaterPipe, "Singanallur"),
    entry("Ganapathy Main Supply", AssetType::WaterPipe, "Ganapathy"),
    entry("Ramanathapuram Signal", AssetType::TrafficSignal, "Ramanathapuram"),
    entry("Thudiyalur Power Node", AssetType::Transformer, "Thudiyalur"),
    entry("North Coimbatore Flyover", AssetType::Bridge, "North CBE"),
    entry("Podanur Junction", AssetType::Building, "Podanur"),
    entry("Sulur Airforce Grid", AssetType::Transformer, "Sulur"),
    entry("Vadavalli Water Line", AssetType::WaterPipe, "Vadavalli"),
    entry("Town Hall Market Signal", AssetType::TrafficSignal, "Town Hall"),
];

/// Safe band and labelling of the primary sensor fitted to an asset type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorProfile {
    pub min: f64,
    pub max: f64,
    pub sensor_name: &'static str,
    pub unit: &'static str,
}

const STRAIN: SensorProfile = SensorProfile {
    min: 10.0,
    max: 100.0,
    sensor_name: "Strain",
    unit: "μm/m",
};

const SENSOR_PROFILES: &[(AssetType, SensorProfile)] = &[
    (
        AssetType::Bridge,
        SensorProfile {
            min: 20.0,
            max: 80.0,
            ..STRAIN
        },
    ),
    (
        AssetType::Transformer,
        SensorProfile {
            min: 40.0,
            max: 120.0,
            sensor_name: "Temp",
            unit: "°C",
        },
    ),
    (
        AssetType::WaterPipe,
        SensorProfile {
            sensor_name: "PSI",
            unit: "PSI",
            ..STRAIN
        },
    ),
];

/// A dated incident that predates the simulation, attached to a named asset.
#[derive(Debug, Clone, Copy)]
struct RecordedIncident {
    asset: &'static str,
    timestamp: &'static str,
    reading: f64,
}

/// Most recent first, per asset.
const RECORDED_INCIDENTS: &[RecordedIncident] = &[
    RecordedIncident {
        asset: "Gandhipuram Flyover",
        timestamp: "2026-02-28T02:34:13Z",
        reading: 101.5,
    },
    RecordedIncident {
        asset: "Gandhipuram Flyover",
        timestamp: "2026-02-28T02:34:10Z",
        reading: 100.2,
    },
];

impl SensorProfile {
    pub fn for_type(asset_type: AssetType) -> SensorProfile {
        SENSOR_PROFILES
            .iter()
            .find(|(kind, _)| *kind == asset_type)
            .map(|(_, profile)| *profile)
            .unwrap_or(STRAIN)
    }

    pub fn threshold(&self) -> Result<Threshold> {
        Threshold::new(self.min, self.max, WARNING_DEVIATION, CRITICAL_DEVIATION)
    }
}

/// Builds the cold-start fleet. Every value is derived from the catalog index,
/// so the same fleet comes back on every start.
#[derive(Debug, Clone)]
pub struct FleetSeeder {
    history_window: usize,
    anomaly_retention: usize,
}

impl Default for FleetSeeder {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_WINDOW, DEFAULT_ANOMALY_RETENTION)
    }
}

impl FleetSeeder {
    pub fn new(history_window: usize, anomaly_retention: usize) -> Self {
        Self {
            history_window,
            anomaly_retention,
        }
    }

    pub fn catalog(city: City) -> &'static [CatalogEntry] {
        match city {
            City::Chennai => CHENNAI_CATALOG,
            City::Coimbatore => COIMBATORE_CATALOG,
        }
    }

    /// Seed every city in declaration order.
    pub fn seed(&self) -> Result<Vec<Asset>> {
        let mut fleet = Vec::new();
        for city in City::iter() {
            fleet.extend(self.seed_city(city, Self::catalog(city))?);
        }
        debug!(assets = fleet.len(), "fleet seeded");
        Ok(fleet)
    }

    pub fn seed_city(&self, city: City, catalog: &[CatalogEntry]) -> Result<Vec<Asset>> {
        catalog
            .iter()
            .enumerate()
            .map(|(index, entry)| self.seed_asset(city, index, entry))
            .collect()
    }

    fn seed_asset(&self, city: City, index: usize, entry: &CatalogEntry) -> Result<Asset> {
        let profile = SensorProfile::for_type(entry.asset_type);
        let threshold = profile.threshold()?;
        let health_score = seeded_score(index);
        let status = HealthStatus::from_score(health_score);

        let sensor_id = format!("sensor-{}-{}-1", city.slug(), index);
        let initial_value = match status {
            HealthStatus::Critical => threshold.max() * 1.3,
            HealthStatus::Warning => threshold.max() * 1.1,
            HealthStatus::Healthy => threshold.midpoint(),
        };
        let sensor = Sensor::new(
            sensor_id.clone(),
            profile.sensor_name,
            profile.unit,
            initial_value,
            threshold,
            self.seeded_history(threshold.midpoint())?,
        );

        let incidents = if status == HealthStatus::Critical {
            seeded_incidents(city, index, entry.name, &sensor_id, profile.unit)
        } else {
            Vec::new()
        };

        let identity = AssetIdentity {
            id: format!("ASSET-{}-{}", city.id_prefix(), 2000 + index),
            name: entry.name.to_owned(),
            location: entry.location.to_owned(),
            city,
            coordinates: scatter(city, index),
            asset_type: entry.asset_type,
            last_maintenance: last_maintenance(),
        };
        Asset::new(
            identity,
            vec![sensor],
            health_score,
            AnomalyLog::with_entries(self.anomaly_retention, incidents),
        )
    }

    /// Hourly readings at the band midpoint, ending at the seed epoch.
    fn seeded_history(&self, value: f64) -> Result<ReadingWindow> {
        let mut window = ReadingWindow::new(self.history_window)?;
        let end = seed_epoch();
        for hours_back in (0..self.history_window).rev() {
            window.push(SensorReading {
                timestamp: end - Duration::hours(hours_back as i64),
                value,
            });
        }
        Ok(window)
    }
}

/// Opening incident log of a critical asset: its recorded incidents when it
/// has any, otherwise one generic stress event at the seed epoch.
fn seeded_incidents(
    city: City,
    index: usize,
    name: &str,
    sensor_id: &str,
    unit: &str,
) -> Vec<Anomaly> {
    let recorded: Vec<Anomaly> = RECORDED_INCIDENTS
        .iter()
        .filter(|incident| incident.asset == name)
        .enumerate()
        .map(|(ordinal, incident)| Anomaly {
            id: format!("INIT-ANOM-{}-{}-{}", city.slug(), index, ordinal + 1),
            timestamp: incident
                .timestamp
                .parse::<DateTime<Utc>>()
                .unwrap_or_else(|_| seed_epoch()),
            sensor_id: sensor_id.to_owned(),
            severity: HealthStatus::Critical,
            description: format!("Severe deviation detected: {:.1} {unit}", incident.reading),
        })
        .collect();
    if !recorded.is_empty() {
        return recorded;
    }
    vec![Anomaly {
        id: format!("INIT-ANOM-{}-{}", city.slug(), index),
        timestamp: seed_epoch(),
        sensor_id: sensor_id.to_owned(),
        severity: HealthStatus::Critical,
        description: format!("Structural stress detected at {city} Metropolitan node."),
    }]
}

fn seeded_score(index: usize) -> f64 {
    if index % 7 == 0 {
        SEED_CRITICAL_SCORE
    } else if index % 5 == 0 {
        SEED_WARNING_SCORE
    } else {
        SEED_HEALTHY_SCORE
    }
}

/// Visual scatter around the city center; not a geographic distribution.
fn scatter(city: City, index: usize) -> Coordinates {
    let center = city.center();
    let (lat_scale, lng_scale) = city.scatter_scale();
    let lat_offset = ((index * 17) % 100) as f64 / 1000.0 - 0.05;
    let lng_offset = ((index * 23) % 100) as f64 / 1000.0 - 0.05;
    Coordinates {
        lat: center.lat + lat_offset * lat_scale,
        lng: center.lng + lng_offset * lng_scale,
    }
}

fn seed_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

fn last_maintenance() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 15).unwrap_or_default()
}
