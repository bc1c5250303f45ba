//! ---
//! ug_section: "01-core-functionality"
//! ug_subsection: "module"
//! ug_type: "source"
//! ug_scope: "code"
//! ug_description: "Simulation service lifecycle and fleet queries."
//! ug_version: "v0.1.0"
//! ug_owner: "tbd"
//! ---
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};
use ug_common::SimulationConfig;
use ug_sim::{
    step_asset, Anomaly, AnomalyIdSource, Asset, City, FleetSeeder, RandomSource, SeededRandom,
};

use crate::errors::{CoreError, Result};
use crate::observer::TickObserver;
use crate::query::{AnomalyEntry, AssetQuery, StatusCensus};
use crate::snapshot::FleetSnapshot;

const DEFAULT_NOTIFICATION_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    pub notification_limit: usize,
    pub default_city: City,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            notification_limit: DEFAULT_NOTIFICATION_LIMIT,
            default_city: City::Chennai,
        }
    }
}

impl ServiceSettings {
    pub fn from_config(config: &SimulationConfig) -> Result<Self> {
        Ok(Self {
            notification_limit: config.notification_limit,
            default_city: parse_city(&config.default_city)?,
        })
    }
}

pub fn parse_city(name: &str) -> Result<City> {
    name.trim()
        .parse::<City>()
        .map_err(|_| CoreError::UnknownCity(name.to_owned()))
}

struct TickState {
    rng: Box<dyn RandomSource>,
    generation: u64,
}

/// Owns the fleet and advances it one tick at a time.
///
/// Ticks are serialized by an internal mutex. Each tick copies the current
/// snapshot's assets, advances the copies, and publishes a fresh
/// [`FleetSnapshot`]; readers holding an older `Arc` keep a consistent view.
pub struct SimulationService {
    settings: ServiceSettings,
    tick_state: Mutex<TickState>,
    snapshot: RwLock<Arc<FleetSnapshot>>,
    selected_city: RwLock<City>,
    observers: RwLock<Vec<Arc<dyn TickObserver>>>,
}

impl fmt::Debug for SimulationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationService")
            .field("settings", &self.settings)
            .field("generation", &self.generation())
            .field("assets", &self.snapshot().len())
            .field("selected_city", &self.selected_city())
            .finish_non_exhaustive()
    }
}

impl SimulationService {
    pub fn new(
        assets: Vec<Asset>,
        rng: Box<dyn RandomSource>,
        settings: ServiceSettings,
    ) -> Result<Self> {
        let mut fleet = IndexMap::with_capacity(assets.len());
        for asset in assets {
            let id = asset.id().to_owned();
            if fleet.contains_key(&id) {
                return Err(CoreError::DuplicateAsset(id));
            }
            fleet.insert(id, Arc::new(asset));
        }
        let snapshot = FleetSnapshot::assemble(
            0,
            Utc::now(),
            fleet,
            Vec::new(),
            settings.notification_limit,
            std::time::Duration::ZERO,
        );
        Ok(Self {
            selected_city: RwLock::new(settings.default_city),
            settings,
            tick_state: Mutex::new(TickState { rng, generation: 0 }),
            snapshot: RwLock::new(Arc::new(snapshot)),
            observers: RwLock::new(Vec::new()),
        })
    }

    /// Seed the two-city fleet and wire the random source from configuration.
    pub fn from_config(config: &SimulationConfig) -> Result<Self> {
        let settings = ServiceSettings::from_config(config)?;
        let assets = FleetSeeder::new(config.history_window, config.anomaly_retention).seed()?;
        let rng: Box<dyn RandomSource> = match config.random_seed {
            Some(seed) => Box::new(SeededRandom::from_seed(seed)),
            None => Box::new(SeededRandom::from_entropy()),
        };
        let service = Self::new(assets, rng, settings)?;
        info!(
            assets = service.snapshot().len(),
            seeded = config.random_seed.is_some(),
            selected_city = %service.selected_city(),
            overall_health = service.current_overall_health(),
            "simulation service created"
        );
        Ok(service)
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    pub fn register_observer(&self, observer: Arc<dyn TickObserver>) {
        debug!(observer = observer.name(), "tick observer registered");
        self.observers.write().push(observer);
    }

    pub fn tick(&self) -> Arc<FleetSnapshot> {
        self.tick_at(Utc::now())
    }

    /// Advance every asset by one tick stamped `now` and publish the result.
    pub fn tick_at(&self, now: DateTime<Utc>) -> Arc<FleetSnapshot> {
        let started = Instant::now();
        let mut guard = self.tick_state.lock();
        let state = &mut *guard;
        let previous = self.snapshot();
        let generation = state.generation + 1;
        let mut ids = AnomalyIdSource::for_generation(generation);

        let mut emitted: Vec<Anomaly> = Vec::new();
        let mut assets = IndexMap::with_capacity(previous.len());
        for current in previous.assets() {
            let mut next = Asset::clone(current);
            let step = step_asset(&mut next, state.rng.as_mut(), &mut ids, now);
            emitted.extend(step.new_anomalies);
            assets.insert(next.id().to_owned(), Arc::new(next));
        }

        let snapshot = Arc::new(FleetSnapshot::assemble(
            generation,
            now,
            assets,
            emitted,
            self.settings.notification_limit,
            started.elapsed(),
        ));
        *self.snapshot.write() = snapshot.clone();
        state.generation = generation;

        self.notify_observers(&snapshot);
        snapshot
    }

    fn notify_observers(&self, snapshot: &FleetSnapshot) {
        let observers = self.observers.read().clone();
        for observer in observers {
            if let Err(err) = observer.on_tick(snapshot) {
                warn!(
                    observer = observer.name(),
                    generation = snapshot.generation(),
                    error = %err,
                    "tick observer failed"
                );
            }
        }
    }

    /// The latest committed snapshot.
    pub fn snapshot(&self) -> Arc<FleetSnapshot> {
        self.snapshot.read().clone()
    }

    pub fn generation(&self) -> u64 {
        self.snapshot().generation()
    }

    pub fn get_asset_by_id(&self, id: &str) -> Option<Arc<Asset>> {
        self.snapshot().get(id)
    }

    /// Like [`Self::get_asset_by_id`], for callers that need an error.
    pub fn require_asset(&self, id: &str) -> Result<Arc<Asset>> {
        self.get_asset_by_id(id)
            .ok_or_else(|| CoreError::UnknownAsset(id.to_owned()))
    }

    pub fn list_assets(&self, query: &AssetQuery) -> Vec<Arc<Asset>> {
        self.snapshot().list_assets(query)
    }

    pub fn current_overall_health(&self) -> u32 {
        self.snapshot().overall_health()
    }

    pub fn current_notifications(&self) -> Vec<Anomaly> {
        self.snapshot().notifications().to_vec()
    }

    pub fn set_selected_city(&self, city: City) {
        let previous = std::mem::replace(&mut *self.selected_city.write(), city);
        if previous != city {
            info!(from = %previous, to = %city, "selected city changed");
        }
    }

    pub fn selected_city(&self) -> City {
        *self.selected_city.read()
    }

    pub fn city_health(&self, city: City) -> u32 {
        self.snapshot().city_health(city)
    }

    pub fn status_census(&self, city: City) -> StatusCensus {
        self.snapshot().status_census(city)
    }

    pub fn city_recent_anomalies(&self, city: City, limit: usize) -> Vec<AnomalyEntry> {
        self.snapshot().city_recent_anomalies(city, limit)
    }

    pub fn risk_leaderboard(&self, city: City, limit: usize) -> Vec<Arc<Asset>> {
        self.snapshot().risk_leaderboard(city, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ug_sim::ScriptedRandom;

    #[test]
    fn duplicate_asset_ids_are_rejected() {
        let mut assets = FleetSeeder::default().seed().unwrap();
        let copy = assets[0].clone();
        assets.push(copy);
        let result = SimulationService::new(
            assets,
            Box::new(ScriptedRandom::quiet()),
            ServiceSettings::default(),
        );
        assert!(matches!(result, Err(CoreError::DuplicateAsset(id)) if id == "ASSET-CH-2000"));
    }

    #[test]
    fn unknown_default_city_is_rejected() {
        let config = SimulationConfig {
            default_city: "Madurai".into(),
            ..SimulationConfig::default()
        };
        assert!(matches!(
            ServiceSettings::from_config(&config),
            Err(CoreError::UnknownCity(_))
        ));
    }

    #[test]
    fn city_names_parse_case_insensitively() {
        assert_eq!(parse_city(" coimbatore ").unwrap(), City::Coimbatore);
        assert_eq!(parse_city("CHENNAI").unwrap(), City::Chennai);
    }
}
