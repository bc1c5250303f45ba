//! ---
//! ug_section: "01-core-functionality"
//! ug_subsection: "tests"
//! ug_type: "source"
//! ug_scope: "code"
//! ug_description: "Simulation service integration tests."
//! ug_version: "v0.1.0"
//! ug_owner: "tbd"
//! ---
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use ug_common::SimulationConfig;
use ug_core::{
    new_registry, AssetQuery, CoreError, FleetSnapshot, ServiceSettings, SimulationMetrics,
    SimulationService, SortOrder, TickObserver, EMPTY_FLEET_HEALTH,
};
use ug_sim::{
    Anomaly, AnomalyLog, Asset, AssetIdentity, AssetType, City, FleetSeeder, HealthStatus,
    ReadingWindow, ScriptedRandom, Sensor, Threshold,
};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
}

fn seeded_service(seed: u64) -> SimulationService {
    let config = SimulationConfig {
        random_seed: Some(seed),
        ..SimulationConfig::default()
    };
    SimulationService::from_config(&config).unwrap()
}

fn single_bridge(value: f64) -> Asset {
    let sensor = Sensor::new(
        "sensor-chennai-0-1",
        "Strain",
        "μm/m",
        value,
        Threshold::new(20.0, 80.0, 0.1, 0.25).unwrap(),
        ReadingWindow::new(20).unwrap(),
    );
    let identity = AssetIdentity {
        id: "ASSET-CH-2000".into(),
        name: "Kathipara Flyover".into(),
        location: "Guindy".into(),
        city: City::Chennai,
        coordinates: City::Chennai.center(),
        asset_type: AssetType::Bridge,
        last_maintenance: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
    };
    Asset::new(identity, vec![sensor], 100.0, AnomalyLog::new(10)).unwrap()
}

fn expected_mean(snapshot: &FleetSnapshot) -> u32 {
    if snapshot.is_empty() {
        return EMPTY_FLEET_HEALTH;
    }
    let total: f64 = snapshot.assets().map(|asset| asset.health_score()).sum();
    (total / snapshot.len() as f64).round() as u32
}

#[test]
fn seeded_services_tick_identically() {
    let left = seeded_service(42);
    let right = seeded_service(42);
    for step in 0..40 {
        let now = start() + Duration::seconds(3 * step);
        let a = left.tick_at(now);
        let b = right.tick_at(now);
        assert_eq!(a.generation(), b.generation());
        assert_eq!(a.overall_health(), b.overall_health());
        assert_eq!(a.notifications(), b.notifications());
        assert_eq!(a.emitted(), b.emitted());
        for (x, y) in a.assets().zip(b.assets()) {
            assert_eq!(x.as_ref(), y.as_ref());
        }
    }
}

#[test]
fn invariants_hold_across_many_ticks() {
    let service = seeded_service(7);
    for step in 0..200 {
        let snapshot = service.tick_at(start() + Duration::seconds(3 * step));
        assert_eq!(snapshot.overall_health(), expected_mean(&snapshot));
        assert!(snapshot.notifications().len() <= 5);
        for asset in snapshot.assets() {
            let score = asset.health_score();
            assert!((0.0..=100.0).contains(&score));
            assert_eq!(asset.status(), HealthStatus::from_score(score));
            assert!(asset.anomalies().len() <= 10);
            for sensor in asset.sensors() {
                assert!(sensor.current_value() >= 0.0);
                assert_eq!(sensor.history.len(), 20);
            }
        }
        for anomaly in snapshot.notifications() {
            assert_eq!(anomaly.severity, HealthStatus::Critical);
        }
    }
    assert_eq!(service.generation(), 200);
}

#[test]
fn forced_spike_on_nominal_bridge_lands_in_warning() {
    // fluctuation 0, spike gate passes, spike upward, anomaly gate closed: 78 + 32 = 110
    let rng = ScriptedRandom::new([0.5, 0.99, 0.9, 0.1], 0.5);
    let service = SimulationService::new(
        vec![single_bridge(78.0)],
        Box::new(rng),
        ServiceSettings::default(),
    )
    .unwrap();

    let snapshot = service.tick_at(start());
    let asset = snapshot.get("ASSET-CH-2000").unwrap();
    assert!((asset.primary_sensor().current_value() - 110.0).abs() < 1e-9);
    assert_eq!(asset.health_score(), 70.0);
    assert_eq!(asset.status(), HealthStatus::Warning);
    assert!(asset.anomalies().is_empty());
    assert_eq!(snapshot.overall_health(), 70);
}

#[test]
fn open_anomaly_gate_logs_and_notifies() {
    let rng = ScriptedRandom::new([0.5, 0.99, 0.9, 0.95], 0.5);
    let service = SimulationService::new(
        vec![single_bridge(78.0)],
        Box::new(rng),
        ServiceSettings::default(),
    )
    .unwrap();

    let snapshot = service.tick_at(start());
    assert_eq!(snapshot.emitted().len(), 1);
    let anomaly = &snapshot.emitted()[0];
    assert_eq!(anomaly.id, "ANOM-000001-0001");
    assert_eq!(anomaly.timestamp, start());
    assert_eq!(anomaly.description, "Severe deviation detected: 110.0 μm/m");
    assert_eq!(service.current_notifications(), vec![anomaly.clone()]);
}

#[test]
fn published_snapshots_are_never_mutated() {
    let service = seeded_service(3);
    let before = service.snapshot();
    let values: Vec<f64> = before
        .assets()
        .map(|asset| asset.primary_sensor().current_value())
        .collect();
    for step in 0..10 {
        service.tick_at(start() + Duration::seconds(step));
    }
    assert_eq!(before.generation(), 0);
    let unchanged: Vec<f64> = before
        .assets()
        .map(|asset| asset.primary_sensor().current_value())
        .collect();
    assert_eq!(values, unchanged);
    assert_eq!(service.generation(), 10);
}

#[test]
fn empty_fleet_and_empty_city_report_full_health() {
    let service = SimulationService::new(
        Vec::new(),
        Box::new(ScriptedRandom::quiet()),
        ServiceSettings::default(),
    )
    .unwrap();
    assert_eq!(service.current_overall_health(), 100);
    assert_eq!(service.tick().overall_health(), 100);

    let chennai_only = FleetSeeder::default()
        .seed_city(City::Chennai, FleetSeeder::catalog(City::Chennai))
        .unwrap();
    let service = SimulationService::new(
        chennai_only,
        Box::new(ScriptedRandom::quiet()),
        ServiceSettings::default(),
    )
    .unwrap();
    assert_eq!(service.city_health(City::Coimbatore), 100);
    assert_eq!(service.status_census(City::Coimbatore).total(), 0);
    assert!(service.risk_leaderboard(City::Coimbatore, 10).is_empty());
}

#[test]
fn seeded_fleet_health_before_first_tick() {
    let service = seeded_service(1);
    let snapshot = service.snapshot();
    assert_eq!(snapshot.len(), 58);
    assert_eq!(snapshot.overall_health(), expected_mean(&snapshot));
    // every seeded critical asset carries one incident, flattened in seed order
    let ids: Vec<&str> = snapshot.notifications().iter().map(|a| a.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "INIT-ANOM-chennai-0",
            "INIT-ANOM-chennai-7",
            "INIT-ANOM-chennai-14",
            "INIT-ANOM-chennai-21",
            "INIT-ANOM-chennai-28",
        ]
    );
    let census = service.status_census(City::Chennai);
    assert_eq!(census.critical, 6);
    assert_eq!(census.warning, 6);
    assert_eq!(census.healthy, 26);
}

#[test]
fn listing_filters_and_sorts() {
    let service = seeded_service(11);
    service.tick_at(start());

    let critical_first = service.list_assets(&AssetQuery::for_city(City::Chennai));
    assert_eq!(critical_first.len(), 38);
    assert!(critical_first
        .windows(2)
        .all(|pair| pair[0].health_score() <= pair[1].health_score()));

    let healthiest_first = service.list_assets(&AssetQuery {
        sort: SortOrder::HealthiestFirst,
        ..AssetQuery::default()
    });
    assert_eq!(healthiest_first.len(), 58);
    assert!(healthiest_first
        .windows(2)
        .all(|pair| pair[0].health_score() >= pair[1].health_score()));

    let alphabetical = service.list_assets(&AssetQuery {
        city: Some(City::Coimbatore),
        sort: SortOrder::Alphabetical,
        ..AssetQuery::default()
    });
    assert!(alphabetical.windows(2).all(|pair| pair[0].name() <= pair[1].name()));
    assert_eq!(alphabetical[0].name(), "Avinashi Road Flyover");

    let pipes = service.list_assets(&AssetQuery {
        city: Some(City::Coimbatore),
        asset_type: Some(AssetType::WaterPipe),
        ..AssetQuery::default()
    });
    assert_eq!(pipes.len(), 5);
    assert!(pipes.iter().all(|asset| asset.asset_type() == AssetType::WaterPipe));

    let warnings = service.list_assets(&AssetQuery {
        status: Some(HealthStatus::Warning),
        ..AssetQuery::default()
    });
    assert!(warnings.iter().all(|asset| asset.status() == HealthStatus::Warning));
}

#[test]
fn city_recent_anomalies_are_chronological() {
    let rng = ScriptedRandom::new([0.5, 0.99, 0.9, 0.95], 0.5);
    let mut assets = FleetSeeder::default()
        .seed_city(City::Chennai, FleetSeeder::catalog(City::Chennai))
        .unwrap();
    assets.truncate(8);
    let service = SimulationService::new(assets, Box::new(rng), ServiceSettings::default()).unwrap();
    service.tick_at(start());

    let recent = service.city_recent_anomalies(City::Chennai, 5);
    assert_eq!(recent.len(), 3);
    assert_eq!(recent[0].anomaly.timestamp, start());
    assert_eq!(recent[0].asset_id, "ASSET-CH-2000");
    assert!(recent
        .windows(2)
        .all(|pair| pair[0].anomaly.timestamp >= pair[1].anomaly.timestamp));
}

#[test]
fn unknown_asset_lookup() {
    let service = seeded_service(5);
    assert!(service.get_asset_by_id("ASSET-XX-0").is_none());
    assert!(matches!(
        service.require_asset("ASSET-XX-0"),
        Err(CoreError::UnknownAsset(id)) if id == "ASSET-XX-0"
    ));
    assert_eq!(
        service.require_asset("ASSET-CBE-2003").unwrap().name(),
        "Brookefields Power Node"
    );
}

#[test]
fn selected_city_does_not_affect_simulation() {
    let left = seeded_service(9);
    let right = seeded_service(9);
    assert_eq!(left.selected_city(), City::Chennai);
    left.set_selected_city(City::Coimbatore);
    assert_eq!(left.selected_city(), City::Coimbatore);
    let a = left.tick_at(start());
    let b = right.tick_at(start());
    assert_eq!(a.overall_health(), b.overall_health());
}

struct CountingObserver(AtomicUsize);

impl TickObserver for CountingObserver {
    fn name(&self) -> &str {
        "counting"
    }

    fn on_tick(&self, _snapshot: &FleetSnapshot) -> anyhow::Result<()> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FailingObserver;

impl TickObserver for FailingObserver {
    fn name(&self) -> &str {
        "failing"
    }

    fn on_tick(&self, _snapshot: &FleetSnapshot) -> anyhow::Result<()> {
        anyhow::bail!("sink unavailable")
    }
}

#[test]
fn observer_failures_do_not_stop_ticks() {
    let service = seeded_service(13);
    let counter = Arc::new(CountingObserver(AtomicUsize::new(0)));
    service.register_observer(Arc::new(FailingObserver));
    service.register_observer(counter.clone());
    for step in 0..3 {
        service.tick_at(start() + Duration::seconds(step));
    }
    assert_eq!(counter.0.load(Ordering::SeqCst), 3);
    assert_eq!(service.generation(), 3);
}

#[test]
fn metrics_observer_exports_tick_state() {
    let service = seeded_service(17);
    let registry = new_registry();
    let metrics = SimulationMetrics::new(registry.clone()).unwrap();
    service.register_observer(Arc::new(metrics));
    let snapshot = service.tick_at(start());

    let families = registry.gather();
    let value = |name: &str| {
        families
            .iter()
            .find(|family| family.get_name() == name)
            .map(|family| family.get_metric().to_vec())
            .unwrap()
    };
    assert_eq!(value("urbanguard_ticks_total")[0].get_counter().get_value(), 1.0);
    assert_eq!(
        value("urbanguard_overall_health")[0].get_gauge().get_value(),
        f64::from(snapshot.overall_health())
    );
    let per_status: f64 = value("urbanguard_assets")
        .iter()
        .map(|metric| metric.get_gauge().get_value())
        .sum();
    assert_eq!(per_status, 58.0);
}

#[test]
fn anomaly_log_is_capped_at_retention() {
    // every draw at 0.99: upward spike on every tick and the anomaly gate always open
    let service = SimulationService::new(
        FleetSeeder::default()
            .seed_city(City::Chennai, &FleetSeeder::catalog(City::Chennai)[..1])
            .unwrap(),
        Box::new(ScriptedRandom::new(std::iter::empty(), 0.99)),
        ServiceSettings::default(),
    )
    .unwrap();
    for step in 0..15 {
        let snapshot = service.tick_at(start() + Duration::seconds(step));
        assert_eq!(snapshot.emitted().len(), 1);
    }
    let asset = service.get_asset_by_id("ASSET-CH-2000").unwrap();
    assert_eq!(asset.anomalies().len(), 10);
    assert_eq!(asset.anomalies().latest().unwrap().id, "ANOM-000015-0001");
    assert!(asset
        .anomalies()
        .iter()
        .all(|anomaly: &Anomaly| !anomaly.id.starts_with("INIT-ANOM")));
}
