//! ---
//! ug_section: "11-simulation"
//! ug_subsection: "module"
//! ug_type: "source"
//! ug_scope: "code"
//! ug_description: "Per-sensor perturbation, band classification, and anomaly emission."
//! ug_version: "v0.1.0"
//! ug_owner: "tbd"
//! ---
use chrono::{DateTime, Utc};

use crate::anomaly::AnomalyIdSource;
use crate::model::{Anomaly, HealthStatus, Sensor};
use crate::rng::RandomSource;
use crate::threshold::{SensorBand, Threshold};

/// Width of the symmetric fluctuation window (±5 units).
pub const FLUCTUATION_SPAN: f64 = 10.0;
/// A draw above this gate triggers a shock spike (2% of ticks).
pub const SPIKE_GATE: f64 = 0.98;
/// Spike magnitude as a fraction of the threshold maximum.
pub const SPIKE_FACTOR: f64 = 0.4;
/// A draw above this gate logs an anomaly for a critical reading (20%).
pub const ANOMALY_GATE: f64 = 0.8;

/// Result of advancing one sensor by one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorOutcome {
    pub sensor_id: String,
    pub previous_value: f64,
    pub value: f64,
    pub deviation: f64,
    pub band: SensorBand,
    pub anomaly: Option<Anomaly>,
}

impl SensorOutcome {
    pub fn penalty(&self) -> u32 {
        self.band.penalty()
    }
}

/// Perturb `current` with a symmetric fluctuation and, rarely, a shock spike.
///
/// Draws one value for the fluctuation and one for the spike gate; a passing
/// gate draws a third value for the spike direction. The result is never negative.
pub fn draw_next_value(current: f64, threshold: &Threshold, rng: &mut dyn RandomSource) -> f64 {
    let fluctuation = (rng.next_unit() - 0.5) * FLUCTUATION_SPAN;
    let mut value = current + fluctuation;
    if rng.next_unit() > SPIKE_GATE {
        let direction = if rng.next_unit() > 0.5 { 1.0 } else { -1.0 };
        value += direction * threshold.max() * SPIKE_FACTOR;
    }
    value.max(0.0)
}

/// Advance a sensor by one tick using randomly drawn telemetry.
pub fn advance(
    sensor: &mut Sensor,
    rng: &mut dyn RandomSource,
    ids: &mut AnomalyIdSource,
    now: DateTime<Utc>,
) -> SensorOutcome {
    let value = draw_next_value(sensor.current_value(), &sensor.threshold, rng);
    settle(sensor, value, rng, ids, now)
}

/// Classify an already-determined reading, record it, and maybe emit an anomaly.
///
/// The band penalty applies whether or not the anomaly gate passes; only the
/// critical band consumes a draw from `rng`.
pub fn settle(
    sensor: &mut Sensor,
    value: f64,
    rng: &mut dyn RandomSource,
    ids: &mut AnomalyIdSource,
    now: DateTime<Utc>,
) -> SensorOutcome {
    let previous_value = sensor.current_value();
    let value = value.max(0.0);
    let deviation = sensor.threshold.deviation(value);
    let band = sensor.threshold.classify(value);

    let anomaly = if band == SensorBand::Critical && rng.next_unit() > ANOMALY_GATE {
        Some(Anomaly {
            id: ids.next_id(),
            timestamp: now,
            sensor_id: sensor.id.clone(),
            severity: HealthStatus::Critical,
            description: format!("Severe deviation detected: {:.1} {}", value, sensor.unit),
        })
    } else {
        None
    };

    sensor.record(value, now);

    SensorOutcome {
        sensor_id: sensor.id.clone(),
        previous_value,
        value,
        deviation,
        band,
        anomaly,
    }
}
