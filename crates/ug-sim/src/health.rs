//! ---
//! ug_section: "11-simulation"
//! ug_subsection: "module"
//! ug_type: "source"
//! ug_scope: "code"
//! ug_description: "Asset health scoring, status derivation, and trend detection."
//! ug_version: "v0.1.0"
//! ug_owner: "tbd"
//! ---
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::anomaly::AnomalyIdSource;
use crate::model::{Anomaly, Asset, HealthStatus, Trend};
use crate::rng::RandomSource;
use crate::sensor::{advance, SensorOutcome};
use crate::threshold::SensorBand;

pub const BASELINE_SCORE: u32 = 100;
/// Relative change of the primary sensor that counts as a trend.
pub const TREND_BAND: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HealthAssessment {
    pub health_score: f64,
    pub status: HealthStatus,
    pub trend: Trend,
}

/// Score one tick from scratch: 100 minus every sensor's penalty, saturating at 0.
pub fn score_from_bands(bands: impl IntoIterator<Item = SensorBand>) -> f64 {
    let penalty: u32 = bands.into_iter().map(SensorBand::penalty).sum();
    f64::from(BASELINE_SCORE.saturating_sub(penalty))
}

pub fn trend_between(previous: f64, current: f64) -> Trend {
    if current > previous * (1.0 + TREND_BAND) {
        Trend::Up
    } else if current < previous * (1.0 - TREND_BAND) {
        Trend::Down
    } else {
        Trend::Stable
    }
}

/// Combine one tick's sensor outcomes (primary sensor first) into an assessment.
pub fn aggregate(outcomes: &[SensorOutcome]) -> HealthAssessment {
    let health_score = score_from_bands(outcomes.iter().map(|outcome| outcome.band));
    let trend = outcomes
        .first()
        .map(|primary| trend_between(primary.previous_value, primary.value))
        .unwrap_or(Trend::Stable);
    HealthAssessment {
        health_score,
        status: HealthStatus::from_score(health_score),
        trend,
    }
}

/// What one tick did to one asset.
#[derive(Debug, Clone)]
pub struct AssetStep {
    pub assessment: HealthAssessment,
    pub new_anomalies: Vec<Anomaly>,
}

/// Advance every sensor of `asset`, score it, and merge the results back in place.
pub fn step_asset(
    asset: &mut Asset,
    rng: &mut dyn RandomSource,
    ids: &mut AnomalyIdSource,
    now: DateTime<Utc>,
) -> AssetStep {
    let outcomes: Vec<SensorOutcome> = asset
        .sensors_mut()
        .iter_mut()
        .map(|sensor| advance(sensor, rng, ids, now))
        .collect();
    merge_outcomes(asset, outcomes)
}

/// Apply already-computed sensor outcomes to `asset`.
pub fn merge_outcomes(asset: &mut Asset, outcomes: Vec<SensorOutcome>) -> AssetStep {
    let assessment = aggregate(&outcomes);
    let new_anomalies: Vec<Anomaly> = outcomes
        .into_iter()
        .filter_map(|outcome| outcome.anomaly)
        .collect();
    asset.apply_assessment(assessment);
    asset.anomalies_mut().record_all(new_anomalies.iter().cloned());
    AssetStep {
        assessment,
        new_anomalies,
    }
}
