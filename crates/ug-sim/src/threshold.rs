//! ---
//! ug_section: "11-simulation"
//! ug_subsection: "module"
//! ug_type: "source"
//! ug_scope: "code"
//! ug_description: "Sensor safe-band thresholds and deviation classification."
//! ug_version: "v0.1.0"
//! ug_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SimError};

/// Safe operating band of a sensor together with its deviation tolerances.
///
/// Deviation fractions are relative to the band edge that was crossed, so a
/// `critical_deviation` of `0.25` on a band with `max = 80` trips above `100`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawThreshold")]
pub struct Threshold {
    min: f64,
    max: f64,
    warning_deviation: f64,
    critical_deviation: f64,
}

#[derive(Deserialize)]
struct RawThreshold {
    min: f64,
    max: f64,
    warning_deviation: f64,
    critical_deviation: f64,
}

impl TryFrom<RawThreshold> for Threshold {
    type Error = SimError;

    fn try_from(raw: RawThreshold) -> Result<Self> {
        Threshold::new(
            raw.min,
            raw.max,
            raw.warning_deviation,
            raw.critical_deviation,
        )
    }
}

impl Threshold {
    pub fn new(min: f64, max: f64, warning_deviation: f64, critical_deviation: f64) -> Result<Self> {
        if !(min.is_finite() && max.is_finite()) {
            return Err(SimError::InvalidThreshold(
                "band edges must be finite".to_owned(),
            ));
        }
        if min < 0.0 {
            return Err(SimError::InvalidThreshold(format!(
                "min {min} must not be negative"
            )));
        }
        if min >= max {
            return Err(SimError::InvalidThreshold(format!(
                "min {min} must be below max {max}"
            )));
        }
        if !(warning_deviation > 0.0 && critical_deviation > 0.0) {
            return Err(SimError::InvalidThreshold(
                "deviation fractions must be positive".to_owned(),
            ));
        }
        if critical_deviation <= warning_deviation {
            return Err(SimError::InvalidThreshold(format!(
                "critical deviation {critical_deviation} must exceed warning deviation {warning_deviation}"
            )));
        }
        Ok(Self {
            min,
            max,
            warning_deviation,
            critical_deviation,
        })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn warning_deviation(&self) -> f64 {
        self.warning_deviation
    }

    pub fn critical_deviation(&self) -> f64 {
        self.critical_deviation
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    /// Fractional distance outside the band; non-positive inside `[min, max]`.
    ///
    /// Excursions above `max` and below `min` are measured independently and the
    /// more severe one wins.
    pub fn deviation(&self, value: f64) -> f64 {
        let above = (value - self.max) / self.max;
        let below = if self.min > 0.0 {
            (self.min - value) / self.min
        } else {
            f64::NEG_INFINITY
        };
        above.max(below)
    }

    pub fn classify(&self, value: f64) -> SensorBand {
        let deviation = self.deviation(value);
        if deviation > self.critical_deviation {
            SensorBand::Critical
        } else if deviation > self.warning_deviation {
            SensorBand::Warning
        } else {
            SensorBand::Nominal
        }
    }
}

/// Per-tick classification of one sensor reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorBand {
    Nominal,
    Warning,
    Critical,
}

impl SensorBand {
    /// Health points deducted from the asset for this tick.
    pub fn penalty(self) -> u32 {
        match self {
            SensorBand::Nominal => 0,
            SensorBand::Warning => 10,
            SensorBand::Critical => 30,
        }
    }
}
