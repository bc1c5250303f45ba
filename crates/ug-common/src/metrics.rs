//! ---
//! ug_section: "01-core-functionality"
//! ug_subsection: "module"
//! ug_type: "source"
//! ug_scope: "code"
//! ug_description: "Tick timing and jitter tracking."
//! ug_version: "v0.1.0"
//! ug_owner: "tbd"
//! ---
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;

/// Collects absolute deviations between the observed and the target tick period.
#[derive(Debug, Default)]
pub struct JitterHistogram {
    samples: Mutex<Vec<f64>>,
}

impl JitterHistogram {
    pub fn record(&self, jitter: Duration) {
        self.samples.lock().push(jitter.as_secs_f64() * 1_000.0);
    }

    pub fn summary(&self) -> Option<JitterSummary> {
        let samples = self.samples.lock();
        if samples.is_empty() {
            return None;
        }
        let count = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / count;
        let variance = if samples.len() > 1 {
            samples
                .iter()
                .map(|value| {
                    let delta = value - mean;
                    delta * delta
                })
                .sum::<f64>()
                / (count - 1.0)
        } else {
            0.0
        };
        Some(JitterSummary {
            mean_ms: mean,
            std_dev_ms: variance.sqrt(),
            max_ms: samples.iter().copied().fold(f64::MIN, f64::max),
            min_ms: samples.iter().copied().fold(f64::MAX, f64::min),
            samples: samples.len() as u64,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JitterSummary {
    pub mean_ms: f64,
    pub std_dev_ms: f64,
    pub max_ms: f64,
    pub min_ms: f64,
    pub samples: u64,
}

/// Measures the spacing of simulation ticks against the configured interval.
#[derive(Debug)]
pub struct TickTimingReporter {
    target_interval: Duration,
    last_tick: Mutex<Option<Instant>>,
    histogram: JitterHistogram,
}

impl TickTimingReporter {
    pub fn new(target_interval: Duration) -> Self {
        Self {
            target_interval,
            last_tick: Mutex::new(None),
            histogram: JitterHistogram::default(),
        }
    }

    pub fn target_interval(&self) -> Duration {
        self.target_interval
    }

    /// Record a tick at `now`, returning the jitter against the previous tick.
    pub fn record_tick_at(&self, now: Instant) -> Option<Duration> {
        let mut last_tick = self.last_tick.lock();
        let jitter = last_tick.map(|previous| {
            let actual = now.saturating_duration_since(previous);
            if actual > self.target_interval {
                actual - self.target_interval
            } else {
                self.target_interval - actual
            }
        });
        if let Some(jitter) = jitter {
            self.histogram.record(jitter);
        }
        *last_tick = Some(now);
        jitter
    }

    pub fn record_tick(&self) -> Option<Duration> {
        self.record_tick_at(Instant::now())
    }

    pub fn histogram(&self) -> &JitterHistogram {
        &self.histogram
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_has_no_jitter() {
        let reporter = TickTimingReporter::new(Duration::from_millis(100));
        assert!(reporter.record_tick_at(Instant::now()).is_none());
        assert!(reporter.histogram().summary().is_none());
    }

    #[test]
    fn jitter_is_absolute_deviation_from_target() {
        let reporter = TickTimingReporter::new(Duration::from_millis(100));
        let start = Instant::now();
        reporter.record_tick_at(start);
        let late = reporter
            .record_tick_at(start + Duration::from_millis(130))
            .unwrap();
        assert_eq!(late, Duration::from_millis(30));
        let early = reporter
            .record_tick_at(start + Duration::from_millis(210))
            .unwrap();
        assert_eq!(early, Duration::from_millis(20));

        let summary = reporter.histogram().summary().unwrap();
        assert_eq!(summary.samples, 2);
        assert!((summary.mean_ms - 25.0).abs() < 1e-6);
        assert!((summary.max_ms - 30.0).abs() < 1e-6);
        assert!((summary.min_ms - 20.0).abs() < 1e-6);
    }
}
