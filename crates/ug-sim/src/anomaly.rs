//! ---
//! ug_section: "11-simulation"
//! ug_subsection: "module"
//! ug_type: "source"
//! ug_scope: "code"
//! ug_description: "Bounded per-asset anomaly log and anomaly id allocation."
//! ug_version: "v0.1.0"
//! ug_owner: "tbd"
//! ---
use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::model::Anomaly;

pub const DEFAULT_ANOMALY_RETENTION: usize = 10;

/// Most-recent-first anomaly list truncated to a fixed retention count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawAnomalyLog")]
pub struct AnomalyLog {
    retention: usize,
    entries: VecDeque<Anomaly>,
}

#[derive(Deserialize)]
struct RawAnomalyLog {
    retention: usize,
    entries: Vec<Anomaly>,
}

impl From<RawAnomalyLog> for AnomalyLog {
    fn from(raw: RawAnomalyLog) -> Self {
        AnomalyLog::with_entries(raw.retention, raw.entries)
    }
}

impl AnomalyLog {
    pub fn new(retention: usize) -> Self {
        Self {
            retention: retention.max(1),
            entries: VecDeque::new(),
        }
    }

    /// Seed a log from entries already ordered most recent first.
    pub fn with_entries(retention: usize, entries: impl IntoIterator<Item = Anomaly>) -> Self {
        let mut log = Self::new(retention);
        log.entries.extend(entries);
        log.entries.truncate(log.retention);
        log
    }

    /// Prepend each anomaly in turn, so the last one recorded ends up first,
    /// then drop whatever exceeds the retention count.
    pub fn record_all(&mut self, anomalies: impl IntoIterator<Item = Anomaly>) {
        for anomaly in anomalies {
            self.entries.push_front(anomaly);
        }
        self.entries.truncate(self.retention);
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&Anomaly> {
        self.entries.front()
    }

    /// Entries from most to least recent.
    pub fn iter(&self) -> impl Iterator<Item = &Anomaly> {
        self.entries.iter()
    }
}

/// Allocates anomaly ids that are unique across ticks of one service.
///
/// Ids embed the tick generation and a per-tick sequence number, so a seeded
/// run produces the same ids every time.
#[derive(Debug, Clone)]
pub struct AnomalyIdSource {
    generation: u64,
    next: u32,
}

impl AnomalyIdSource {
    pub fn for_generation(generation: u64) -> Self {
        Self {
            generation,
            next: 0,
        }
    }

    pub fn next_id(&mut self) -> String {
        self.next += 1;
        format!("ANOM-{:06}-{:04}", self.generation, self.next)
    }

    pub fn issued(&self) -> u32 {
        self.next
    }
}
