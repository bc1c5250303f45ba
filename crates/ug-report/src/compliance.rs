//! ---
//! ug_section: "08-reporting"
//! ug_subsection: "module"
//! ug_type: "source"
//! ug_scope: "code"
//! ug_description: "Compliance report formatting and export."
//! ug_version: "v0.1.0"
//! ug_owner: "tbd"
//! ---
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use ug_sim::{Asset, AssetType, City, HealthStatus};

/// Incidents listed in the recent incident log.
pub const MAX_INCIDENTS: usize = 3;

const TITLE: &str = "URBANGUARD AI - COMPLIANCE REPORT";
const FOOTER: &str = "URBANGUARD SECURE TELEMETRY - CONFIDENTIAL DOCUMENT";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportIdentification {
    pub name: String,
    pub location: String,
    pub city: City,
    pub asset_type: AssetType,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationalStatus {
    pub status: HealthStatus,
    pub health_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorAnalysis {
    pub sensor_name: String,
    pub reading: f64,
    pub unit: String,
    pub threshold_max: f64,
    pub threshold_min: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncidentLine {
    pub label: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

/// Formatted compliance document for one asset.
///
/// Built from a borrowed asset snapshot; the asset itself is never touched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceReport {
    pub report_id: String,
    pub generated_at: DateTime<Utc>,
    pub identification: ReportIdentification,
    pub status: OperationalStatus,
    pub sensor: SensorAnalysis,
    pub incidents: Vec<IncidentLine>,
}

impl ComplianceReport {
    pub fn from_asset(asset: &Asset, generated_at: DateTime<Utc>) -> Self {
        let primary = asset.primary_sensor();
        let incidents = asset
            .anomalies()
            .iter()
            .take(MAX_INCIDENTS)
            .enumerate()
            .map(|(index, anomaly)| IncidentLine {
                label: format!("INCIDENT-{:02}", index + 1),
                description: anomaly.description.clone(),
                timestamp: anomaly.timestamp,
            })
            .collect();

        Self {
            report_id: format!("{}_{}", asset.id(), generated_at.timestamp_millis()),
            generated_at,
            identification: ReportIdentification {
                name: asset.name().to_owned(),
                location: asset.identity.location.clone(),
                city: asset.city(),
                asset_type: asset.asset_type(),
                id: asset.id().to_owned(),
            },
            status: OperationalStatus {
                status: asset.status(),
                health_score: asset.health_score(),
            },
            sensor: SensorAnalysis {
                sensor_name: primary.name.clone(),
                reading: primary.current_value(),
                unit: primary.unit.clone(),
                threshold_max: primary.threshold.max(),
                threshold_min: primary.threshold.min(),
            },
            incidents,
        }
    }

    /// Export file name without extension: the asset name with each whitespace
    /// run collapsed to `_`, followed by `_Compliance_Report`.
    pub fn file_stem(&self) -> String {
        let mut stem = String::with_capacity(self.identification.name.len() + 18);
        let mut in_whitespace = false;
        for ch in self.identification.name.chars() {
            if ch.is_whitespace() {
                if !in_whitespace {
                    stem.push('_');
                }
                in_whitespace = true;
            } else {
                stem.push(ch);
                in_whitespace = false;
            }
        }
        stem.push_str("_Compliance_Report");
        stem
    }

    pub fn render_text(&self) -> String {
        self.to_string()
    }
}

fn timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl fmt::Display for ComplianceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = &self.identification;
        writeln!(f, "{TITLE}")?;
        writeln!(f, "REPORT_ID: {}", self.report_id)?;
        writeln!(f)?;

        writeln!(f, "ASSET IDENTIFICATION")?;
        writeln!(f, "  Asset Name:  {}", id.name)?;
        writeln!(f, "  Location:    {}, {}", id.location, id.city)?;
        writeln!(f, "  Asset Type:  {}", id.asset_type)?;
        writeln!(f, "  Internal ID: {}", id.id)?;
        writeln!(f)?;

        writeln!(f, "OPERATIONAL STATUS")?;
        writeln!(
            f,
            "  CURRENT STATUS: {}",
            self.status.status.to_string().to_uppercase()
        )?;
        writeln!(f, "  Overall Health Score: {:.2}%", self.status.health_score)?;
        writeln!(f)?;

        let sensor = &self.sensor;
        writeln!(f, "SENSOR ANALYSIS")?;
        writeln!(f, "  Primary Sensor: {}", sensor.sensor_name)?;
        writeln!(f, "  Live Reading: {:.2} {}", sensor.reading, sensor.unit)?;
        writeln!(f, "  Threshold Limit: {} {}", sensor.threshold_max, sensor.unit)?;
        writeln!(f, "  Threshold Floor: {} {}", sensor.threshold_min, sensor.unit)?;

        if !self.incidents.is_empty() {
            writeln!(f)?;
            writeln!(f, "RECENT INCIDENT LOG")?;
            for incident in &self.incidents {
                writeln!(f, "  [{}] {}", incident.label, incident.description)?;
                writeln!(f, "      {}", timestamp(&incident.timestamp))?;
            }
        }

        writeln!(f)?;
        writeln!(f, "{FOOTER}")?;
        writeln!(f, "System Generated on {}", timestamp(&self.generated_at))
    }
}
