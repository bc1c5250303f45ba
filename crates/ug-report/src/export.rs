//! ---
//! ug_section: "08-reporting"
//! ug_subsection: "module"
//! ug_type: "source"
//! ug_scope: "code"
//! ug_description: "Compliance report formatting and export."
//! ug_version: "v0.1.0"
//! ug_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::compliance::ComplianceReport;
use crate::errors::Result;

/// Paths written by [`ReportExporter::export`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedReport {
    pub report_id: String,
    pub text_path: PathBuf,
    pub json_path: PathBuf,
}

/// Writes compliance reports as plain text and JSON into one directory.
#[derive(Debug, Clone)]
pub struct ReportExporter {
    directory: PathBuf,
}

impl ReportExporter {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn export(&self, report: &ComplianceReport) -> Result<ExportedReport> {
        if !self.directory.exists() {
            fs::create_dir_all(&self.directory)?;
        }

        let stem = report.file_stem();
        let text_path = self.directory.join(format!("{stem}.txt"));
        let json_path = self.directory.join(format!("{stem}.json"));

        fs::write(&text_path, report.render_text())?;
        write_json(&json_path, report)?;

        info!(
            report_id = %report.report_id,
            asset_id = %report.identification.id,
            path = %text_path.display(),
            "compliance report exported"
        );
        Ok(ExportedReport {
            report_id: report.report_id.clone(),
            text_path,
            json_path,
        })
    }
}

fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let serialized = serde_json::to_string_pretty(value)?;
    fs::write(path, serialized)?;
    Ok(())
}
