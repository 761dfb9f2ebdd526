//! JSON export of assembled report data.

use anyhow::{Context, Result};
use std::path::Path;

use quizreport_core::report::ReportData;

/// Pretty-printed JSON of one report.
pub fn generate_json(data: &ReportData) -> Result<String> {
    serde_json::to_string_pretty(data).context("failed to serialize report")
}

/// Write the JSON report to a file.
pub fn write_json_report(data: &ReportData, path: &Path) -> Result<()> {
    let json = generate_json(data)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)?;
    Ok(())
}
