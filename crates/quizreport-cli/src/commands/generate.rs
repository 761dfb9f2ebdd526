//! The `quizreport generate` command.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use quizreport_core::engine::{EngineConfig, ProgressReporter, ReportEngine};
use quizreport_core::error::ReportError;
use quizreport_core::report::ReportData;
use quizreport_render::{layout, write_html_report, write_json_report, write_printable_html, write_svg_pages};

use super::open_backend;

const FORMATS: [&str; 4] = ["html", "svg", "view", "json"];

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_report_complete(&self, data: &ReportData) {
        eprintln!(
            "  Done: {} :: {} ({} marks, {})",
            data.attempt.id,
            data.user.display_name(),
            data.total_marks(),
            data.overall.range.label,
        );
    }

    fn on_report_error(&self, attempt_id: &str, error: &ReportError) {
        eprintln!("  ERROR: {attempt_id}: {error}");
    }

    fn on_batch_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {completed}/{total} succeeded, {failed} failed ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

/// Expand the `--format` argument into known formats.
fn parse_formats(format: &str) -> Result<Vec<&'static str>> {
    if format.trim() == "all" {
        return Ok(FORMATS.to_vec());
    }
    let mut formats = Vec::new();
    for name in format.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let known = FORMATS
            .iter()
            .copied()
            .find(|f| *f == name)
            .ok_or_else(|| {
                anyhow::anyhow!("unknown format '{name}', expected one of: {}, all", FORMATS.join(", "))
            })?;
        if !formats.contains(&known) {
            formats.push(known);
        }
    }
    anyhow::ensure!(!formats.is_empty(), "at least one output format is required");
    Ok(formats)
}

pub async fn execute(
    quiz_id: String,
    attempts: String,
    output: Option<PathBuf>,
    format: Option<String>,
    parallelism: Option<usize>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let attempt_ids: Vec<String> = attempts
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    anyhow::ensure!(!attempt_ids.is_empty(), "at least one attempt id is required");

    let (config, backend) = open_backend(config_path.as_deref())?;

    let parallelism = parallelism.unwrap_or(config.parallelism);
    anyhow::ensure!(parallelism >= 1, "parallelism must be at least 1");
    let format = format.unwrap_or_else(|| config.default_format.clone());
    let formats = parse_formats(&format)?;
    let output = output.unwrap_or_else(|| config.output_dir.clone());

    eprintln!(
        "quizreport v{}: generating {} report(s) for quiz {quiz_id}",
        env!("CARGO_PKG_VERSION"),
        attempt_ids.len()
    );
    eprintln!();

    let engine = ReportEngine::new(backend, EngineConfig { parallelism });
    let outcome = engine
        .fetch_batch(&quiz_id, &attempt_ids, &ConsoleReporter)
        .await;

    std::fs::create_dir_all(&output)
        .with_context(|| format!("failed to create {}", output.display()))?;

    // Batches are not ordered; write in request order so names are stable.
    let mut reports = outcome.reports;
    reports.sort_by_key(|r| {
        attempt_ids
            .iter()
            .position(|id| *id == r.attempt.id)
            .unwrap_or(usize::MAX)
    });

    let mut used_names = HashSet::new();
    let mut rows = Vec::with_capacity(reports.len());
    for data in &reports {
        let mut stem = data.file_name();
        if !used_names.insert(stem.clone()) {
            stem = format!("{stem}_{}", data.attempt.id);
            used_names.insert(stem.clone());
        }
        let written = write_report(data, &stem, &formats, &output)?;
        rows.push((data, written));
    }

    print_summary(&rows);

    if !outcome.failures.is_empty() {
        let failed: Vec<&str> = outcome
            .failures
            .iter()
            .map(|f| f.attempt_id.as_str())
            .collect();
        anyhow::bail!(
            "report generation failed for {} of {} attempt(s): {}",
            failed.len(),
            attempt_ids.len(),
            failed.join(", ")
        );
    }

    Ok(())
}

/// Write every requested format for one report. Returns the files written.
fn write_report(
    data: &ReportData,
    stem: &str,
    formats: &[&str],
    output: &Path,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for fmt in formats {
        match *fmt {
            "html" => {
                let mut doc = layout(data);
                doc.file_name = stem.to_string();
                let path = output.join(format!("{stem}.html"));
                write_printable_html(&doc, &path)?;
                eprintln!("Printable report: {}", path.display());
                written.push(path);
            }
            "svg" => {
                let mut doc = layout(data);
                doc.file_name = stem.to_string();
                let paths = write_svg_pages(&doc, &output.join(stem))?;
                eprintln!(
                    "SVG pages: {} ({} pages)",
                    output.join(stem).display(),
                    paths.len()
                );
                written.extend(paths);
            }
            "view" => {
                let path = output.join(format!("{stem}.view.html"));
                write_html_report(data, &path)?;
                eprintln!("On-screen view: {}", path.display());
                written.push(path);
            }
            "json" => {
                let path = output.join(format!("{stem}.json"));
                write_json_report(data, &path)?;
                eprintln!("Report data: {}", path.display());
                written.push(path);
            }
            _ => {
                eprintln!("Unknown format: {fmt}");
            }
        }
    }
    Ok(written)
}

fn print_summary(rows: &[(&ReportData, Vec<PathBuf>)]) {
    use comfy_table::{Cell, Table};

    if rows.is_empty() {
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Attempt", "User", "Total", "Level", "Packets", "Files"]);

    for (data, files) in rows {
        table.add_row(vec![
            Cell::new(&data.attempt.id),
            Cell::new(data.user.display_name()),
            Cell::new(data.total_marks()),
            Cell::new(&data.overall.range.label),
            Cell::new(data.packet_scores.len()),
            Cell::new(files.len()),
        ]);
    }

    eprintln!("\n{table}");
}
