//! Console summaries for the `trax` commands.
//!
//! Logging goes to stderr; everything here goes to stdout.

use std::path::Path;

use trax_core::DocumentDate;
use trax_pipeline::{BatchReport, DashboardRebuild, FileOutcome};
use trax_store::{OutputLayout, json_file_name, report_file_name};

const PREVIEW_LINES: usize = 15;

// ── analyze ──

pub fn print_batch(report: &BatchReport) {
    println!("=== Batch complete ===");
    println!("  {:<18} {}", "processed", report.processed);
    println!("  {:<18} {}", "succeeded", report.succeeded);
    println!("  {:<18} {}", "failed", report.failed);
    println!("  {:<18} {}", "equipment", report.equipment);
    println!();

    let failures: Vec<_> = report.rows.iter().filter(|row| !row.is_success()).collect();
    if !failures.is_empty() {
        println!("Failures");
        for row in failures {
            println!("  {:<30} {}", row.source_file, row.status);
        }
        println!();
    }

    print_layout(&report.layout);
    println!("  {:<18} {}", "summary", report.summary_path.display());
}

fn print_layout(layout: &OutputLayout) {
    println!("Output");
    println!("  {:<18} {}", "reports", layout.reports.display());
    println!("  {:<18} {}", "json", layout.json_data.display());
    println!("  {:<18} {}", "dashboards", layout.dashboard_csvs.display());
}

// ── analyze-file ──

pub fn print_outcome(outcome: &FileOutcome, layout: &OutputLayout) {
    let summary = &outcome.summary;
    println!("=== {} ===", summary.source_file);
    println!("  {:<18} {}", "equipment", summary.equipment_name);
    if let Some(date) = outcome.document_date {
        println!("  {:<18} {}", "document date", date);
    }
    println!("  {:<18} {}", "status", summary.status);
    if summary.json_file != trax_store::NOT_AVAILABLE {
        println!("  {:<18} {}", "json", layout.json_data.join(&summary.json_file).display());
    }
    if summary.report_file != trax_store::NOT_AVAILABLE {
        println!("  {:<18} {}", "report", layout.reports.join(&summary.report_file).display());
    }
}

// ── identify ──

pub fn print_identity(pdf: &Path, text: &str, equipment: &str, date: DocumentDate) {
    println!("=== {} ===", pdf.display());
    println!();
    println!("First {PREVIEW_LINES} lines");
    for (i, line) in preview(text).enumerate() {
        println!("  {:>2}: {}", i + 1, line);
    }
    println!();
    println!("Resolved");
    println!("  {:<18} {}", "equipment", equipment);
    println!("  {:<18} {}", "document date", date);
    println!("  {:<18} {}", "json file", json_file_name(equipment));
    println!("  {:<18} {}", "report file", report_file_name(equipment));
}

fn preview(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(PREVIEW_LINES)
}

// ── dashboard ──

pub fn print_rebuild(rebuild: &DashboardRebuild) {
    println!("=== Dashboards rebuilt ===");
    println!("  {:<18} {}", "records", rebuild.records);
    println!("  {:<18} {}", "rows", rebuild.rows);
    for file in &rebuild.files {
        println!("  {}", file.display());
    }
}
