//! Output folder layout for one batch run.

use std::path::{Path, PathBuf};

use tracing::debug;
use trax_core::sanitize;

use crate::error::StoreError;

pub const REPORTS_DIR: &str = "Reports";
pub const JSON_DATA_DIR: &str = "JSON_Data";
pub const DASHBOARD_DIR: &str = "Dashboard_CSVs";
pub const SUMMARY_FILE: &str = "processing_summary.csv";

/// The three output folders under a run's root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub reports: PathBuf,
    pub json_data: PathBuf,
    pub dashboard_csvs: PathBuf,
}

impl OutputLayout {
    pub fn under(root: &Path) -> Self {
        Self {
            reports: root.join(REPORTS_DIR),
            json_data: root.join(JSON_DATA_DIR),
            dashboard_csvs: root.join(DASHBOARD_DIR),
        }
    }

    /// Create all three folders. Existing folders are fine.
    pub fn create(&self) -> Result<(), StoreError> {
        for dir in [&self.reports, &self.json_data, &self.dashboard_csvs] {
            std::fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
            debug!(dir = %dir.display(), "output folder ready");
        }
        Ok(())
    }

    pub fn json_path(&self, equipment: &str) -> PathBuf {
        self.json_data.join(json_file_name(equipment))
    }

    pub fn report_path(&self, equipment: &str) -> PathBuf {
        self.reports.join(report_file_name(equipment))
    }

    pub fn raw_report_path(&self, equipment: &str, source_file: &str) -> PathBuf {
        self.reports.join(raw_report_file_name(equipment, source_file))
    }

    pub fn summary_path(&self) -> PathBuf {
        self.reports.join(SUMMARY_FILE)
    }
}

pub fn json_file_name(equipment: &str) -> String {
    format!("{equipment}_analysis.json")
}

pub fn report_file_name(equipment: &str) -> String {
    format!("{equipment}_diagnostic_report.txt")
}

/// Report file for a response that could not be split. Keyed by source file
/// as well, so it never replaces the report of a saved record.
pub fn raw_report_file_name(equipment: &str, source_file: &str) -> String {
    let stem = Path::new(source_file)
        .file_stem()
        .map(|stem| stem.to_string_lossy())
        .unwrap_or_default();
    format!("{equipment}_{}_diagnostic_report.txt", sanitize(&stem))
}
