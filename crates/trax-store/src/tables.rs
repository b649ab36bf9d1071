//! Dashboard and processing-summary CSV files.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;
use trax_core::{BushingRow, Dashboard, HealthRow, TanDeltaRow, TurnsRatioRow, WindingRow};

use crate::error::StoreError;

pub const WINDING_CSV: &str = "winding_resistance_dashboard.csv";
pub const TAN_DELTA_CSV: &str = "tan_delta_dashboard.csv";
pub const BUSHING_CSV: &str = "bushing_pf_dashboard.csv";
pub const TURNS_RATIO_CSV: &str = "turns_ratio_dashboard.csv";
pub const HEALTH_CSV: &str = "health_assessment_dashboard.csv";

/// Placeholder for output files a failed document never produced.
pub const NOT_AVAILABLE: &str = "N/A";
pub const SUCCESS: &str = "Success";

/// One line of `processing_summary.csv`, one per input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub equipment_name: String,
    pub source_file: String,
    pub json_file: String,
    pub report_file: String,
    pub status: String,
}

impl SummaryRow {
    pub const COLUMNS: &'static [&'static str] = &[
        "equipment_name",
        "source_file",
        "json_file",
        "report_file",
        "status",
    ];

    pub fn success(equipment: &str, source_file: &str, json_file: String, report_file: String) -> Self {
        Self {
            equipment_name: equipment.to_string(),
            source_file: source_file.to_string(),
            json_file,
            report_file,
            status: SUCCESS.to_string(),
        }
    }

    /// A failed file. `report_file` is set when the raw analysis was still
    /// saved.
    pub fn failure(
        equipment: &str,
        source_file: &str,
        report_file: Option<String>,
        reason: impl std::fmt::Display,
    ) -> Self {
        Self {
            equipment_name: equipment.to_string(),
            source_file: source_file.to_string(),
            json_file: NOT_AVAILABLE.to_string(),
            report_file: report_file.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            status: format!("Error: {reason}"),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == SUCCESS
    }
}

/// Write the five dashboard tables into `dir`, returning the file paths.
///
/// Every table gets a header row, even when it has no data.
pub fn write_dashboard(dir: &Path, dashboard: &Dashboard) -> Result<Vec<PathBuf>, StoreError> {
    let paths = vec![
        write_table(&dir.join(WINDING_CSV), WindingRow::COLUMNS, &dashboard.winding)?,
        write_table(&dir.join(TAN_DELTA_CSV), TanDeltaRow::COLUMNS, &dashboard.tan_delta)?,
        write_table(&dir.join(BUSHING_CSV), BushingRow::COLUMNS, &dashboard.bushing)?,
        write_table(
            &dir.join(TURNS_RATIO_CSV),
            TurnsRatioRow::COLUMNS,
            &dashboard.turns_ratio,
        )?,
        write_table(&dir.join(HEALTH_CSV), HealthRow::COLUMNS, &dashboard.health)?,
    ];
    info!(
        dir = %dir.display(),
        rows = dashboard.total_rows(),
        "dashboard tables written"
    );
    Ok(paths)
}

pub fn write_summary(path: &Path, rows: &[SummaryRow]) -> Result<(), StoreError> {
    write_table(path, SummaryRow::COLUMNS, rows)?;
    info!(path = %path.display(), rows = rows.len(), "processing summary written");
    Ok(())
}

/// Header first, then one serialized record per row. serde's automatic
/// header is off because it is only emitted for non-empty tables.
fn write_table<T: Serialize>(path: &Path, columns: &[&str], rows: &[T]) -> Result<PathBuf, StoreError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| StoreError::csv(path, e))?;
    writer
        .write_record(columns)
        .map_err(|e| StoreError::csv(path, e))?;
    for row in rows {
        writer.serialize(row).map_err(|e| StoreError::csv(path, e))?;
    }
    writer.flush().map_err(|e| StoreError::io(path, e))?;
    Ok(path.to_path_buf())
}
