//! Per-equipment diagnostic report text files.

use std::path::Path;

use chrono::NaiveDateTime;
use trax_core::DocumentDate;

use crate::error::StoreError;

const TITLE: &str = "TRANSFORMER DIAGNOSTIC REPORT";
const RULE_WIDTH: usize = 60;

/// The fixed block written above every narrative.
#[derive(Debug, Clone)]
pub struct ReportHeader<'a> {
    pub equipment: &'a str,
    pub document_date: DocumentDate,
    pub analyzed_at: NaiveDateTime,
    pub source_file: &'a str,
}

impl ReportHeader<'_> {
    pub fn render(&self, narrative: &str) -> String {
        format!(
            "{TITLE}\nEquipment: {}\nDocument Date: {}\nAnalysis Date: {}\nSource File: {}\n{}\n\n{narrative}",
            self.equipment,
            self.document_date,
            self.analyzed_at.format("%Y-%m-%d %H:%M:%S"),
            self.source_file,
            "=".repeat(RULE_WIDTH),
        )
    }
}

pub fn write_report(path: &Path, header: &ReportHeader<'_>, narrative: &str) -> Result<(), StoreError> {
    std::fs::write(path, header.render(narrative)).map_err(|e| StoreError::io(path, e))
}
