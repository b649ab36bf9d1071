//! Everything a batch run leaves on disk: per-equipment JSON and report
//! files, the five dashboard CSVs, and the processing summary.

mod error;
mod layout;
mod records;
mod report;
mod tables;

pub use error::StoreError;
pub use layout::{
    DASHBOARD_DIR, JSON_DATA_DIR, OutputLayout, REPORTS_DIR, SUMMARY_FILE, json_file_name,
    raw_report_file_name, report_file_name,
};
pub use records::{load_records, write_record_json};
pub use report::{ReportHeader, write_report};
pub use tables::{NOT_AVAILABLE, SUCCESS, SummaryRow, write_dashboard, write_summary};
