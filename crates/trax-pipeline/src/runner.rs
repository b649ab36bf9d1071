//! The per-batch state machine.
//!
//! Each file goes extract → date → identity → analyze → split → persist.
//! Any per-file failure becomes a summary row; only folder and output-level
//! problems abort the run. Aggregation runs once every file has been tried.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{Instrument, debug, info, info_span, warn};
use trax_ai::ReportAnalyzer;
use trax_core::{DocumentDate, StructuredRecord, flatten, resolve_identity, sanitize, split_response};
use trax_pdf::{TextSource, resolve_date};
use trax_store::{
    OutputLayout, ReportHeader, SummaryRow, json_file_name, raw_report_file_name, report_file_name,
    write_dashboard, write_record_json, write_report, write_summary,
};

use crate::error::{FileError, PipelineError};
use crate::list_pdfs;

/// Equipment name used in the summary when a file failed before its
/// identity was resolved.
pub const UNRESOLVED_EQUIPMENT: &str = "Unknown";

/// What happened to one document.
#[derive(Debug)]
pub struct FileOutcome {
    pub summary: SummaryRow,
    /// Present only when the response split cleanly and was saved.
    pub record: Option<StructuredRecord>,
    pub document_date: Option<DocumentDate>,
    pub error: Option<FileError>,
}

/// Totals and output locations of one batch run.
#[derive(Debug)]
pub struct BatchReport {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Distinct equipment that reached the dashboards.
    pub equipment: usize,
    pub rows: Vec<SummaryRow>,
    pub layout: OutputLayout,
    pub dashboard_files: Vec<PathBuf>,
    pub summary_path: PathBuf,
}

pub struct BatchRunner<S, A> {
    source: S,
    analyzer: A,
}

impl<S: TextSource, A: ReportAnalyzer> BatchRunner<S, A> {
    pub fn new(source: S, analyzer: A) -> Self {
        Self { source, analyzer }
    }

    /// Analyze every PDF in `folder`, writing outputs under `out_root`.
    pub async fn run(&self, folder: &Path, out_root: &Path) -> Result<BatchReport, PipelineError> {
        let pdfs = list_pdfs(folder)?;
        let layout = OutputLayout::under(out_root);
        layout.create()?;
        info!(folder = %folder.display(), files = pdfs.len(), "batch started");

        let mut records: BTreeMap<String, StructuredRecord> = BTreeMap::new();
        let mut rows = Vec::with_capacity(pdfs.len());

        for (index, path) in pdfs.iter().enumerate() {
            let span = info_span!("file", n = index + 1, name = %display_name(path));
            let outcome = self.process_file(path, None, &layout).instrument(span).await;

            if let Some(record) = outcome.record {
                let equipment = outcome.summary.equipment_name.clone();
                if records.insert(equipment.clone(), record).is_some() {
                    warn!(equipment = %equipment, "equipment seen twice, keeping the later record");
                }
            }
            rows.push(outcome.summary);
        }

        let dashboard = flatten(&records);
        let dashboard_files = write_dashboard(&layout.dashboard_csvs, &dashboard)?;
        let summary_path = layout.summary_path();
        write_summary(&summary_path, &rows)?;

        let succeeded = rows.iter().filter(|row| row.is_success()).count();
        let report = BatchReport {
            processed: rows.len(),
            succeeded,
            failed: rows.len() - succeeded,
            equipment: records.len(),
            rows,
            layout,
            dashboard_files,
            summary_path,
        };
        info!(
            processed = report.processed,
            succeeded = report.succeeded,
            failed = report.failed,
            "batch finished"
        );
        Ok(report)
    }

    /// Run one document through the state machine.
    ///
    /// A supplied `equipment` name skips identity resolution but is still
    /// sanitized. Never fails: errors are folded into the outcome.
    pub async fn process_file(
        &self,
        path: &Path,
        equipment: Option<&str>,
        layout: &OutputLayout,
    ) -> FileOutcome {
        let source_file = display_name(path);
        let mut equipment = equipment.map(sanitize);
        let mut document_date = None;

        match self
            .try_process(path, &source_file, &mut equipment, &mut document_date, layout)
            .await
        {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(file = %source_file, error = %error, "document failed");
                let name = equipment.as_deref().unwrap_or(UNRESOLVED_EQUIPMENT);
                FileOutcome {
                    summary: SummaryRow::failure(name, &source_file, None, &error),
                    record: None,
                    document_date,
                    error: Some(error),
                }
            }
        }
    }

    async fn try_process(
        &self,
        path: &Path,
        source_file: &str,
        equipment: &mut Option<String>,
        document_date: &mut Option<DocumentDate>,
        layout: &OutputLayout,
    ) -> Result<FileOutcome, FileError> {
        let text = self.source.extract_text(path)?;
        debug!(chars = text.len(), "text extracted");

        let date = resolve_date(&self.source, path, &text);
        *document_date = Some(date);
        let name = equipment
            .get_or_insert_with(|| resolve_identity(&text))
            .clone();
        info!(equipment = %name, date = %date, "analyzing");

        let raw = self.analyzer.analyze(&text, date, source_file).await?;
        let split = split_response(&raw);

        let header = ReportHeader {
            equipment: &name,
            document_date: date,
            analyzed_at: Local::now().naive_local(),
            source_file,
        };
        match split.record {
            Ok(record) => {
                write_report(&layout.report_path(&name), &header, &split.narrative)?;
                let report_file = report_file_name(&name);
                if let Err(e) = write_record_json(&layout.json_path(&name), &record) {
                    warn!(equipment = %name, error = %e, "report written but JSON was not");
                    let error = FileError::from(e);
                    return Ok(FileOutcome {
                        summary: SummaryRow::failure(&name, source_file, Some(report_file), &error),
                        record: None,
                        document_date: Some(date),
                        error: Some(error),
                    });
                }
                info!(equipment = %name, "analysis saved");
                Ok(FileOutcome {
                    summary: SummaryRow::success(&name, source_file, json_file_name(&name), report_file),
                    record: Some(record),
                    document_date: Some(date),
                    error: None,
                })
            }
            Err(e) => {
                warn!(equipment = %name, error = %e, "no usable JSON, raw response kept as narrative");
                write_report(&layout.raw_report_path(&name, source_file), &header, &split.narrative)?;
                let error = FileError::from(e);
                Ok(FileOutcome {
                    summary: SummaryRow::failure(
                        &name,
                        source_file,
                        Some(raw_report_file_name(&name, source_file)),
                        &error,
                    ),
                    record: None,
                    document_date: Some(date),
                    error: Some(error),
                })
            }
        }
    }
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
