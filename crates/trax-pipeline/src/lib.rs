//! Batch orchestration: runs every report in a folder through extraction,
//! analysis, and persistence, then aggregates the dashboards.

mod error;
mod runner;

pub use error::{FileError, PipelineError};
pub use runner::{BatchReport, BatchRunner, FileOutcome, UNRESOLVED_EQUIPMENT};

use std::path::{Path, PathBuf};

use tracing::info;
use trax_core::flatten;
use trax_store::{load_records, write_dashboard};

/// PDF files directly inside `folder`, ordered by file name.
///
/// The extension match is case-insensitive.
pub fn list_pdfs(folder: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    if !folder.is_dir() {
        return Err(PipelineError::FolderNotFound(folder.to_path_buf()));
    }
    let entries = std::fs::read_dir(folder).map_err(|source| PipelineError::Io {
        path: folder.to_path_buf(),
        source,
    })?;

    let mut pdfs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_pdf(path))
        .collect();
    pdfs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    if pdfs.is_empty() {
        return Err(PipelineError::NoPdfFiles(folder.to_path_buf()));
    }
    Ok(pdfs)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Outcome of rebuilding dashboards from saved JSON records.
#[derive(Debug)]
pub struct DashboardRebuild {
    pub records: usize,
    pub rows: usize,
    pub files: Vec<PathBuf>,
}

/// Regenerate the five dashboard CSVs in `out_dir` from the
/// `*_analysis.json` files in `json_dir`, without calling the analyzer.
pub fn rebuild_dashboard(json_dir: &Path, out_dir: &Path) -> Result<DashboardRebuild, PipelineError> {
    if !json_dir.is_dir() {
        return Err(PipelineError::FolderNotFound(json_dir.to_path_buf()));
    }
    let records = load_records(json_dir)?;
    std::fs::create_dir_all(out_dir).map_err(|source| PipelineError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let dashboard = flatten(&records);
    let files = write_dashboard(out_dir, &dashboard)?;
    info!(records = records.len(), rows = dashboard.total_rows(), "dashboards rebuilt");
    Ok(DashboardRebuild {
        records: records.len(),
        rows: dashboard.total_rows(),
        files,
    })
}
