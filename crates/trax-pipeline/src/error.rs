use std::path::PathBuf;

use thiserror::Error;
use trax_ai::AnalysisError;
use trax_core::SplitError;
use trax_pdf::PdfError;
use trax_store::StoreError;

/// Failures that stop a whole run before or after the per-file loop.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("folder not found: {0}")]
    FolderNotFound(PathBuf),

    #[error("no PDF files in {0}")]
    NoPdfFiles(PathBuf),

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Why one document failed. Its text becomes the summary status.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("text extraction failed: {0}")]
    Extract(#[from] PdfError),

    #[error("analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("unusable analysis response: {0}")]
    Split(#[from] SplitError),

    #[error("could not save outputs: {0}")]
    Store(#[from] StoreError),
}
