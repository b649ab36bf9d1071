use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("text extraction failed for {path}: {message}")]
    Extract {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("metadata unreadable: {0}")]
    Metadata(#[from] lopdf::Error),
}
